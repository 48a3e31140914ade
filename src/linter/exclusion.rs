//! Glob-based file exclusion.

use std::collections::BTreeMap;
use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::config::IgnorePattern;

/// Decides whether a file is skipped entirely, based on `ignorePatterns`.
///
/// Rebuilt from scratch whenever settings change; matching itself is pure.
#[derive(Debug, Clone)]
pub struct FileMatcher {
    relative: GlobSet,
    absolute: GlobSet,
}

impl Default for FileMatcher {
    fn default() -> Self {
        Self {
            relative: GlobSet::empty(),
            absolute: GlobSet::empty(),
        }
    }
}

impl FileMatcher {
    /// Compile the enabled patterns. Invalid globs are logged and skipped.
    pub fn new(patterns: &BTreeMap<String, IgnorePattern>) -> Self {
        let mut relative = GlobSetBuilder::new();
        let mut absolute = GlobSetBuilder::new();

        for (pattern, value) in patterns {
            let Some(options) = value.options() else {
                continue;
            };

            let glob = match GlobBuilder::new(pattern)
                .case_insensitive(!options.case_sensitive)
                .literal_separator(true)
                .build()
            {
                Ok(glob) => glob,
                Err(e) => {
                    log::warn!("Skipping invalid ignore pattern '{}': {}", pattern, e);
                    continue;
                }
            };

            if options.relative {
                relative.add(glob);
            } else {
                absolute.add(glob);
            }
        }

        Self {
            relative: build_set(relative),
            absolute: build_set(absolute),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.relative.is_empty() && self.absolute.is_empty()
    }

    /// Whether `file_path` matches any configured pattern.
    ///
    /// Root-relative patterns see the path relative to `workspace_root` when
    /// the file lives inside it, and the full path otherwise.
    pub fn excludes(&self, file_path: &Path, workspace_root: Option<&Path>) -> bool {
        if self.absolute.is_match(file_path) {
            return true;
        }

        let relative = workspace_root
            .and_then(|root| file_path.strip_prefix(root).ok())
            .unwrap_or(file_path);
        self.relative.is_match(relative)
    }
}

fn build_set(builder: GlobSetBuilder) -> GlobSet {
    builder.build().unwrap_or_else(|e| {
        log::warn!("Failed to compile ignore patterns: {}", e);
        GlobSet::empty()
    })
}
