//! Startup check that nudges users of old ShellCheck releases to upgrade.

use std::cmp::Ordering;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use super::invocation::Invocation;
use crate::config::Settings;
use crate::host::Host;

/// Oldest release whose JSON output and rule set we rely on.
pub const RECOMMENDED_VERSION: ToolVersion = ToolVersion::const_new([0, 7, 0]);

pub const INSTALL_URL: &str = "https://github.com/koalaman/shellcheck#installing";

pub const DONT_SHOW_AGAIN: &str = "Don't show again";
pub const INSTALL_ACTION: &str = "Install ShellCheck";

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"version: (\d+\.\d+(?:\.\d+)*)").unwrap());

/// Dotted numeric version. Missing trailing components compare as zero,
/// so `0.7` equals `0.7.0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolVersion {
    parts: [u64; 4],
    len: usize,
}

impl ToolVersion {
    const fn const_new(parts: [u64; 3]) -> Self {
        Self {
            parts: [parts[0], parts[1], parts[2], 0],
            len: 3,
        }
    }

    /// Parse `X.Y[.Z...]`. Components past the fourth are ignored.
    pub fn parse(s: &str) -> Option<Self> {
        let mut version = Self::default();
        for part in s.split('.') {
            let value = part.parse().ok()?;
            if version.len < version.parts.len() {
                version.parts[version.len] = value;
                version.len += 1;
            }
        }
        (version.len >= 2).then_some(version)
    }
}

impl PartialEq for ToolVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ToolVersion {}

impl PartialOrd for ToolVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ToolVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        // Unused slots are zero, so comparing the whole array pads for free
        self.parts.cmp(&other.parts)
    }
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.parts[..self.len].iter().map(u64::to_string).collect();
        f.write_str(&parts.join("."))
    }
}

/// Extract the version from `shellcheck -V` output.
pub fn parse_version(output: &str) -> Option<ToolVersion> {
    let captures = VERSION_PATTERN.captures(output)?;
    ToolVersion::parse(captures.get(1)?.as_str())
}

/// Ask the tool for its version. Any failure yields `None`.
pub async fn probe_version(invocation: &Invocation, timeout: Duration) -> Option<ToolVersion> {
    let output = match tokio::time::timeout(timeout, invocation.output("")).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            log::debug!("Version probe failed: {}", e);
            return None;
        }
        Err(_) => {
            log::debug!("Version probe timed out: {}", invocation.command_line());
            return None;
        }
    };

    let version = parse_version(&output);
    if version.is_none() {
        log::debug!("No version found in output: {}", output.trim());
    }
    version
}

/// Suggest an upgrade when the installed ShellCheck is older than
/// [`RECOMMENDED_VERSION`]. Never reports an error of its own.
pub async fn check_tool_version<H: Host>(
    host: &H,
    settings: &Settings,
    workspace_root: Option<&Path>,
) {
    if settings.disable_version_check {
        return;
    }

    let invocation = Invocation::version_query(settings, workspace_root);
    let Some(found) = probe_version(&invocation, PROBE_TIMEOUT).await else {
        return;
    };

    log::info!("Found ShellCheck {}", found);
    if found >= RECOMMENDED_VERSION {
        return;
    }

    let message = format!(
        "ShellCheck {found} is installed, but version {RECOMMENDED_VERSION} or newer is recommended."
    );
    match host
        .show_suggestion(&message, &[DONT_SHOW_AGAIN, INSTALL_ACTION])
        .await
        .as_deref()
    {
        Some(DONT_SHOW_AGAIN) => host.disable_version_check().await,
        Some(INSTALL_ACTION) => host.open_external(INSTALL_URL).await,
        _ => {}
    }
}
