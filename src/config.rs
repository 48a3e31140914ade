use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Executable looked up on `PATH` when `executablePath` is not set.
pub const DEFAULT_EXECUTABLE: &str = "shellcheck";

/// Debounce applied to keystroke-triggered runs.
pub const ON_TYPE_DELAY: Duration = Duration::from_millis(250);

const WORKSPACE_PLACEHOLDERS: &[&str] = &["${workspaceFolder}", "${workspaceRoot}"];

/// When ShellCheck runs for an open document.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum RunTrigger {
    /// Lint when the document is saved
    OnSave,
    /// Lint while typing, debounced
    #[default]
    OnType,
    /// Lint only through the `shellcheck.runLint` command
    Manual,
}

impl RunTrigger {
    /// Delay between a trigger and the start of the run it schedules.
    pub fn debounce(self) -> Duration {
        match self {
            RunTrigger::OnType => ON_TYPE_DELAY,
            RunTrigger::OnSave | RunTrigger::Manual => Duration::ZERO,
        }
    }
}

/// Matching options for a single ignore pattern.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct PatternOptions {
    pub enabled: bool,
    pub case_sensitive: bool,
    /// Match against the path relative to the workspace root instead of the
    /// absolute path
    pub relative: bool,
}

impl Default for PatternOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            case_sensitive: true,
            relative: true,
        }
    }
}

/// Value side of the `ignorePatterns` table.
///
/// Accepts the short form `"**/*.zsh": true` as well as an options table.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum IgnorePattern {
    Enabled(bool),
    Options(PatternOptions),
}

impl IgnorePattern {
    /// Effective options, or `None` when the pattern is switched off.
    pub fn options(&self) -> Option<PatternOptions> {
        match self {
            IgnorePattern::Enabled(true) => Some(PatternOptions::default()),
            IgnorePattern::Enabled(false) => None,
            IgnorePattern::Options(opts) if opts.enabled => Some(*opts),
            IgnorePattern::Options(_) => None,
        }
    }
}

/// Immutable snapshot of the user's configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub enable: bool,
    pub run: RunTrigger,
    pub executable_path: String,
    /// Rule codes passed to `-e`, with or without the `SC` prefix
    pub exclude: Vec<String>,
    pub custom_args: Vec<String>,
    pub ignore_patterns: BTreeMap<String, IgnorePattern>,
    pub ignore_file_schemes: Vec<String>,
    pub use_workspace_root_as_cwd: bool,
    #[serde(rename = "useWSL")]
    pub use_wsl: bool,
    pub disable_version_check: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let ignore_patterns = [
            "**/*.xonshrc",
            "**/*.xsh",
            "**/*.zsh",
            "**/*.zshrc",
            "**/zshrc",
            "**/*.zprofile",
            "**/zprofile",
            "**/*.zlogin",
            "**/zlogin",
            "**/*.zlogout",
            "**/zlogout",
            "**/*.zshenv",
            "**/zshenv",
            "**/*.zsh-theme",
        ]
        .into_iter()
        .map(|p| (p.to_string(), IgnorePattern::Enabled(true)))
        .collect();

        Self {
            enable: true,
            run: RunTrigger::default(),
            executable_path: DEFAULT_EXECUTABLE.to_string(),
            exclude: Vec::new(),
            custom_args: Vec::new(),
            ignore_patterns,
            ignore_file_schemes: vec!["git".to_string(), "gitfs".to_string(), "output".to_string()],
            use_workspace_root_as_cwd: false,
            use_wsl: false,
            disable_version_check: false,
        }
    }
}

impl Settings {
    /// Build settings from an LSP settings payload.
    ///
    /// Clients send either the bare settings object or one nested under a
    /// `shellcheck` key; `null` yields the defaults.
    pub fn from_json(value: serde_json::Value) -> serde_json::Result<Self> {
        let value = match value {
            serde_json::Value::Null => return Ok(Self::default()),
            serde_json::Value::Object(mut map) => match map.remove("shellcheck") {
                Some(nested) => nested,
                None => serde_json::Value::Object(map),
            },
            other => other,
        };
        serde_json::from_value(value)
    }

    /// Executable with workspace placeholders substituted.
    pub fn executable(&self, workspace_root: Option<&Path>) -> String {
        let trimmed = self.executable_path.trim();
        if trimmed.is_empty() {
            return DEFAULT_EXECUTABLE.to_string();
        }

        let mut executable = trimmed.to_string();
        if let Some(root) = workspace_root {
            let root = root.to_string_lossy();
            for placeholder in WORKSPACE_PLACEHOLDERS {
                executable = executable.replace(placeholder, &root);
            }
        }
        executable
    }

    /// Rule codes normalized to the bare form `-e` expects.
    pub fn excluded_codes(&self) -> Vec<String> {
        self.exclude
            .iter()
            .map(|code| code.trim())
            .filter(|code| !code.is_empty())
            .map(|code| {
                code.strip_prefix("SC")
                    .or_else(|| code.strip_prefix("sc"))
                    .unwrap_or(code)
                    .to_string()
            })
            .collect()
    }
}

const CANDIDATE_NAMES: &[&str] = &[".shellcheck-lsp.toml", "shellcheck-lsp.toml"];

fn parse_config_str(s: &str, path: &Path) -> io::Result<Settings> {
    toml::from_str::<Settings>(s).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("invalid config {}: {e}", path.display()),
        )
    })
}

fn read_config(path: &Path) -> io::Result<Settings> {
    log::debug!("Reading config from: {}", path.display());
    let s = fs::read_to_string(path)?;
    let settings = parse_config_str(&s, path)?;
    log::info!("Loaded config from: {}", path.display());
    Ok(settings)
}

fn find_in_tree(start_dir: &Path) -> Option<PathBuf> {
    for dir in start_dir.ancestors() {
        for name in CANDIDATE_NAMES {
            let p = dir.join(name);
            if p.is_file() {
                return Some(p);
            }
        }
    }
    None
}

fn user_config_path() -> Option<PathBuf> {
    let p = dirs::config_dir()?.join("shellcheck-lsp").join("config.toml");
    p.is_file().then_some(p)
}

/// Load configuration with precedence:
/// 1) explicit path (error if unreadable/invalid)
/// 2) walk up from start_dir: .shellcheck-lsp.toml, shellcheck-lsp.toml
/// 3) user config dir: shellcheck-lsp/config.toml
/// 4) default settings
pub fn load(explicit: Option<&Path>, start_dir: &Path) -> io::Result<(Settings, Option<PathBuf>)> {
    if let Some(path) = explicit {
        let settings = read_config(path)?;
        return Ok((settings, Some(path.to_path_buf())));
    }

    if let Some(p) = find_in_tree(start_dir)
        && let Ok(settings) = read_config(&p)
    {
        return Ok((settings, Some(p)));
    }

    if let Some(p) = user_config_path()
        && let Ok(settings) = read_config(&p)
    {
        return Ok((settings, Some(p)));
    }

    log::debug!("No config file found, using defaults");
    Ok((Settings::default(), None))
}

/// State that outlives a session, such as the dismissed version advisory.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct PersistedState {
    pub disable_version_check: bool,
}

/// Default location of the persisted state file.
pub fn state_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("shellcheck-lsp").join("state.toml"))
}

/// Read persisted state. A missing or unreadable file yields the defaults.
pub fn load_state(path: &Path) -> PersistedState {
    match fs::read_to_string(path) {
        Ok(s) => toml::from_str(&s).unwrap_or_else(|e| {
            log::warn!("Ignoring invalid state file {}: {e}", path.display());
            PersistedState::default()
        }),
        Err(_) => PersistedState::default(),
    }
}

pub fn save_state(path: &Path, state: &PersistedState) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let s = toml::to_string(state).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(path, s)?;
    log::debug!("Saved state to: {}", path.display());
    Ok(())
}
