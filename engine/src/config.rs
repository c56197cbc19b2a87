//! TOML configuration: tool sections, run settings, and skip rules.
//!
//! Every field is defaulted so an absent or empty file yields a working
//! configuration. Discovery order: an explicit path, then `./.bosun.toml`
//! in the working directory, then `~/.bosun/config.toml`.

use bosun_plugins::{ShellcheckConfig, ShellcheckPlugin, ShfmtConfig, ShfmtPlugin, ToolPlugin};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Project-local configuration file name.
pub const PROJECT_CONFIG: &str = ".bosun.toml";

/// Glob patterns ignored by default: editor artifacts and VCS internals.
pub const DEFAULT_SKIP: &[&str] = &["**/.git/**", "*.swp", "*.swo", "*~", "*.tmp", "*.bak"];

// Default value functions for serde (bool::default() is false, so only
// true needs a fn).
const fn default_true() -> bool {
    true
}

fn default_shfmt_path() -> String {
    "shfmt".to_string()
}

fn default_shellcheck_path() -> String {
    "shellcheck".to_string()
}

const fn default_debounce_ms() -> u64 {
    300
}

const fn default_timeout_ms() -> u64 {
    30_000
}

fn default_skip() -> Vec<String> {
    DEFAULT_SKIP.iter().map(ToString::to_string).collect()
}

#[derive(Debug, Default, Deserialize)]
pub struct BosunConfig {
    #[serde(default)]
    pub shfmt: ShfmtSection,
    #[serde(default)]
    pub shellcheck: ShellcheckSection,
    #[serde(default)]
    pub diagnostics: DiagnosticsSection,
    #[serde(default)]
    pub files: FilesSection,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

/// The `[shfmt]` table: the formatting backend.
#[derive(Debug, Deserialize)]
pub struct ShfmtSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Executable to invoke; a bare name resolves through PATH.
    #[serde(default = "default_shfmt_path")]
    pub path: String,
    /// Spaces per indent level. Omit to keep tabs.
    pub indent: Option<u8>,
    #[serde(default)]
    pub binary_next_line: bool,
    #[serde(default)]
    pub case_indent: bool,
    #[serde(default)]
    pub space_redirects: bool,
    #[serde(default)]
    pub simplify: bool,
}

impl Default for ShfmtSection {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_shfmt_path(),
            indent: None,
            binary_next_line: false,
            case_indent: false,
            space_redirects: false,
            simplify: false,
        }
    }
}

impl ShfmtSection {
    fn plugin_config(&self) -> ShfmtConfig {
        ShfmtConfig {
            path: self.path.clone(),
            indent: self.indent,
            binary_next_line: self.binary_next_line,
            case_indent: self.case_indent,
            space_redirects: self.space_redirects,
            simplify: self.simplify,
        }
    }
}

/// The `[shellcheck]` table: the linting backend.
#[derive(Debug, Deserialize)]
pub struct ShellcheckSection {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_shellcheck_path")]
    pub path: String,
}

impl Default for ShellcheckSection {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_shellcheck_path(),
        }
    }
}

impl ShellcheckSection {
    fn plugin_config(&self) -> ShellcheckConfig {
        ShellcheckConfig {
            path: self.path.clone(),
        }
    }
}

/// The `[diagnostics]` table: run timing.
#[derive(Debug, Deserialize)]
pub struct DiagnosticsSection {
    /// Quiet period after an edit before re-diagnosing, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Per-subprocess execution timeout, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for DiagnosticsSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// The `[files]` table: document filtering.
#[derive(Debug, Deserialize)]
pub struct FilesSection {
    /// Glob patterns for documents diagnosis ignores entirely.
    #[serde(default = "default_skip")]
    pub skip: Vec<String>,
}

impl Default for FilesSection {
    fn default() -> Self {
        Self {
            skip: default_skip(),
        }
    }
}

impl BosunConfig {
    /// Load configuration from the first location that exists.
    ///
    /// An explicit path must exist and parse. Discovered files that fail
    /// to read or parse also surface as errors rather than silently
    /// falling back to defaults. No file at all yields the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        for path in Self::search_paths() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }
        Ok(Self::default())
    }

    /// `./.bosun.toml`, then `~/.bosun/config.toml`.
    #[must_use]
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(PROJECT_CONFIG)];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".bosun").join("config.toml"));
        }
        paths
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| {
            tracing::warn!("Failed to read config at {:?}: {}", path, source);
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;
        toml::from_str(&content).map_err(|source| {
            tracing::warn!("Failed to parse config at {:?}: {}", path, source);
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Names of the backends this configuration enables.
    #[must_use]
    pub fn enabled_plugins(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.shfmt.enabled {
            names.push(ShfmtPlugin::NAME);
        }
        if self.shellcheck.enabled {
            names.push(ShellcheckPlugin::NAME);
        }
        names
    }

    /// Build every known backend with its configured settings.
    ///
    /// Disabled backends are still built and registered so they show up
    /// in status output; only activation is gated on `enabled`.
    #[must_use]
    pub fn build_plugins(&self) -> Vec<Box<dyn ToolPlugin>> {
        vec![
            Box::new(ShfmtPlugin::new(self.shfmt.plugin_config())),
            Box::new(ShellcheckPlugin::new(self.shellcheck.plugin_config())),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(text: &str) -> BosunConfig {
        toml::from_str(text).unwrap()
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse("");
        assert!(config.shfmt.enabled);
        assert_eq!(config.shfmt.path, "shfmt");
        assert_eq!(config.shfmt.indent, None);
        assert!(config.shellcheck.enabled);
        assert_eq!(config.shellcheck.path, "shellcheck");
        assert_eq!(config.diagnostics.debounce_ms, 300);
        assert_eq!(config.diagnostics.timeout_ms, 30_000);
        assert_eq!(config.files.skip, default_skip());
    }

    #[test]
    fn test_partial_section_keeps_remaining_defaults() {
        let config = parse("[shfmt]\nindent = 4\n");
        assert!(config.shfmt.enabled);
        assert_eq!(config.shfmt.indent, Some(4));
        assert_eq!(config.shfmt.path, "shfmt");
        assert!(!config.shfmt.simplify);
    }

    #[test]
    fn test_full_config_parses() {
        let config = parse(
            r#"
[shfmt]
enabled = true
path = "/opt/bin/shfmt"
indent = 2
binary_next_line = true
case_indent = true
space_redirects = true
simplify = true

[shellcheck]
enabled = false
path = "/opt/bin/shellcheck"

[diagnostics]
debounce_ms = 150
timeout_ms = 5000

[files]
skip = ["vendor/**"]
"#,
        );
        assert_eq!(config.shfmt.path, "/opt/bin/shfmt");
        assert_eq!(config.shfmt.indent, Some(2));
        assert!(config.shfmt.binary_next_line);
        assert!(config.shfmt.case_indent);
        assert!(config.shfmt.space_redirects);
        assert!(config.shfmt.simplify);
        assert!(!config.shellcheck.enabled);
        assert_eq!(config.diagnostics.debounce_ms, 150);
        assert_eq!(config.diagnostics.timeout_ms, 5000);
        assert_eq!(config.files.skip, vec!["vendor/**"]);
    }

    #[test]
    fn test_enabled_plugins_follows_section_flags() {
        let config = parse("");
        assert_eq!(config.enabled_plugins(), vec!["shfmt", "shellcheck"]);

        let config = parse("[shellcheck]\nenabled = false\n");
        assert_eq!(config.enabled_plugins(), vec!["shfmt"]);

        let config = parse("[shfmt]\nenabled = false\n[shellcheck]\nenabled = false\n");
        assert!(config.enabled_plugins().is_empty());
    }

    #[test]
    fn test_build_plugins_includes_disabled_backends() {
        let config = parse("[shellcheck]\nenabled = false\n");
        let plugins = config.build_plugins();
        let names: Vec<_> = plugins.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["shfmt", "shellcheck"]);
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bosun.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[diagnostics]\ndebounce_ms = 10").unwrap();

        let config = BosunConfig::load(Some(&path)).unwrap();
        assert_eq!(config.diagnostics.debounce_ms, 10);
    }

    #[test]
    fn test_load_explicit_missing_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");

        let error = BosunConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(error, ConfigError::Read { .. }));
        assert_eq!(error.path(), path);
    }

    #[test]
    fn test_load_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[shfmt\nindent = ]").unwrap();

        let error = BosunConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(error, ConfigError::Parse { .. }));
        assert_eq!(error.path(), path);
    }

    #[test]
    fn test_search_paths_start_with_project_file() {
        let paths = BosunConfig::search_paths();
        assert_eq!(paths[0], PathBuf::from(PROJECT_CONFIG));
    }
}
