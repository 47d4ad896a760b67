//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--config`, `--bind`, `--server`, etc.)
//! 2. `$LFV_CONFIG` environment variable (path to config file)
//! 3. Project-local `.lfv.toml` in the current working directory
//! 4. Global `~/.config/lfv/config.toml`
//! 5. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::fs::listing::{EntryFilter, StatFailurePolicy};

// ── Section configs ──────────────────────────────────────────────────────────

/// Directory server settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind: Option<String>,
    /// Default directory served when no `path` is given.
    pub root: Option<String>,
    /// Only list files with these extensions (directories always listed).
    pub extensions: Option<Vec<String>>,
    /// List dot-files.
    pub show_hidden: Option<bool>,
    /// Refuse to read files larger than this many bytes.
    pub max_read_bytes: Option<u64>,
    /// What to do with entries that cannot be stat'd: "skip" or "fail".
    pub on_stat_error: Option<String>,
}

/// Follower (view/tail) settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the directory server.
    pub server_url: Option<String>,
    /// Poll interval in milliseconds.
    pub poll_interval_ms: Option<u64>,
    /// Start with auto-follow enabled.
    pub auto_follow: Option<bool>,
    /// Directory to browse first (server default when unset).
    pub start_path: Option<String>,
}

/// Content panel settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PreviewConfig {
    /// Syntax highlighting theme (syntect theme name).
    pub syntax_theme: Option<String>,
    /// Show a line-number gutter.
    pub line_numbers: Option<bool>,
}

/// Color settings for a single theme palette.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeColorsConfig {
    pub list_selected_bg: Option<String>,
    pub list_selected_fg: Option<String>,
    pub list_dir_fg: Option<String>,
    pub list_file_fg: Option<String>,
    pub badge_fg: Option<String>,
    pub status_bg: Option<String>,
    pub status_fg: Option<String>,
    pub border_fg: Option<String>,
}

/// Theme configuration section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    /// Color scheme: "dark", "light", "custom".
    pub scheme: Option<String>,
    /// Custom color overrides.
    pub custom: Option<ThemeColorsConfig>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub client: ClientConfig,
    pub preview: PreviewConfig,
    pub theme: ThemeConfig,
}

// ── Default constants ────────────────────────────────────────────────────────

/// Default listen address.
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
/// Default server URL for followers.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";
/// Default poll interval in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
/// Shortest accepted poll interval.
pub const MIN_POLL_INTERVAL_MS: u64 = 100;

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
///
/// Does NOT include the CLI `--config` path; that is handled separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("LFV_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".lfv.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("lfv").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed (with a warning logged).
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse config file");
            None
        }
    }
}

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self`; `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            server: ServerConfig {
                bind: other.server.bind.clone().or(self.server.bind),
                root: other.server.root.clone().or(self.server.root),
                extensions: other.server.extensions.clone().or(self.server.extensions),
                show_hidden: other.server.show_hidden.or(self.server.show_hidden),
                max_read_bytes: other.server.max_read_bytes.or(self.server.max_read_bytes),
                on_stat_error: other
                    .server
                    .on_stat_error
                    .clone()
                    .or(self.server.on_stat_error),
            },
            client: ClientConfig {
                server_url: other.client.server_url.clone().or(self.client.server_url),
                poll_interval_ms: other
                    .client
                    .poll_interval_ms
                    .or(self.client.poll_interval_ms),
                auto_follow: other.client.auto_follow.or(self.client.auto_follow),
                start_path: other.client.start_path.clone().or(self.client.start_path),
            },
            preview: PreviewConfig {
                syntax_theme: other
                    .preview
                    .syntax_theme
                    .clone()
                    .or(self.preview.syntax_theme),
                line_numbers: other.preview.line_numbers.or(self.preview.line_numbers),
            },
            theme: ThemeConfig {
                scheme: other.theme.scheme.clone().or(self.theme.scheme),
                custom: match (&self.theme.custom, &other.theme.custom) {
                    (_, Some(o)) => Some(o.clone()),
                    (Some(s), None) => Some(s.clone()),
                    (None, None) => None,
                },
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> AppConfig {
        let mut config = AppConfig::default();

        // Walk in reverse so that the highest-priority candidate overwrites lower ones.
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(cli_path) = cli_config_path {
            if let Some(file_cfg) = load_file(cli_path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    pub fn bind(&self) -> &str {
        self.server.bind.as_deref().unwrap_or(DEFAULT_BIND)
    }

    /// Served root directory; the working directory when unset.
    pub fn root(&self) -> PathBuf {
        self.server
            .root
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn entry_filter(&self) -> EntryFilter {
        EntryFilter::new(
            self.server.extensions.as_deref().unwrap_or(&[]),
            self.server.show_hidden.unwrap_or(true),
        )
    }

    /// Read size limit; `None` means unlimited.
    pub fn max_read_bytes(&self) -> Option<u64> {
        self.server.max_read_bytes
    }

    /// Stat failure policy; unknown values are reported and fall back to skip.
    pub fn stat_policy(&self) -> StatFailurePolicy {
        let Some(raw) = self.server.on_stat_error.as_deref() else {
            return StatFailurePolicy::default();
        };
        raw.parse().unwrap_or_else(|e| {
            warn!(error = %e, "using default stat error policy");
            StatFailurePolicy::default()
        })
    }

    pub fn server_url(&self) -> &str {
        self.client
            .server_url
            .as_deref()
            .unwrap_or(DEFAULT_SERVER_URL)
    }

    /// Poll interval, never shorter than `MIN_POLL_INTERVAL_MS`.
    pub fn poll_interval(&self) -> Duration {
        let ms = self
            .client
            .poll_interval_ms
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS)
            .max(MIN_POLL_INTERVAL_MS);
        Duration::from_millis(ms)
    }

    pub fn auto_follow(&self) -> bool {
        self.client.auto_follow.unwrap_or(true)
    }

    pub fn start_path(&self) -> Option<PathBuf> {
        self.client.start_path.as_deref().map(PathBuf::from)
    }

    /// Syntax highlighting theme name.
    pub fn syntax_theme_name(&self) -> &str {
        self.preview
            .syntax_theme
            .as_deref()
            .unwrap_or("base16-ocean.dark")
    }

    pub fn line_numbers(&self) -> bool {
        self.preview.line_numbers.unwrap_or(true)
    }

    /// Theme scheme: "dark", "light", or "custom".
    pub fn theme_scheme(&self) -> &str {
        self.theme.scheme.as_deref().unwrap_or("dark")
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
