use crate::ftms::detect::DEFAULT_LONG_FORM_MIN_WORDS;
use crate::ftms::extract::DEFAULT_MAX_SCAN_BYTES;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Config {
    #[serde(default)]
    pub ftms: FtmsConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Response post-processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FtmsConfig {
    /// Never fall back to heuristic detection when no hidden marker is present
    #[serde(default)]
    pub skip_heuristics: bool,

    /// Responses larger than this many bytes are passed through unscanned (0 = unlimited)
    #[serde(default = "default_max_scan_bytes")]
    pub max_scan_bytes: usize,

    /// Minimum word count for a "long"/"largo" request to become a file
    #[serde(default = "default_long_form_min_words")]
    pub long_form_min_words: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StorageConfig {
    /// Root directory for saved documents and the document index; `~` is expanded
    #[serde(default = "default_workspace_dir")]
    pub workspace_dir: String,
}

/// Shared state for the vendor API tool wrappers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ToolsConfig {
    /// How long a refreshed access token is reused, in seconds
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,

    /// Tool calls allowed per key inside one window
    #[serde(default = "default_call_limit")]
    pub call_limit: u32,

    /// Seconds after the first call in a window before the count resets
    #[serde(default = "default_call_window_secs")]
    pub call_window_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LoggingConfig {
    /// Default tracing filter when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_max_scan_bytes() -> usize {
    DEFAULT_MAX_SCAN_BYTES
}
fn default_long_form_min_words() -> usize {
    DEFAULT_LONG_FORM_MIN_WORDS
}
fn default_workspace_dir() -> String {
    "~/.cleo/workspace".to_string()
}
fn default_token_ttl_secs() -> u64 {
    3300
}
fn default_call_limit() -> u32 {
    10
}
fn default_call_window_secs() -> u64 {
    15
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for FtmsConfig {
    fn default() -> Self {
        Self {
            skip_heuristics: false,
            max_scan_bytes: default_max_scan_bytes(),
            long_form_min_words: default_long_form_min_words(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            workspace_dir: default_workspace_dir(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            token_ttl_secs: default_token_ttl_secs(),
            call_limit: default_call_limit(),
            call_window_secs: default_call_window_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
