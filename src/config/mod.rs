mod schema;

pub use schema::*;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that points at an explicit config file.
pub const CONFIG_ENV: &str = "CLEO_FILES_CONFIG";

impl Config {
    /// Load from `path`, else `$CLEO_FILES_CONFIG`, else the platform config dir.
    /// A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("Failed to parse config TOML")
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml()?)
            .with_context(|| format!("Failed to write config {}", path.display()))
    }

    pub fn config_path() -> Result<PathBuf> {
        if let Ok(explicit) = std::env::var(CONFIG_ENV) {
            if !explicit.trim().is_empty() {
                return Ok(PathBuf::from(shellexpand::tilde(&explicit).to_string()));
            }
        }
        let dirs = ProjectDirs::from("ai", "cleo", "cleo-files")
            .context("Could not determine a home directory for the config file")?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Workspace directory with `~` expanded.
    pub fn workspace_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.storage.workspace_dir).to_string())
    }

    /// JSON Schema of the config file, pretty-printed.
    pub fn json_schema() -> Result<String> {
        let schema = schemars::schema_for!(Config);
        serde_json::to_string_pretty(&schema).context("Failed to render config schema")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.tools.call_window_secs, 15);
        assert_eq!(config.ftms.long_form_min_words, 1000);
        assert!(!config.ftms.skip_heuristics);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::from_toml(
            r#"
[ftms]
skip_heuristics = true

[tools]
call_limit = 3
"#,
        )
        .unwrap();
        assert!(config.ftms.skip_heuristics);
        assert_eq!(config.ftms.max_scan_bytes, 1_048_576);
        assert_eq!(config.tools.call_limit, 3);
        assert_eq!(config.tools.token_ttl_secs, 3300);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(Config::from_toml("[ftms]\nmax_scan_bytes = \"lots\"").is_err());
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.storage.workspace_dir = "/tmp/cleo".into();
        config.ftms.long_form_min_words = 42;
        config.save(&path).unwrap();

        let loaded = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.workspace_path(), PathBuf::from("/tmp/cleo"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let loaded = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn schema_lists_sections() {
        let schema = Config::json_schema().unwrap();
        assert!(schema.contains("skip_heuristics"));
        assert!(schema.contains("call_window_secs"));
    }
}
