// Configuration module

mod models;

pub use models::*;

use crate::error::{ConvertError, Result};
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};

/// Conventional environment variable holding the Google AI Studio key.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest; `CONVERTIFIER_SECTION__KEY`)
    /// 2. `./convertifier.toml`
    /// 3. `~/.convertifier/config.toml`
    /// 4. Defaults (lowest)
    ///
    /// `GOOGLE_API_KEY` is consulted last when no key was configured.
    pub fn load() -> Result<Self> {
        Self::load_from(&[Self::default_config_path(), PathBuf::from("convertifier.toml")])
    }

    /// Load configuration from the given optional files, then the environment.
    pub fn load_from(files: &[PathBuf]) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        for file in files {
            builder = builder.add_source(File::from(file.as_path()).required(false));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("CONVERTIFIER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| ConvertError::Config(e.to_string()))?;

        let mut app: AppConfig = config
            .try_deserialize()
            .map_err(|e| ConvertError::Config(e.to_string()))?;

        if !app.gemini.has_api_key() {
            app.gemini.api_key = std::env::var(API_KEY_ENV)
                .ok()
                .filter(|k| !k.trim().is_empty());
        }

        Ok(app)
    }

    /// Load a single explicit config file (must exist).
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConvertError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        Self::load_from(&[path.to_path_buf()])
    }

    /// Copy of the configuration that is safe to print.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.gemini.has_api_key() {
            copy.gemini.api_key = Some("[REDACTED]".to_string());
        }
        copy
    }

    /// Render the effective configuration as TOML, with secrets redacted.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(&self.redacted())
            .map_err(|e| ConvertError::Internal(format!("Failed to render config: {}", e)))
    }

    fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".convertifier")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8501);
        assert_eq!(config.gemini.model, "gemini-1.5-flash");
        assert_eq!(config.cache.max_entries, 128);
        assert!(!config.gemini.has_api_key());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nport = 9000\n\n[gemini]\nmodel = \"gemini-2.0-flash\"\napi_key = \"AIzaTestKey\"\n"
        )
        .unwrap();

        let config = AppConfig::load_file(file.path()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.gemini.model, "gemini-2.0-flash");
        assert_eq!(config.gemini.api_key.as_deref(), Some("AIzaTestKey"));
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = AppConfig::load_file(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConvertError::Config(_))));
    }

    #[test]
    fn test_toml_output_redacts_key() {
        let mut config = AppConfig::default();
        config.gemini.api_key = Some("AIzaSecret".to_string());
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("AIzaSecret"));
    }

    #[test]
    fn test_blank_key_is_not_configured() {
        let mut config = GeminiConfig::default();
        config.api_key = Some("   ".to_string());
        assert!(!config.has_api_key());
    }
}
