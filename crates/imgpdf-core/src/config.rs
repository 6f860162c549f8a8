use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::layout::SheetFormat;

/// Default name offered for the generated document
pub const DEFAULT_OUTPUT_FILENAME: &str = "images.pdf";

fn default_output_filename() -> String {
    DEFAULT_OUTPUT_FILENAME.to_string()
}

const fn default_session_ttl_secs() -> u64 {
    3600
}

const fn default_max_upload_mb() -> usize {
    200
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Physical sheet format for every page
    #[serde(default)]
    pub sheet: SheetFormat,

    /// File name offered for the generated PDF
    #[serde(default = "default_output_filename")]
    pub output_filename: String,

    /// Title stored in the PDF metadata
    #[serde(default)]
    pub title: Option<String>,

    /// Web sessions older than this are dropped (seconds)
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,

    /// Maximum request body size for web uploads (megabytes)
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sheet: SheetFormat::default(),
            output_filename: default_output_filename(),
            title: None,
            session_ttl_secs: default_session_ttl_secs(),
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::ConfigLoad(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, Error> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::ConfigLoad(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<(), Error> {
        let name = self.output_filename.trim();
        if name.is_empty() {
            return Err(Error::ConfigInvalid {
                field: "output_filename".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if name.contains(['/', '\\', '"']) {
            return Err(Error::ConfigInvalid {
                field: "output_filename".to_string(),
                reason: "must be a bare file name".to_string(),
            });
        }
        if self.max_upload_mb == 0 {
            return Err(Error::ConfigInvalid {
                field: "max_upload_mb".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Load from default locations (~/.config/imgpdf/config.toml, ./config.toml)
    pub fn load() -> Self {
        // Try user config
        if let Some(config_dir) = crate::util::config_dir() {
            let user_config = config_dir.join("imgpdf").join("config.toml");
            if user_config.exists() {
                match Self::from_file(&user_config) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {}", user_config.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // Try local config
        let local_config = std::path::PathBuf::from("config.toml");
        if local_config.exists() {
            match Self::from_file(&local_config) {
                Ok(config) => {
                    tracing::debug!("Loaded config from ./config.toml");
                    return config;
                }
                Err(e) => {
                    tracing::warn!("Failed to load ./config.toml: {}", e);
                }
            }
        }

        // Return defaults
        tracing::debug!("No config file found, using defaults");
        Self::default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.sheet, SheetFormat::A4);
        assert_eq!(config.output_filename, "images.pdf");
        assert!(config.title.is_none());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.sheet, SheetFormat::A4);
        assert_eq!(config.session_ttl_secs, 3600);
    }

    #[test]
    fn test_parse_sheet_and_title() {
        let config = AppConfig::from_toml(
            r#"
            sheet = "letter"
            title = "Scans"
            output_filename = "scans.pdf"
            "#,
        )
        .unwrap();
        assert_eq!(config.sheet, SheetFormat::Letter);
        assert_eq!(config.title.as_deref(), Some("Scans"));
        assert_eq!(config.output_filename, "scans.pdf");
    }

    #[test]
    fn test_unknown_sheet_is_rejected() {
        let err = AppConfig::from_toml(r#"sheet = "b5""#).unwrap_err();
        assert!(matches!(err, Error::ConfigLoad(_)));
    }

    #[test]
    fn test_output_filename_must_be_bare() {
        let err = AppConfig::from_toml(r#"output_filename = "../x.pdf""#).unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid { .. }));
    }
}
