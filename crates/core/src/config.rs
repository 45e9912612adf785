use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const API_KEY_ENV_FALLBACK: &str = "API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("No inference API key configured (set GEMINI_API_KEY or [inference].api_key)")]
    MissingApiKey,
    #[error("Invalid setting '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub inference: InferenceSettings,
    pub ocr: OcrSettings,
    pub enhance: EnhanceSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta/models".into(),
            timeout_secs: 90,
        }
    }
}

impl InferenceSettings {
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    /// Tesseract language list; receipts mix English and Hindi.
    pub languages: String,
    /// Directory holding `*.traineddata`; `None` uses the system default.
    pub data_path: Option<PathBuf>,
    pub char_whitelist: String,
    /// Tesseract page segmentation mode. 11 = sparse text.
    pub page_seg_mode: u32,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            languages: "eng+hin".into(),
            data_path: None,
            char_whitelist:
                "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789.,-/:()₹%@#&*_ "
                    .into(),
            page_seg_mode: 11,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceSettings {
    pub jpeg_quality: u8,
}

impl Default for EnhanceSettings {
    fn default() -> Self {
        Self { jpeg_quality: 95 }
    }
}

impl Settings {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Environment overrides: the API key is taken from `GEMINI_API_KEY`,
    /// falling back to `API_KEY`.
    pub fn apply_env(mut self) -> Self {
        let key = std::env::var(API_KEY_ENV)
            .or_else(|_| std::env::var(API_KEY_ENV_FALLBACK))
            .ok()
            .filter(|k| !k.trim().is_empty());
        if let Some(key) = key {
            self.inference.api_key = Some(key);
        }
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.enhance.jpeg_quality) {
            return Err(ConfigError::Invalid {
                field: "enhance.jpeg_quality",
                reason: format!("{} is outside 1..=100", self.enhance.jpeg_quality),
            });
        }
        if self.ocr.languages.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "ocr.languages",
                reason: "must name at least one language".into(),
            });
        }
        if self.inference.model.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "inference.model",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}
