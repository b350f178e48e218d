use crate::errors::ConfigError;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SUPPORTED_SETTINGS_VERSION: u32 = 1;

/// The pull window is evaluated against a fixed Asia/Seoul calendar.
pub const SEOUL_UTC_OFFSET_HOURS: i32 = 9;

pub fn seoul_offset() -> FixedOffset {
    FixedOffset::east_opt(SEOUL_UTC_OFFSET_HOURS * 3600).expect("static offset is in range")
}

fn default_parallel() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

/// Process-level settings loaded by the CLI. Everything run-scoped (date
/// filter, variant, stage) travels as call parameters instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub version: u32,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Bounded fan-out per stage; keeps the inference backend sane.
    #[serde(default = "default_parallel")]
    pub parallel: usize,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub inference: InferenceSettings,
    #[serde(default)]
    pub source: SourceSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SUPPORTED_SETTINGS_VERSION,
            data_dir: default_data_dir(),
            parallel: default_parallel(),
            request_timeout_secs: default_timeout_secs(),
            inference: InferenceSettings::default(),
            source: SourceSettings::default(),
        }
    }
}

/// Inference backend selection. `provider` is "openai-compat" or "fake";
/// each model family maps to its own deployed model name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceSettings {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Environment variable holding the API key; never the key itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    #[serde(default = "default_qwen_model")]
    pub qwen_model: String,
    #[serde(default = "default_smol_model")]
    pub smol_model: String,
}

fn default_provider() -> String {
    "fake".to_string()
}

fn default_qwen_model() -> String {
    "qwen2.5-vl-7b-instruct".to_string()
}

fn default_smol_model() -> String {
    "smolvlm2-2.2b-instruct".to_string()
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: None,
            api_key_env: None,
            qwen_model: default_qwen_model(),
            smol_model: default_smol_model(),
        }
    }
}

/// Raw video source selection. `provider` is "http" or "fake".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSettings {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: None,
        }
    }
}

pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read settings {}: {}", path.display(), e)))?;
    let settings: Settings = serde_yaml::from_str(&raw)
        .map_err(|e| ConfigError(format!("failed to parse YAML: {}", e)))?;
    if settings.version != SUPPORTED_SETTINGS_VERSION {
        return Err(ConfigError(format!(
            "unsupported settings version {} (supported: {})",
            settings.version, SUPPORTED_SETTINGS_VERSION
        )));
    }
    if settings.parallel == 0 {
        return Err(ConfigError("parallel must be at least 1".into()));
    }
    Ok(settings)
}
