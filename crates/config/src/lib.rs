//! Configuration loading, validation, and management for Sightline.
//!
//! Loads configuration from `~/.sightline/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.sightline/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Generation backend: strategy, provider and models
    #[serde(default)]
    pub backend: BackendConfig,

    /// Per-request narration defaults
    #[serde(default)]
    pub narration: NarrationConfig,

    /// Narration memory behaviour
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Where the CLI loads annotations from
    #[serde(default)]
    pub annotations: AnnotationsConfig,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("backend", &self.backend)
            .field("narration", &self.narration)
            .field("memory", &self.memory)
            .field("annotations", &self.annotations)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Which generation strategy drives the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// One call carrying every image and the full prompt
    #[default]
    SinglePhase,
    /// One describe call per image, then one synthesize call
    TwoPhase,
}

impl std::str::FromStr for StrategyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "single_phase" | "single" => Ok(StrategyKind::SinglePhase),
            "two_phase" | "2step" | "two_step" => Ok(StrategyKind::TwoPhase),
            other => Err(ConfigError::ValidationError(format!(
                "unknown generation strategy '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyKind::SinglePhase => f.write_str("single_phase"),
            StrategyKind::TwoPhase => f.write_str("two_phase"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub strategy: StrategyKind,

    /// Provider name: "openai", "ollama", "dummy", or a key of `[providers]`
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Vision model: answers single-phase calls and describes images
    #[serde(default = "default_vision_model")]
    pub vision_model: String,

    /// Language model used for the two-phase synthesize call
    #[serde(default = "default_language_model")]
    pub language_model: String,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Timeout for every single backend call
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// How many describe calls may be in flight at once
    #[serde(default = "default_describe_concurrency")]
    pub describe_concurrency: usize,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_vision_model() -> String {
    "gpt-4o".into()
}
fn default_language_model() -> String {
    "gpt-4o-mini".into()
}
fn default_max_tokens() -> u32 {
    3000
}
fn default_call_timeout_secs() -> u64 {
    60
}
fn default_describe_concurrency() -> usize {
    4
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            provider: default_provider(),
            vision_model: default_vision_model(),
            language_model: default_language_model(),
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            call_timeout_secs: default_call_timeout_secs(),
            describe_concurrency: default_describe_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrationConfig {
    /// Translation target when a request does not name one
    #[serde(default = "default_language")]
    pub default_language: String,

    /// Annotation search radius and narration-memory radius, meters
    #[serde(default = "default_max_distance")]
    pub max_distance: f64,

    /// Maximum annotations requested from the store
    #[serde(default = "default_max_count")]
    pub max_count: usize,

    /// Deadline for the whole generation of one request
    #[serde(default = "default_request_deadline_secs")]
    pub request_deadline_secs: u64,

    /// System instructions sent with every backend call
    #[serde(default = "default_system_preamble")]
    pub system_preamble: String,

    /// Verbosity level (0..=2) when a request does not name one
    #[serde(default)]
    pub verbosity_level: u8,

    /// Remaining travel distance assumed when a request does not name one
    #[serde(default = "default_distance_to_travel")]
    pub distance_to_travel: f64,

    /// Archive each request (params, prompt, locations, response, front image)
    /// under this directory; unset disables archiving
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,
}

fn default_language() -> String {
    "ja".into()
}
fn default_max_distance() -> f64 {
    15.0
}
fn default_max_count() -> usize {
    10
}
fn default_request_deadline_secs() -> u64 {
    120
}
fn default_distance_to_travel() -> f64 {
    100.0
}
fn default_system_preamble() -> String {
    "You are a narration assistant helping blind and low-vision pedestrians understand \
     their surroundings while they are guided by a robot."
        .into()
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            default_language: default_language(),
            max_distance: default_max_distance(),
            max_count: default_max_count(),
            request_deadline_secs: default_request_deadline_secs(),
            system_preamble: default_system_preamble(),
            verbosity_level: 0,
            distance_to_travel: default_distance_to_travel(),
            log_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Add recently delivered narrations to the prompt so they are not repeated
    #[serde(default = "default_true")]
    pub use_past_explanations: bool,
}

fn default_true() -> bool {
    true
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            use_past_explanations: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotationsConfig {
    /// JSON file holding an array of annotation records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl AppConfig {
    /// Load configuration from the default path (~/.sightline/config.toml).
    ///
    /// Also checks environment variables:
    /// - `SIGHTLINE_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `SIGHTLINE_PROVIDER`, `SIGHTLINE_STRATEGY`
    /// - `SIGHTLINE_VISION_MODEL`, `SIGHTLINE_LANGUAGE_MODEL`
    /// - `SIGHTLINE_USE_PAST_EXPLANATIONS`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup` (injectable for tests).
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if self.api_key.is_none() {
            self.api_key = lookup("SIGHTLINE_API_KEY").or_else(|| lookup("OPENAI_API_KEY"));
        }
        if let Some(provider) = lookup("SIGHTLINE_PROVIDER") {
            self.backend.provider = provider;
        }
        if let Some(strategy) = lookup("SIGHTLINE_STRATEGY") {
            self.backend.strategy = strategy.parse()?;
        }
        if let Some(model) = lookup("SIGHTLINE_VISION_MODEL") {
            self.backend.vision_model = model;
        }
        if let Some(model) = lookup("SIGHTLINE_LANGUAGE_MODEL") {
            self.backend.language_model = model;
        }
        if let Some(flag) = lookup("SIGHTLINE_USE_PAST_EXPLANATIONS") {
            self.memory.use_past_explanations =
                matches!(flag.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes");
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".sightline")
    }

    /// Annotation file used when `annotations.path` is unset.
    pub fn annotations_path(&self) -> PathBuf {
        self.annotations
            .path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| Self::config_dir().join("annotations.json"))
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let backend = &self.backend;
        if !(0.0..=2.0).contains(&backend.temperature) {
            return Err(ConfigError::ValidationError(
                "backend.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if backend.describe_concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "backend.describe_concurrency must be at least 1".into(),
            ));
        }
        if backend.call_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "backend.call_timeout_secs must be at least 1".into(),
            ));
        }
        if backend.vision_model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "backend.vision_model must be set".into(),
            ));
        }
        if backend.strategy == StrategyKind::TwoPhase && backend.language_model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "backend.language_model must be set for the two_phase strategy".into(),
            ));
        }

        let narration = &self.narration;
        if !narration.max_distance.is_finite() || narration.max_distance <= 0.0 {
            return Err(ConfigError::ValidationError(
                "narration.max_distance must be a positive number of meters".into(),
            ));
        }
        if narration.verbosity_level > 2 {
            return Err(ConfigError::ValidationError(
                "narration.verbosity_level must be 0, 1 or 2".into(),
            ));
        }
        if narration.request_deadline_secs == 0 {
            return Err(ConfigError::ValidationError(
                "narration.request_deadline_secs must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Resolve the API key for a provider: per-provider key first, then the
    /// global one.
    pub fn provider_api_key(&self, provider: &str) -> Option<String> {
        self.providers
            .get(provider)
            .and_then(|p| p.api_key.clone())
            .or_else(|| self.api_key.clone())
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            backend: BackendConfig::default(),
            narration: NarrationConfig::default(),
            memory: MemoryConfig::default(),
            annotations: AnnotationsConfig::default(),
            providers: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.backend.strategy, StrategyKind::SinglePhase);
        assert_eq!(config.backend.provider, "openai");
        assert_eq!(config.narration.max_distance, 15.0);
        assert_eq!(config.narration.max_count, 10);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.backend.provider, config.backend.provider);
        assert_eq!(parsed.narration.default_language, config.narration.default_language);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.backend.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_concurrency_rejected() {
        let mut config = AppConfig::default();
        config.backend.describe_concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn two_phase_requires_language_model() {
        let mut config = AppConfig::default();
        config.backend.strategy = StrategyKind::TwoPhase;
        config.backend.language_model = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn non_positive_max_distance_rejected() {
        let mut config = AppConfig::default();
        config.narration.max_distance = 0.0;
        assert!(config.validate().is_err());
        config.narration.max_distance = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn verbosity_level_above_two_rejected() {
        let mut config = AppConfig::default();
        config.narration.verbosity_level = 3;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().backend.provider, "openai");
    }

    #[test]
    fn load_from_file_with_partial_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[backend]
strategy = "two_phase"
provider = "ollama"
vision_model = "llama3.2-vision"
language_model = "llama3.1"
describe_concurrency = 2

[narration]
default_language = "en"
log_dir = "/var/log/sightline"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.narration.log_dir.as_deref(), Some("/var/log/sightline"));
        assert_eq!(config.backend.strategy, StrategyKind::TwoPhase);
        assert_eq!(config.backend.provider, "ollama");
        assert_eq!(config.backend.describe_concurrency, 2);
        assert_eq!(config.backend.call_timeout_secs, 60);
        assert_eq!(config.narration.default_language, "en");
        assert_eq!(config.narration.max_count, 10);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[backend\nstrategy = ").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config
            .apply_env(env_from(&[
                ("OPENAI_API_KEY", "sk-test"),
                ("SIGHTLINE_STRATEGY", "two-phase"),
                ("SIGHTLINE_VISION_MODEL", "llava"),
                ("SIGHTLINE_USE_PAST_EXPLANATIONS", "false"),
            ]))
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.backend.strategy, StrategyKind::TwoPhase);
        assert_eq!(config.backend.vision_model, "llava");
        assert!(!config.memory.use_past_explanations);
    }

    #[test]
    fn sightline_key_beats_openai_key() {
        let mut config = AppConfig::default();
        config
            .apply_env(env_from(&[
                ("SIGHTLINE_API_KEY", "primary"),
                ("OPENAI_API_KEY", "secondary"),
            ]))
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn unknown_strategy_in_env_is_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_env(env_from(&[("SIGHTLINE_STRATEGY", "three_phase")]));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn provider_key_overrides_global_key() {
        let mut config = AppConfig {
            api_key: Some("global".into()),
            ..AppConfig::default()
        };
        config.providers.insert(
            "ollama".into(),
            ProviderConfig {
                api_key: Some("local".into()),
                api_url: None,
            },
        );
        assert_eq!(config.provider_api_key("ollama").as_deref(), Some("local"));
        assert_eq!(config.provider_api_key("openai").as_deref(), Some("global"));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("single_phase"));
        assert!(toml_str.contains("gpt-4o"));
    }
}
