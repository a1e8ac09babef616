//! Configuration management for taskroute
//!
//! Parses TOML configuration files and provides typed access to settings.

use crate::classifier::TaskCategory;
use crate::error::{AppError, AppResult};
use crate::models::{Catalog, ModelCandidate, Priority};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

/// Upper bound for every outbound HTTP timeout, in seconds
const MAX_TIMEOUT_SECONDS: u64 = 300;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Per-category candidate lists. When absent the built-in table is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    catalog: Option<BTreeMap<String, Vec<ModelCandidate>>>,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Connection settings for one hosted backend
///
/// Fields are private; the struct is only built through deserialization or
/// [`ProviderEndpoint::new`] and checked by [`Config::validate`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderEndpoint {
    base_url: String,
    /// Name of the environment variable holding the API key
    api_key_env: String,
    #[serde(default = "default_provider_timeout")]
    timeout_seconds: u64,
}

impl ProviderEndpoint {
    pub fn new(
        base_url: impl Into<String>,
        api_key_env: impl Into<String>,
        timeout_seconds: u64,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key_env: api_key_env.into(),
            timeout_seconds,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key_env(&self) -> &str {
        &self.api_key_env
    }

    /// Per-call HTTP timeout. Bounds the transport, not the latency budget.
    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    /// Read the API key from the configured environment variable
    ///
    /// Returns `None` when the variable is unset or empty.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    fn validate(&self, section: &str) -> AppResult<()> {
        validate_base_url(section, &self.base_url)?;
        if self.api_key_env.trim().is_empty() {
            return Err(AppError::Config(format!(
                "{}.api_key_env cannot be empty",
                section
            )));
        }
        validate_timeout(section, self.timeout_seconds)
    }
}

fn default_provider_timeout() -> u64 {
    60
}

fn default_openai_endpoint() -> ProviderEndpoint {
    ProviderEndpoint::new(
        "https://api.openai.com/v1",
        "OPENAI_API_KEY",
        default_provider_timeout(),
    )
}

fn default_google_endpoint() -> ProviderEndpoint {
    ProviderEndpoint::new(
        "https://generativelanguage.googleapis.com/v1beta",
        "GOOGLE_GEMINI_API_KEY",
        default_provider_timeout(),
    )
}

/// Backend connection settings, one section per provider
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_openai_endpoint")]
    pub openai: ProviderEndpoint,
    #[serde(default = "default_google_endpoint")]
    pub google: ProviderEndpoint,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai: default_openai_endpoint(),
            google: default_google_endpoint(),
        }
    }
}

/// How prompts are mapped to task categories
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierStrategy {
    /// Ask a hosted LLM through an OpenAI-compatible endpoint
    #[default]
    Llm,
    /// Local keyword heuristics, no network
    Keyword,
}

/// Classifier configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub strategy: ClassifierStrategy,
    pub model: String,
    pub base_url: String,
    pub api_key_env: String,
    pub timeout_seconds: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            strategy: ClassifierStrategy::Llm,
            model: "mistralai/mistral-7b-instruct:free".to_string(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl ClassifierConfig {
    /// Connection settings for the classifier backend
    pub fn endpoint(&self) -> ProviderEndpoint {
        ProviderEndpoint::new(&self.base_url, &self.api_key_env, self.timeout_seconds)
    }
}

/// Routing defaults applied when a request omits them
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub default_priority: Priority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_latency_budget_ms: Option<u64>,
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn validate_base_url(section: &str, base_url: &str) -> AppResult<()> {
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(AppError::Config(format!(
            "{}.base_url '{}' must start with 'http://' or 'https://'",
            section, base_url
        )));
    }
    Ok(())
}

fn validate_timeout(section: &str, timeout_seconds: u64) -> AppResult<()> {
    if timeout_seconds == 0 {
        return Err(AppError::Config(format!(
            "{}.timeout_seconds must be greater than 0",
            section
        )));
    }
    if timeout_seconds > MAX_TIMEOUT_SECONDS {
        return Err(AppError::Config(format!(
            "{}.timeout_seconds cannot exceed {} seconds, got {}",
            section, MAX_TIMEOUT_SECONDS, timeout_seconds
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        // Phase 1: read
        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        // Phase 2: parse
        let config: Self =
            toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            })?;

        // Phase 3: validate
        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Build the candidate catalog from the `[catalog]` section
    ///
    /// Falls back to [`Catalog::builtin`] when no section is configured.
    /// Category keys must be one of the task category labels exactly.
    pub fn catalog(&self) -> AppResult<Catalog> {
        let Some(sections) = &self.catalog else {
            return Catalog::builtin();
        };

        let mut entries = Vec::with_capacity(sections.len());
        for (label, candidates) in sections {
            let category = TaskCategory::from_str(label).map_err(|_| {
                AppError::Config(format!(
                    "catalog section '{}' is not a task category; expected one of: {}",
                    label,
                    TaskCategory::ALL
                        .iter()
                        .map(TaskCategory::label)
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })?;
            entries.push((category, candidates.clone()));
        }
        Catalog::new(entries)
    }

    /// Whether the catalog comes from the config file rather than the built-in table
    pub fn has_custom_catalog(&self) -> bool {
        self.catalog.is_some()
    }

    /// Validate configuration after parsing
    ///
    /// Called by `from_file()` and `from_str()`. Catalog invariants are checked
    /// by building the catalog once.
    pub fn validate(&self) -> AppResult<()> {
        if self.server.host.trim().is_empty() {
            return Err(AppError::Config("server.host cannot be empty".to_string()));
        }

        self.providers.openai.validate("providers.openai")?;
        self.providers.google.validate("providers.google")?;

        if self.classifier.strategy == ClassifierStrategy::Llm {
            if self.classifier.model.trim().is_empty() {
                return Err(AppError::Config(
                    "classifier.model cannot be empty when strategy = \"llm\"".to_string(),
                ));
            }
            self.classifier.endpoint().validate("classifier")?;
        }

        if self.routing.default_latency_budget_ms == Some(0) {
            return Err(AppError::Config(
                "routing.default_latency_budget_ms must be greater than 0 when set".to_string(),
            ));
        }

        self.catalog()?;
        Ok(())
    }
}

impl FromStr for Config {
    type Err = AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config =
            toml::from_str(toml_str).map_err(|source| AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderKind;

    const MINIMAL_CONFIG: &str = r#"
[server]
host = "127.0.0.1"
port = 3000
"#;

    const FULL_CONFIG: &str = r#"
[server]
host = "0.0.0.0"
port = 8080

[providers.openai]
base_url = "http://localhost:9001/v1"
api_key_env = "TEST_OPENAI_KEY"
timeout_seconds = 20

[providers.google]
base_url = "http://localhost:9002/v1beta"
api_key_env = "TEST_GEMINI_KEY"

[classifier]
strategy = "keyword"

[routing]
default_priority = "cost"
default_latency_budget_ms = 800

[[catalog."Code Generation"]]
name = "gpt-5"
provider = "openai"
est_quality = 9
est_cost_per_1k_tokens = 0.015
est_latency_ms = 1200
fallback = "gpt-5-mini"

[[catalog."Code Generation"]]
name = "gemini-2.5-pro"
provider = "google"
est_quality = 10
est_cost_per_1k_tokens = 0.03
est_latency_ms = 1400
fallback = { name = "gpt-5", provider = "openai" }

[[catalog.Other]]
name = "gpt-5-nano"
provider = "openai"
est_quality = 6
est_cost_per_1k_tokens = 0.001
est_latency_ms = 300

[observability]
log_level = "debug"
"#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_str(MINIMAL_CONFIG).expect("should parse config");
        assert_eq!(config.server.port, 3000);
        assert_eq!(
            config.providers.openai.base_url(),
            "https://api.openai.com/v1"
        );
        assert_eq!(config.providers.openai.api_key_env(), "OPENAI_API_KEY");
        assert_eq!(config.providers.openai.timeout_seconds(), 60);
        assert_eq!(
            config.providers.google.base_url(),
            "https://generativelanguage.googleapis.com/v1beta"
        );
        assert_eq!(config.providers.google.api_key_env(), "GOOGLE_GEMINI_API_KEY");
        assert_eq!(config.classifier.strategy, ClassifierStrategy::Llm);
        assert_eq!(config.classifier.model, "mistralai/mistral-7b-instruct:free");
        assert_eq!(config.classifier.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.routing.default_priority, Priority::Quality);
        assert_eq!(config.routing.default_latency_budget_ms, None);
        assert_eq!(config.observability.log_level, "info");
        assert!(!config.has_custom_catalog());
    }

    #[test]
    fn test_minimal_config_catalog_is_builtin() {
        let config = Config::from_str(MINIMAL_CONFIG).expect("should parse config");
        let catalog = config.catalog().expect("builtin catalog is valid");
        let code = catalog.lookup(TaskCategory::CodeGeneration);
        assert_eq!(code[0].name(), "gpt-5-pro");
    }

    #[test]
    fn test_full_config_parses_every_section() {
        let config = Config::from_str(FULL_CONFIG).expect("should parse config");
        assert_eq!(config.providers.openai.timeout_seconds(), 20);
        assert_eq!(config.providers.google.timeout_seconds(), 60);
        assert_eq!(config.classifier.strategy, ClassifierStrategy::Keyword);
        assert_eq!(config.routing.default_priority, Priority::Cost);
        assert_eq!(config.routing.default_latency_budget_ms, Some(800));
        assert_eq!(config.observability.log_level, "debug");
        assert!(config.has_custom_catalog());
    }

    #[test]
    fn test_custom_catalog_fallback_provider_resolution() {
        let config = Config::from_str(FULL_CONFIG).expect("should parse config");
        let catalog = config.catalog().unwrap();
        let code = catalog.lookup(TaskCategory::CodeGeneration);
        assert_eq!(code.len(), 2);

        let gpt5_fallback = code[0].fallback().expect("fallback set");
        assert_eq!(gpt5_fallback.name(), "gpt-5-mini");
        assert_eq!(gpt5_fallback.provider(), ProviderKind::OpenAi);

        let gemini_fallback = code[1].fallback().expect("fallback set");
        assert_eq!(gemini_fallback.name(), "gpt-5");
        assert_eq!(gemini_fallback.provider(), ProviderKind::OpenAi);

        // Unlisted category resolves to the catch-all list
        let summaries = catalog.lookup(TaskCategory::TextSummarization);
        assert_eq!(summaries[0].name(), "gpt-5-nano");
    }

    #[test]
    fn test_unknown_catalog_category_rejected() {
        let config = r#"
[server]
host = "127.0.0.1"
port = 3000

[[catalog."Poetry"]]
name = "gpt-5"
provider = "openai"
est_quality = 9
est_cost_per_1k_tokens = 0.015
est_latency_ms = 1200

[[catalog.Other]]
name = "gpt-5-nano"
provider = "openai"
est_quality = 6
est_cost_per_1k_tokens = 0.001
est_latency_ms = 300
"#;
        let err = Config::from_str(config).unwrap_err();
        assert!(err.to_string().contains("'Poetry' is not a task category"));
    }

    #[test]
    fn test_catalog_without_catch_all_rejected() {
        let config = r#"
[server]
host = "127.0.0.1"
port = 3000

[[catalog."Code Generation"]]
name = "gpt-5"
provider = "openai"
est_quality = 9
est_cost_per_1k_tokens = 0.015
est_latency_ms = 1200
"#;
        let err = Config::from_str(config).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("Other"));
    }

    #[test]
    fn test_unknown_provider_rejected_at_parse() {
        let config = r#"
[server]
host = "127.0.0.1"
port = 3000

[[catalog.Other]]
name = "claude"
provider = "anthropic"
est_quality = 6
est_cost_per_1k_tokens = 0.001
est_latency_ms = 300
"#;
        let err = Config::from_str(config).unwrap_err();
        assert!(matches!(err, AppError::ConfigParseFailed { .. }));
    }

    #[test]
    fn test_invalid_priority_rejected_at_parse() {
        let config = r#"
[server]
host = "127.0.0.1"
port = 3000

[routing]
default_priority = "fastest"
"#;
        assert!(matches!(
            Config::from_str(config),
            Err(AppError::ConfigParseFailed { .. })
        ));
    }

    #[test]
    fn test_zero_default_budget_rejected() {
        let config = r#"
[server]
host = "127.0.0.1"
port = 3000

[routing]
default_latency_budget_ms = 0
"#;
        let err = Config::from_str(config).unwrap_err();
        assert!(err.to_string().contains("default_latency_budget_ms"));
    }

    #[test]
    fn test_provider_timeout_bounds() {
        for (timeout, ok) in [(0, false), (1, true), (300, true), (301, false)] {
            let config = format!(
                r#"
[server]
host = "127.0.0.1"
port = 3000

[providers.openai]
base_url = "https://api.openai.com/v1"
api_key_env = "OPENAI_API_KEY"
timeout_seconds = {}
"#,
                timeout
            );
            assert_eq!(
                Config::from_str(&config).is_ok(),
                ok,
                "timeout_seconds = {} should be ok={}",
                timeout,
                ok
            );
        }
    }

    #[test]
    fn test_provider_base_url_requires_scheme() {
        let config = r#"
[server]
host = "127.0.0.1"
port = 3000

[providers.google]
base_url = "generativelanguage.googleapis.com/v1beta"
api_key_env = "GOOGLE_GEMINI_API_KEY"
"#;
        let err = Config::from_str(config).unwrap_err();
        assert!(err.to_string().contains("providers.google.base_url"));
    }

    #[test]
    fn test_llm_classifier_requires_model() {
        let config = r#"
[server]
host = "127.0.0.1"
port = 3000

[classifier]
model = ""
"#;
        let err = Config::from_str(config).unwrap_err();
        assert!(err.to_string().contains("classifier.model"));
    }

    #[test]
    fn test_keyword_classifier_ignores_endpoint_settings() {
        let config = r#"
[server]
host = "127.0.0.1"
port = 3000

[classifier]
strategy = "keyword"
model = ""
base_url = "not-a-url"
"#;
        assert!(Config::from_str(config).is_ok());
    }

    #[test]
    fn test_api_key_reads_named_env_var() {
        let endpoint = ProviderEndpoint::new(
            "https://api.openai.com/v1",
            "TASKROUTE_TEST_KEY_THAT_IS_NEVER_SET",
            60,
        );
        assert_eq!(endpoint.api_key(), None);
    }
}
