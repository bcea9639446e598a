use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::review::finding::Category;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub github: GitHubConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub review: ReviewConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct GitHubConfig {
    pub token: String,
}

// Manual Debug impl to avoid leaking the token
impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Deserialize, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

// Manual Debug impl to avoid leaking the API key
impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReviewConfig {
    /// Deadline for a whole review; agents still running are marked failed.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_diff_chars")]
    pub max_diff_chars: usize,
    /// Lines of source shown above and below a finding.
    #[serde(default = "default_context_lines")]
    pub context_lines: u32,
    #[serde(default = "default_enabled_agents")]
    pub enabled_agents: Vec<String>,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            max_diff_chars: default_max_diff_chars(),
            context_lines: default_context_lines(),
            enabled_agents: default_enabled_agents(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_model() -> String {
    "openai/gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_llm_timeout() -> u64 {
    60
}

fn default_request_timeout() -> u64 {
    120
}

fn default_max_diff_chars() -> usize {
    15_000
}

fn default_context_lines() -> u32 {
    3
}

fn default_enabled_agents() -> Vec<String> {
    Category::ALL.iter().map(|c| c.as_str().to_string()).collect()
}

/// Conventional variable names from existing deployments, mapped onto config keys.
const LEGACY_ENV: [(&str, &str); 6] = [
    ("GITHUB_TOKEN", "github.token"),
    ("OPENROUTER_API_KEY", "llm.api_key"),
    ("OPENROUTER_BASE_URL", "llm.base_url"),
    ("OPENROUTER_MODEL", "llm.model"),
    ("HOST", "server.host"),
    ("PORT", "server.port"),
];

impl AppConfig {
    /// Load configuration from an optional file, `PR_COUNCIL__*` variables and
    /// the conventional `GITHUB_TOKEN` / `OPENROUTER_*` variables, then validate.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        Self::load_from(config_path, true)
    }

    pub(crate) fn load_from(config_path: Option<&str>, read_env: bool) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Load from file if specified
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            builder = builder.add_source(config::File::with_name("pr-council").required(false));
        }

        if read_env {
            // Environment variable overrides with PR_COUNCIL_ prefix
            builder = builder.add_source(
                config::Environment::with_prefix("PR_COUNCIL")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

            for (var, key) in LEGACY_ENV {
                let value = std::env::var(var).ok().filter(|v| !v.is_empty());
                builder = builder
                    .set_override_option(key, value)
                    .map_err(|e| AppError::Config(e.to_string()))?;
            }
        }

        let config: AppConfig = builder
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.github.token.trim().is_empty() {
            return Err(AppError::Config("github.token (GITHUB_TOKEN) is required".to_string()));
        }
        if self.llm.api_key.trim().is_empty() {
            return Err(AppError::Config(
                "llm.api_key (OPENROUTER_API_KEY) is required".to_string(),
            ));
        }
        if self.llm.timeout_secs == 0 || self.review.request_timeout_secs == 0 {
            return Err(AppError::Config("timeouts must be greater than zero".to_string()));
        }
        if self.review.enabled_agents.is_empty() {
            return Err(AppError::Config("review.enabled_agents must not be empty".to_string()));
        }
        for name in &self.review.enabled_agents {
            if Category::parse(name).is_none() {
                return Err(AppError::Config(format!("Unknown agent in review.enabled_agents: {name}")));
            }
        }
        Ok(())
    }

    pub fn enabled_categories(&self) -> Vec<Category> {
        let mut categories: Vec<Category> = Vec::new();
        for category in self.review.enabled_agents.iter().filter_map(|n| Category::parse(n)) {
            if !categories.contains(&category) {
                categories.push(category);
            }
        }
        categories
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_with_defaults() {
        let file = write_config(
            r#"
[github]
token = "ghp_test"

[llm]
api_key = "sk-test"
"#,
        );

        let config = AppConfig::load_from(file.path().to_str(), false).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.llm.model, "openai/gpt-4o-mini");
        assert_eq!(config.llm.timeout_secs, 60);
        assert_eq!(config.review.request_timeout_secs, 120);
        assert_eq!(config.review.max_diff_chars, 15_000);
        assert_eq!(config.enabled_categories().len(), 5);
    }

    #[test]
    fn test_load_overrides_and_agent_subset() {
        let file = write_config(
            r#"
[server]
port = 9100

[github]
token = "ghp_test"

[llm]
api_key = "sk-test"
model = "anthropic/claude-3.5-sonnet"

[review]
enabled_agents = ["security", "Logic", "security"]
"#,
        );

        let config = AppConfig::load_from(file.path().to_str(), false).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.llm.model, "anthropic/claude-3.5-sonnet");
        assert_eq!(
            config.enabled_categories(),
            vec![Category::Security, Category::Logic]
        );
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let file = write_config(
            r#"
[github]
token = ""

[llm]
api_key = "sk-test"
"#,
        );

        let err = AppConfig::load_from(file.path().to_str(), false).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_unknown_agent_rejected() {
        let file = write_config(
            r#"
[github]
token = "ghp_test"

[llm]
api_key = "sk-test"

[review]
enabled_agents = ["style"]
"#,
        );

        let err = AppConfig::load_from(file.path().to_str(), false).unwrap_err();
        assert!(err.to_string().contains("style"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = LlmConfig {
            api_key: "sk-secret".to_string(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: 0.2,
            max_tokens: 2000,
            timeout_secs: 60,
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
