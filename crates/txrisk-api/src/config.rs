//! Service configuration
//!
//! One TOML file holds the server settings and every pipeline section
//! (`[llm]`, `[sanctions]`, `[wiki]`, `[instructions]`, `[analyzer]`).
//! Credentials are never compiled in: a value written as `env:NAME` is read
//! from the environment at load time, and `TXRISK_LLM_API_KEY` /
//! `TXRISK_SANCTIONS_API_KEY` override whatever the file says.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use txrisk_analyzer::PipelineConfig;

/// Overrides `llm.api_key`
pub const LLM_KEY_VAR: &str = "TXRISK_LLM_API_KEY";

/// Overrides `sanctions.api_key`
pub const SANCTIONS_KEY_VAR: &str = "TXRISK_SANCTIONS_API_KEY";

const ENV_PREFIX: &str = "env:";

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// An `env:NAME` reference points at an unset variable
    #[error("Environment variable {0} is not set")]
    MissingEnv(String),

    /// A setting is out of range or missing
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Server settings plus the analysis pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub bind_address: String,

    /// Bind port
    pub bind_port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pipeline sections
    #[serde(flatten)]
    pub pipeline: PipelineConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 8000,
            database_path: PathBuf::from("transactions.db"),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load from a TOML file (or defaults) and resolve credentials from the
    /// process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_toml(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        config.resolve_credentials(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Parse a TOML document without touching the environment
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Apply `env:` references and key overrides using `lookup`
    pub fn resolve_credentials<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pipeline = &mut self.pipeline;
        resolve_secret(&mut pipeline.llm.api_key, Some(LLM_KEY_VAR), &lookup)?;
        resolve_secret(&mut pipeline.sanctions.api_key, Some(SANCTIONS_KEY_VAR), &lookup)?;
        resolve_secret(&mut pipeline.instructions.embedding.api_key, None, &lookup)?;
        Ok(())
    }

    /// Validate server and pipeline settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.is_empty() {
            return Err(ConfigError::Invalid("bind_address must not be empty".to_string()));
        }
        self.pipeline.validate().map_err(ConfigError::Invalid)
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }

    /// Override the bind address from `host:port`
    pub fn set_bind(&mut self, bind: &str) -> Result<(), ConfigError> {
        let (host, port) = bind
            .rsplit_once(':')
            .ok_or_else(|| ConfigError::Invalid(format!("bind `{}` is not host:port", bind)))?;
        self.bind_port = port
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("bind port `{}` is not a number", port)))?;
        self.bind_address = host.to_string();
        Ok(())
    }
}

fn resolve_secret<F>(
    value: &mut Option<String>,
    override_var: Option<&str>,
    lookup: &F,
) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = override_var
        .and_then(|var| lookup(var))
        .filter(|key| !key.is_empty())
    {
        *value = Some(key);
        return Ok(());
    }

    if let Some(name) = value.as_deref().and_then(|v| v.strip_prefix(ENV_PREFIX)) {
        let name = name.trim().to_string();
        *value = Some(lookup(&name).ok_or(ConfigError::MissingEnv(name))?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const SAMPLE: &str = r#"
        bind_address = "0.0.0.0"
        bind_port = 9000
        database_path = "/var/lib/txrisk/transactions.db"

        [llm]
        provider = "chat"
        api_key = "env:GROQ_API_KEY"

        [sanctions]
        api_key = "file-key"

        [wiki]
        best_effort = false

        [instructions]
        path = "config/guidance.md"

        [analyzer]
        max_context_chars = 8000

        [analyzer.weights]
        sanctions = 0.6
        wiki = 0.2
        instructions = 0.2
    "#;

    #[test]
    fn test_parse_toml() {
        let config = ServiceConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
        assert!(!config.pipeline.wiki.best_effort);
        assert_eq!(config.pipeline.wiki.top_k, 3);
        assert_eq!(config.pipeline.analyzer.max_context_chars, 8000);
        assert_eq!(config.pipeline.analyzer.weights.sanctions, 0.6);
    }

    #[test]
    fn test_env_reference_resolved() {
        let mut config = ServiceConfig::from_toml(SAMPLE).unwrap();
        config
            .resolve_credentials(env(&[("GROQ_API_KEY", "gsk-123")]))
            .unwrap();

        assert_eq!(config.pipeline.llm.api_key.as_deref(), Some("gsk-123"));
        assert_eq!(config.pipeline.sanctions.api_key.as_deref(), Some("file-key"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_override_variables_win() {
        let mut config = ServiceConfig::from_toml(SAMPLE).unwrap();
        config
            .resolve_credentials(env(&[
                (LLM_KEY_VAR, "override-llm"),
                (SANCTIONS_KEY_VAR, "override-sanctions"),
            ]))
            .unwrap();

        assert_eq!(config.pipeline.llm.api_key.as_deref(), Some("override-llm"));
        assert_eq!(
            config.pipeline.sanctions.api_key.as_deref(),
            Some("override-sanctions")
        );
    }

    #[test]
    fn test_unset_env_reference_is_error() {
        let mut config = ServiceConfig::from_toml(SAMPLE).unwrap();
        let err = config.resolve_credentials(env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv(name) if name == "GROQ_API_KEY"));
    }

    #[test]
    fn test_defaults_need_credentials() {
        let config = ServiceConfig::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:8000");
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_set_bind() {
        let mut config = ServiceConfig::default();
        config.set_bind("0.0.0.0:8080").unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert!(config.set_bind("no-port").is_err());
        assert!(config.set_bind("host:http").is_err());
    }
}
