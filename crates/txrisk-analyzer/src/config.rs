//! Configuration for the analyzer

use serde::{Deserialize, Serialize};
use std::time::Duration;
use txrisk_llm::LlmConfig;
use txrisk_retrieval::{EnsembleWeights, InstructionsConfig, SanctionsConfig, WikiConfig};

/// Pipeline tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Added to the 1-based rank in the fusion score denominator
    pub rank_constant: f64,

    /// Upper bound on the formatted context (characters, 0 = unbounded)
    pub max_context_chars: usize,

    /// Maximum time for one model call (seconds)
    pub inference_timeout_secs: u64,

    /// Maximum time for each retriever (seconds)
    pub retrieval_timeout_secs: u64,

    /// Corrective re-prompts after a schema violation
    pub max_schema_retries: u32,

    /// Require every analysis field in the model's JSON block
    pub strict_schema: bool,

    /// Per-retriever fusion weights
    pub weights: EnsembleWeights,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            rank_constant: txrisk_retrieval::ensemble::DEFAULT_RANK_CONSTANT,
            max_context_chars: 12_000,
            inference_timeout_secs: 120,
            retrieval_timeout_secs: 30,
            max_schema_retries: 1,
            strict_schema: true,
            weights: EnsembleWeights::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Lenient preset: only `notes` is required and no corrective retries
    pub fn lenient() -> Self {
        Self {
            max_schema_retries: 0,
            strict_schema: false,
            inference_timeout_secs: 300,
            ..Self::default()
        }
    }

    /// Inference timeout as a Duration
    pub fn inference_timeout(&self) -> Duration {
        Duration::from_secs(self.inference_timeout_secs)
    }

    /// Retrieval timeout as a Duration
    pub fn retrieval_timeout(&self) -> Duration {
        Duration::from_secs(self.retrieval_timeout_secs)
    }

    /// Context bound, `None` when unbounded
    pub fn context_limit(&self) -> Option<usize> {
        (self.max_context_chars > 0).then_some(self.max_context_chars)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.weights.validate().map_err(|e| e.to_string())?;
        if !self.rank_constant.is_finite() || self.rank_constant < 0.0 {
            return Err("analyzer.rank_constant must be finite and non-negative".to_string());
        }
        if self.inference_timeout_secs == 0 {
            return Err("analyzer.inference_timeout_secs must be greater than 0".to_string());
        }
        if self.retrieval_timeout_secs == 0 {
            return Err("analyzer.retrieval_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

/// Everything needed to build an `AnalyzerContext`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Reasoning model
    pub llm: LlmConfig,
    /// Sanctions matching service
    pub sanctions: SanctionsConfig,
    /// Encyclopedic service
    pub wiki: WikiConfig,
    /// Guidance corpus
    pub instructions: InstructionsConfig,
    /// Pipeline tuning
    pub analyzer: AnalyzerConfig,
}

impl PipelineConfig {
    /// Validate every section
    pub fn validate(&self) -> Result<(), String> {
        self.llm.validate()?;
        self.sanctions.validate()?;
        self.wiki.validate()?;
        self.instructions.validate()?;
        self.analyzer.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AnalyzerConfig::default().validate().is_ok());
        assert!(AnalyzerConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_default_weights() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.weights.sanctions, 0.5);
        assert_eq!(config.weights.wiki, 0.25);
        assert_eq!(config.weights.instructions, 0.25);
        assert_eq!(config.context_limit(), Some(12_000));
    }

    #[test]
    fn test_zero_weights_rejected() {
        let mut config = AnalyzerConfig::default();
        config.weights = EnsembleWeights {
            sanctions: 0.0,
            wiki: 0.0,
            instructions: 0.0,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unbounded_context() {
        let config = AnalyzerConfig {
            max_context_chars: 0,
            ..AnalyzerConfig::default()
        };
        assert_eq!(config.context_limit(), None);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AnalyzerConfig::lenient();
        let toml_str = config.to_toml().unwrap();
        let parsed = AnalyzerConfig::from_toml(&toml_str).unwrap();

        assert_eq!(parsed.strict_schema, config.strict_schema);
        assert_eq!(parsed.max_schema_retries, config.max_schema_retries);
        assert_eq!(parsed.weights, config.weights);
    }

    #[test]
    fn test_partial_toml() {
        let parsed = AnalyzerConfig::from_toml(
            r#"
            max_context_chars = 500
            [weights]
            wiki = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(parsed.max_context_chars, 500);
        assert_eq!(parsed.weights.wiki, 0.5);
        assert_eq!(parsed.weights.sanctions, 0.5);
        assert!(parsed.strict_schema);
    }
}
