//! Parse raw model output into a `TransactionAnalysis`
//!
//! The reply is free text that may hold one `<think>…</think>` reasoning
//! span and one ```` ```json ```` fenced block. Both are located with
//! non-greedy patterns and the first occurrence wins. The JSON block may sit
//! before or after the reasoning span, but never inside it, so a fenced
//! example quoted in the reasoning never shadows the verdict.
//!
//! A reply without a fenced block degrades to the default record (flagged
//! `degraded`). A block that is present but does not fit the schema is a
//! `SchemaError`.

use crate::error::AnalysisError;
use regex::Regex;
use serde_json::{Map, Value};
use std::ops::Range;
use std::sync::LazyLock;
use tracing::warn;
use txrisk_domain::{TransactionAnalysis, NOT_AVAILABLE};

static THINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<think>(.*?)</think>").expect("think-span pattern is valid")
});

static JSON_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```json[^\n]*\n(.*?)```").expect("json-block pattern is valid")
});

/// A parsed reply
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    /// The verdict, reasoning trace appended
    pub analysis: TransactionAnalysis,
    /// No JSON block was found and the verdict is the empty default
    pub degraded: bool,
}

/// Turns raw model text into the canonical schema
#[derive(Debug, Clone, Copy)]
pub struct ResponseParser {
    strict: bool,
}

impl ResponseParser {
    /// Create a parser; `strict` requires every analysis field
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    /// Parse one reply
    pub fn parse(&self, raw: &str) -> Result<ParsedResponse, AnalysisError> {
        let (reasoning, span) = split_reasoning(raw);

        let Some(payload) = verdict_block(raw, span) else {
            warn!(
                raw_len = raw.len(),
                "Model reply has no fenced JSON block; returning an empty analysis"
            );
            let mut analysis = TransactionAnalysis::default();
            if let Some(trace) = reasoning {
                analysis.append_reasoning(trace);
            }
            return Ok(ParsedResponse {
                analysis,
                degraded: true,
            });
        };

        let value: Value = serde_json::from_str(payload)
            .map_err(|e| AnalysisError::Schema(format!("malformed JSON block: {}", e)))?;
        let object = value
            .as_object()
            .ok_or_else(|| AnalysisError::Schema("JSON block is not an object".to_string()))?;

        let mut analysis = self.coerce(object)?;
        if let Some(trace) = reasoning {
            analysis.append_reasoning(trace);
        }

        Ok(ParsedResponse {
            analysis,
            degraded: false,
        })
    }

    fn coerce(&self, obj: &Map<String, Value>) -> Result<TransactionAnalysis, AnalysisError> {
        Ok(TransactionAnalysis {
            sender: self.text(obj, "sender")?,
            receiver: self.text(obj, "receiver")?,
            amount: self.text(obj, "amount")?,
            currency: self.text(obj, "currency")?,
            transaction_type: self.text(obj, "transactionType")?,
            transaction_date: self.text(obj, "transactionDate")?,
            risk_score: self.risk_score(obj)?,
            risk_level: self.text(obj, "riskLevel")?,
            confidence_score: self.confidence(obj)?,
            category: self.text(obj, "category")?,
            notes: notes(obj)?,
        })
    }

    fn field<'v>(
        &self,
        obj: &'v Map<String, Value>,
        key: &str,
    ) -> Result<Option<&'v Value>, AnalysisError> {
        match obj.get(key) {
            None if self.strict => Err(AnalysisError::Schema(format!("missing field `{}`", key))),
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(value)),
        }
    }

    fn text(&self, obj: &Map<String, Value>, key: &str) -> Result<String, AnalysisError> {
        match self.field(obj, key)? {
            None => Ok(NOT_AVAILABLE.to_string()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::Bool(b)) => Ok(b.to_string()),
            Some(_) => Err(AnalysisError::Schema(format!(
                "field `{}` must be a string",
                key
            ))),
        }
    }

    fn risk_score(&self, obj: &Map<String, Value>) -> Result<u8, AnalysisError> {
        let Some(value) = self.field(obj, "riskScore")? else {
            return Ok(0);
        };
        let score = number(value)
            .ok_or_else(|| AnalysisError::Schema("field `riskScore` must be a number".to_string()))?
            .round();
        if !(0.0..=100.0).contains(&score) {
            return Err(AnalysisError::Schema(format!(
                "riskScore {} is outside 0..=100",
                score
            )));
        }
        Ok(score as u8)
    }

    fn confidence(&self, obj: &Map<String, Value>) -> Result<f64, AnalysisError> {
        let Some(value) = self.field(obj, "confidenceScore")? else {
            return Ok(0.0);
        };
        let confidence = number(value).ok_or_else(|| {
            AnalysisError::Schema("field `confidenceScore` must be a number".to_string())
        })?;
        if !(0.0..=1.0).contains(&confidence) {
            return Err(AnalysisError::Schema(format!(
                "confidenceScore {} is outside 0.0..=1.0",
                confidence
            )));
        }
        Ok(confidence)
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new(true)
    }
}

/// The first reasoning span, and its byte range in `raw`
fn split_reasoning(raw: &str) -> (Option<&str>, Option<Range<usize>>) {
    match THINK_RE.captures(raw) {
        Some(caps) => (
            caps.get(1).map(|m| m.as_str().trim()),
            caps.get(0).map(|m| m.range()),
        ),
        None => (None, None),
    }
}

/// The first fenced JSON block that does not overlap the reasoning span
fn verdict_block(raw: &str, span: Option<Range<usize>>) -> Option<&str> {
    JSON_BLOCK_RE
        .captures_iter(raw)
        .filter(|caps| {
            let Some(block) = caps.get(0) else {
                return false;
            };
            span.as_ref()
                .map_or(true, |span| block.end() <= span.start || block.start() >= span.end)
        })
        .find_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// The first reasoning span, trimmed
pub fn extract_reasoning(raw: &str) -> Option<&str> {
    split_reasoning(raw).0
}

/// The body of the first ```` ```json ```` block, trimmed
pub fn extract_json_block(raw: &str) -> Option<&str> {
    JSON_BLOCK_RE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

fn number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

// `notes` is required in every mode, the reasoning trace is appended to it
fn notes(obj: &Map<String, Value>) -> Result<Vec<String>, AnalysisError> {
    match obj.get("notes") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                Value::Number(_) | Value::Bool(_) => Ok(item.to_string()),
                _ => Err(AnalysisError::Schema(
                    "entries of `notes` must be strings".to_string(),
                )),
            })
            .collect(),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(_) => Err(AnalysisError::Schema("field `notes` must be a list".to_string())),
        None => Err(AnalysisError::Schema("missing field `notes`".to_string())),
    }
}
