//! Host-boundary value contract.
//!
//! A foreign-function bridge (Node, Python, anything JSON-shaped) marshals
//! requests and responses through the types here; the bridge itself lives
//! outside this crate. Config keys are camelCase on the wire and unknown
//! keys are ignored. Responses carry either a value or an `{message, code}`
//! error record, never both.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{
    AlgorithmConfig, AlgorithmType, CaseSensitivity, ConfigPatch, PreprocessingMode,
};
use crate::engine::SimilarityEngine;
use crate::error::{Result, SimilarityError};

// ============================================================================
// Requests
// ============================================================================

/// Wire-side configuration mapping. Every field is optional; only the keys
/// the caller provided end up in the resulting [`ConfigPatch`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WireConfig {
    pub algorithm: Option<u8>,
    pub preprocessing: Option<u8>,
    pub case_sensitivity: Option<u8>,
    pub ngram_size: Option<u32>,
    pub threshold: Option<f64>,
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub prefix_weight: Option<f64>,
    pub prefix_length: Option<u32>,
    pub max_string_length: Option<usize>,
}

impl WireConfig {
    /// Convert to a merge patch, rejecting out-of-range enum tags.
    pub fn to_patch(&self) -> Result<ConfigPatch> {
        let algorithm = self
            .algorithm
            .map(|tag| {
                AlgorithmType::from_tag(tag).ok_or_else(|| {
                    SimilarityError::InvalidConfiguration(format!(
                        "algorithm tag {tag} is out of range"
                    ))
                })
            })
            .transpose()?;
        let preprocessing = self
            .preprocessing
            .map(|tag| {
                PreprocessingMode::from_tag(tag).ok_or_else(|| {
                    SimilarityError::InvalidConfiguration(format!(
                        "preprocessing tag {tag} is out of range"
                    ))
                })
            })
            .transpose()?;
        let case_sensitivity = self
            .case_sensitivity
            .map(|tag| {
                CaseSensitivity::from_tag(tag).ok_or_else(|| {
                    SimilarityError::InvalidConfiguration(format!(
                        "caseSensitivity tag {tag} is out of range"
                    ))
                })
            })
            .transpose()?;

        Ok(ConfigPatch {
            algorithm,
            preprocessing,
            case_sensitivity,
            ngram_size: self.ngram_size,
            threshold: self.threshold,
            alpha: self.alpha,
            beta: self.beta,
            prefix_weight: self.prefix_weight,
            prefix_length: self.prefix_length,
            max_string_length: self.max_string_length,
        })
    }

    /// Parse from a JSON value, ignoring unknown keys.
    pub fn from_value(value: &Value) -> Result<WireConfig> {
        serde_json::from_value(value.clone())
            .map_err(|e| SimilarityError::InvalidConfiguration(format!("malformed config: {e}")))
    }
}

/// Resolve the wire `algorithm` argument: an integer tag 0..12 or a
/// case-insensitive canonical name (hyphenated forms and the `dice` alias
/// accepted).
pub fn resolve_algorithm(value: &Value) -> Result<AlgorithmType> {
    match value {
        Value::Number(number) => {
            let tag = number
                .as_u64()
                .filter(|&tag| tag <= u64::from(u8::MAX))
                .ok_or_else(|| {
                    SimilarityError::InvalidConfiguration(format!(
                        "algorithm tag {number} is out of range"
                    ))
                })?;
            AlgorithmType::from_tag(tag as u8).ok_or_else(|| {
                SimilarityError::InvalidConfiguration(format!(
                    "algorithm tag {tag} is out of range"
                ))
            })
        }
        Value::String(name) => AlgorithmType::parse(name).ok_or_else(|| {
            SimilarityError::InvalidConfiguration(format!("unknown algorithm name: {name}"))
        }),
        other => Err(SimilarityError::InvalidConfiguration(format!(
            "algorithm must be an integer tag or a name, got {other}"
        ))),
    }
}

/// Numeric tag for a name, if it resolves.
pub fn parse_algorithm_type(name: &str) -> Option<u8> {
    AlgorithmType::parse(name).map(AlgorithmType::tag)
}

/// Canonical name for a tag, if it is in range.
pub fn algorithm_name(tag: u8) -> Option<&'static str> {
    AlgorithmType::from_tag(tag).map(AlgorithmType::name)
}

// ============================================================================
// Responses
// ============================================================================

/// Error record carried by unsuccessful responses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WireError {
    pub message: String,
    pub code: u8,
}

impl From<&SimilarityError> for WireError {
    fn from(error: &SimilarityError) -> Self {
        Self {
            message: error.to_string(),
            code: error.code(),
        }
    }
}

/// `{success, value?, error?}` record for similarity results.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarityResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<WireError>,
}

impl From<Result<f64>> for SimilarityResponse {
    fn from(result: Result<f64>) -> Self {
        match result {
            Ok(value) => Self {
                success: true,
                value: Some(value),
                error: None,
            },
            Err(error) => Self {
                success: false,
                value: None,
                error: Some(WireError::from(&error)),
            },
        }
    }
}

/// `{success, value?, error?}` record for distance results. Vector-family
/// distances are the real distance multiplied by 1000 and rounded; divide
/// by 1000 for real units.
#[derive(Debug, Clone, Serialize)]
pub struct DistanceResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<WireError>,
}

impl From<Result<u32>> for DistanceResponse {
    fn from(result: Result<u32>) -> Self {
        match result {
            Ok(value) => Self {
                success: true,
                value: Some(value),
                error: None,
            },
            Err(error) => Self {
                success: false,
                value: None,
                error: Some(WireError::from(&error)),
            },
        }
    }
}

/// `{type, name}` introspection record.
#[derive(Debug, Clone, Serialize)]
pub struct AlgorithmInfo {
    #[serde(rename = "type")]
    pub algorithm_type: u8,
    pub name: &'static str,
}

/// Every supported algorithm, in tag order.
pub fn supported_algorithms() -> Vec<AlgorithmInfo> {
    AlgorithmType::ALL
        .iter()
        .map(|&algorithm| AlgorithmInfo {
            algorithm_type: algorithm.tag(),
            name: algorithm.name(),
        })
        .collect()
}

/// Wire echo of a resolved configuration; optional fields appear only when
/// present.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireConfigOut {
    pub algorithm: u8,
    pub preprocessing: u8,
    pub case_sensitivity: u8,
    pub ngram_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_string_length: Option<usize>,
}

impl From<&AlgorithmConfig> for WireConfigOut {
    fn from(config: &AlgorithmConfig) -> Self {
        Self {
            algorithm: config.algorithm.tag(),
            preprocessing: config.preprocessing.tag(),
            case_sensitivity: config.case_sensitivity.tag(),
            ngram_size: config.ngram_size,
            threshold: config.threshold,
            alpha: config.alpha,
            beta: config.beta,
            prefix_weight: config.prefix_weight,
            prefix_length: config.prefix_length,
            max_string_length: config.max_string_length,
        }
    }
}

// ============================================================================
// Request evaluation
// ============================================================================

/// Evaluate a `CalculateSimilarity` request against an engine.
pub fn calculate_similarity(
    engine: &SimilarityEngine,
    s1: &str,
    s2: &str,
    algorithm: &Value,
    config: Option<&Value>,
) -> SimilarityResponse {
    evaluate(engine, s1, s2, algorithm, config, SimilarityEngine::similarity).into()
}

/// Evaluate a `CalculateDistance` request against an engine.
pub fn calculate_distance(
    engine: &SimilarityEngine,
    s1: &str,
    s2: &str,
    algorithm: &Value,
    config: Option<&Value>,
) -> DistanceResponse {
    evaluate(engine, s1, s2, algorithm, config, SimilarityEngine::distance).into()
}

/// Evaluate a batch request: positionally aligned responses, one per pair.
pub fn calculate_similarity_batch(
    engine: &SimilarityEngine,
    pairs: &[(String, String)],
    algorithm: &Value,
    config: Option<&Value>,
) -> Vec<SimilarityResponse> {
    let resolved = match resolve_request(algorithm, config) {
        Ok(resolved) => resolved,
        Err(error) => {
            return pairs
                .iter()
                .map(|_| SimilarityResponse::from(Err(error.clone())))
                .collect();
        }
    };
    let (algorithm, patch) = resolved;

    engine
        .similarity_batch(pairs, algorithm, patch.as_ref())
        .into_iter()
        .map(SimilarityResponse::from)
        .collect()
}

/// Wire echo of the engine's global configuration.
pub fn get_global_configuration(engine: &SimilarityEngine) -> Value {
    let config = engine.get_global_config();
    serde_json::to_value(WireConfigOut::from(&config)).unwrap_or(Value::Null)
}

fn resolve_request(
    algorithm: &Value,
    config: Option<&Value>,
) -> Result<(AlgorithmType, Option<ConfigPatch>)> {
    let algorithm = resolve_algorithm(algorithm)?;
    let patch = config
        .map(|value| WireConfig::from_value(value).and_then(|wire| wire.to_patch()))
        .transpose()?;
    Ok((algorithm, patch))
}

fn evaluate<T>(
    engine: &SimilarityEngine,
    s1: &str,
    s2: &str,
    algorithm: &Value,
    config: Option<&Value>,
    op: impl Fn(&SimilarityEngine, &str, &str, AlgorithmType, Option<&ConfigPatch>) -> Result<T>,
) -> Result<T> {
    let (algorithm, patch) = resolve_request(algorithm, config)?;
    op(engine, s1, s2, algorithm, patch.as_ref())
}
