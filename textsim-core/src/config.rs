//! Algorithm tags, modes and the configuration model.
//!
//! Configuration is layered: a resolved [`AlgorithmConfig`] (every field
//! concrete or defaulted) plus [`ConfigPatch`] overlays for the
//! per-algorithm and per-call layers. A patch only carries fields the caller
//! actually set, so an explicit value equal to a default is still
//! authoritative when merged.

use crate::error::{Result, SimilarityError};

/// Default cap on input size, in UTF-8 bytes per string.
pub const DEFAULT_MAX_STRING_LENGTH: usize = 100_000;

/// Default n-gram window size.
pub const DEFAULT_NGRAM_SIZE: u32 = 2;

/// Jaro-Winkler activation floor when no threshold is configured.
pub const DEFAULT_WINKLER_THRESHOLD: f64 = 0.7;

/// Jaro-Winkler prefix scaling factor when none is configured.
pub const DEFAULT_PREFIX_WEIGHT: f64 = 0.1;

/// Jaro-Winkler common-prefix cap when none is configured.
pub const DEFAULT_PREFIX_LENGTH: u32 = 4;

// ============================================================================
// Tags
// ============================================================================

/// The thirteen supported algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AlgorithmType {
    Levenshtein = 0,
    DamerauLevenshtein = 1,
    Hamming = 2,
    Jaro = 3,
    JaroWinkler = 4,
    Jaccard = 5,
    SorensenDice = 6,
    Overlap = 7,
    Tversky = 8,
    Cosine = 9,
    Euclidean = 10,
    Manhattan = 11,
    Chebyshev = 12,
}

impl AlgorithmType {
    /// All algorithms in tag order.
    pub const ALL: [AlgorithmType; 13] = [
        AlgorithmType::Levenshtein,
        AlgorithmType::DamerauLevenshtein,
        AlgorithmType::Hamming,
        AlgorithmType::Jaro,
        AlgorithmType::JaroWinkler,
        AlgorithmType::Jaccard,
        AlgorithmType::SorensenDice,
        AlgorithmType::Overlap,
        AlgorithmType::Tversky,
        AlgorithmType::Cosine,
        AlgorithmType::Euclidean,
        AlgorithmType::Manhattan,
        AlgorithmType::Chebyshev,
    ];

    /// Numeric wire tag.
    #[inline]
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Resolve a numeric wire tag.
    pub fn from_tag(tag: u8) -> Option<AlgorithmType> {
        Self::ALL.get(tag as usize).copied()
    }

    /// Canonical display name.
    pub fn name(self) -> &'static str {
        match self {
            AlgorithmType::Levenshtein => "Levenshtein",
            AlgorithmType::DamerauLevenshtein => "Damerau-Levenshtein",
            AlgorithmType::Hamming => "Hamming",
            AlgorithmType::Jaro => "Jaro",
            AlgorithmType::JaroWinkler => "Jaro-Winkler",
            AlgorithmType::Jaccard => "Jaccard",
            AlgorithmType::SorensenDice => "Sorensen-Dice",
            AlgorithmType::Overlap => "Overlap",
            AlgorithmType::Tversky => "Tversky",
            AlgorithmType::Cosine => "Cosine",
            AlgorithmType::Euclidean => "Euclidean",
            AlgorithmType::Manhattan => "Manhattan",
            AlgorithmType::Chebyshev => "Chebyshev",
        }
    }

    /// Parse a case-insensitive algorithm name. Hyphenated canonical forms
    /// are accepted, plus the `dice` shorthand for Sorensen-Dice.
    pub fn parse(name: &str) -> Option<AlgorithmType> {
        match name.to_ascii_lowercase().as_str() {
            "levenshtein" => Some(AlgorithmType::Levenshtein),
            "damerau-levenshtein" => Some(AlgorithmType::DamerauLevenshtein),
            "hamming" => Some(AlgorithmType::Hamming),
            "jaro" => Some(AlgorithmType::Jaro),
            "jaro-winkler" => Some(AlgorithmType::JaroWinkler),
            "jaccard" => Some(AlgorithmType::Jaccard),
            "sorensen-dice" => Some(AlgorithmType::SorensenDice),
            "dice" => Some(AlgorithmType::SorensenDice),
            "overlap" => Some(AlgorithmType::Overlap),
            "tversky" => Some(AlgorithmType::Tversky),
            "cosine" => Some(AlgorithmType::Cosine),
            "euclidean" => Some(AlgorithmType::Euclidean),
            "manhattan" => Some(AlgorithmType::Manhattan),
            "chebyshev" => Some(AlgorithmType::Chebyshev),
            _ => None,
        }
    }
}

impl std::fmt::Display for AlgorithmType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Tokenization applied before the set/vector kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum PreprocessingMode {
    /// One token equal to the input.
    None = 0,
    /// One token per code point.
    #[default]
    Character = 1,
    /// Maximal `[A-Za-z0-9_]+` runs.
    Word = 2,
    /// Sliding code-point windows of `ngram_size`.
    NGram = 3,
}

impl PreprocessingMode {
    #[inline]
    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<PreprocessingMode> {
        match tag {
            0 => Some(PreprocessingMode::None),
            1 => Some(PreprocessingMode::Character),
            2 => Some(PreprocessingMode::Word),
            3 => Some(PreprocessingMode::NGram),
            _ => None,
        }
    }
}

/// Whether character comparisons fold case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum CaseSensitivity {
    #[default]
    Sensitive = 0,
    Insensitive = 1,
}

impl CaseSensitivity {
    #[inline]
    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<CaseSensitivity> {
        match tag {
            0 => Some(CaseSensitivity::Sensitive),
            1 => Some(CaseSensitivity::Insensitive),
            _ => None,
        }
    }

    #[inline]
    pub fn is_sensitive(self) -> bool {
        matches!(self, CaseSensitivity::Sensitive)
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Fully resolved configuration for one kernel invocation.
///
/// Values are copied into the call, so concurrent reconfiguration never
/// mutates an in-flight computation.
#[derive(Debug, Clone, PartialEq)]
pub struct AlgorithmConfig {
    pub algorithm: AlgorithmType,
    pub preprocessing: PreprocessingMode,
    pub case_sensitivity: CaseSensitivity,
    pub ngram_size: u32,
    /// Early-termination bound for the edit kernels; Jaro-Winkler activation
    /// floor (0.7 when absent).
    pub threshold: Option<f64>,
    /// Tversky weights; required together, non-negative.
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    /// Jaro-Winkler prefix scaling factor in [0.0, 0.25].
    pub prefix_weight: Option<f64>,
    /// Jaro-Winkler common-prefix cap in [0, 4].
    pub prefix_length: Option<u32>,
    /// Per-string input cap in UTF-8 bytes.
    pub max_string_length: Option<usize>,
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        Self {
            algorithm: AlgorithmType::Levenshtein,
            preprocessing: PreprocessingMode::Character,
            case_sensitivity: CaseSensitivity::Sensitive,
            ngram_size: DEFAULT_NGRAM_SIZE,
            threshold: None,
            alpha: None,
            beta: None,
            prefix_weight: None,
            prefix_length: None,
            max_string_length: None,
        }
    }
}

impl AlgorithmConfig {
    /// Configured input cap, or the crate default.
    #[inline]
    pub fn effective_max_string_length(&self) -> usize {
        self.max_string_length.unwrap_or(DEFAULT_MAX_STRING_LENGTH)
    }

    /// Validate the resolved configuration against the active algorithm.
    pub fn validate(&self) -> Result<()> {
        if self.ngram_size == 0 {
            return Err(SimilarityError::InvalidConfiguration(
                "ngram_size must be greater than zero".into(),
            ));
        }

        if let Some(threshold) = self.threshold {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(SimilarityError::InvalidConfiguration(
                    "threshold must be a non-negative number".into(),
                ));
            }
        }

        if self.algorithm == AlgorithmType::Tversky {
            match (self.alpha, self.beta) {
                (Some(alpha), Some(beta)) => {
                    if alpha < 0.0 || beta < 0.0 {
                        return Err(SimilarityError::InvalidConfiguration(
                            "Tversky alpha and beta must be non-negative".into(),
                        ));
                    }
                }
                _ => {
                    return Err(SimilarityError::InvalidConfiguration(
                        "Tversky algorithm requires alpha and beta parameters".into(),
                    ));
                }
            }
        }

        if self.algorithm == AlgorithmType::JaroWinkler {
            if let Some(weight) = self.prefix_weight {
                if !(0.0..=0.25).contains(&weight) {
                    return Err(SimilarityError::InvalidConfiguration(
                        "prefix_weight must be within [0.0, 0.25]".into(),
                    ));
                }
            }
            if let Some(length) = self.prefix_length {
                if length > 4 {
                    return Err(SimilarityError::InvalidConfiguration(
                        "prefix_length must be at most 4".into(),
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Partial configuration overlay.
///
/// Only fields that were actually provided are present; merging applies them
/// over the base config. This is the per-algorithm and per-call layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigPatch {
    pub algorithm: Option<AlgorithmType>,
    pub preprocessing: Option<PreprocessingMode>,
    pub case_sensitivity: Option<CaseSensitivity>,
    pub ngram_size: Option<u32>,
    pub threshold: Option<f64>,
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub prefix_weight: Option<f64>,
    pub prefix_length: Option<u32>,
    pub max_string_length: Option<usize>,
}

impl ConfigPatch {
    /// True when the patch carries no fields at all.
    pub fn is_empty(&self) -> bool {
        *self == ConfigPatch::default()
    }

    /// Apply every present field onto `base`.
    pub fn apply_to(&self, base: &mut AlgorithmConfig) {
        if let Some(algorithm) = self.algorithm {
            base.algorithm = algorithm;
        }
        if let Some(preprocessing) = self.preprocessing {
            base.preprocessing = preprocessing;
        }
        if let Some(case_sensitivity) = self.case_sensitivity {
            base.case_sensitivity = case_sensitivity;
        }
        if let Some(ngram_size) = self.ngram_size {
            base.ngram_size = ngram_size;
        }
        if let Some(threshold) = self.threshold {
            base.threshold = Some(threshold);
        }
        if let Some(alpha) = self.alpha {
            base.alpha = Some(alpha);
        }
        if let Some(beta) = self.beta {
            base.beta = Some(beta);
        }
        if let Some(prefix_weight) = self.prefix_weight {
            base.prefix_weight = Some(prefix_weight);
        }
        if let Some(prefix_length) = self.prefix_length {
            base.prefix_length = Some(prefix_length);
        }
        if let Some(max_string_length) = self.max_string_length {
            base.max_string_length = Some(max_string_length);
        }
    }
}

/// Merge the configuration layers for one call.
///
/// Order: global base, then the per-algorithm patch, then the per-call
/// patch; the `algorithm` parameter always wins over whatever the layers
/// carried.
pub fn merge_config(
    global: &AlgorithmConfig,
    algorithm_patch: Option<&ConfigPatch>,
    call_patch: Option<&ConfigPatch>,
    algorithm: AlgorithmType,
) -> AlgorithmConfig {
    let mut merged = global.clone();
    if let Some(patch) = algorithm_patch {
        patch.apply_to(&mut merged);
    }
    if let Some(patch) = call_patch {
        patch.apply_to(&mut merged);
    }
    merged.algorithm = algorithm;
    merged
}
