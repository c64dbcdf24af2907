//! Vector-space kernels: Cosine, Euclidean, Manhattan and Chebyshev.
//!
//! Cosine has three routes. Under Character preprocessing it compares
//! distinct-code-point presence vectors (`|A ∩ B| / sqrt(|A|·|B|)`), with a
//! 256-bin byte-frequency fast path when both inputs are pure ASCII. Under
//! every other mode it compares token-frequency vectors.
//!
//! The Lp kernels run over the union of keys of the two frequency vectors,
//! missing terms counting as zero. Real-valued distances are quantized to
//! integers by `round(d * 1000)`; the similarity conversions operate on the
//! quantized value so that similarity and distance always agree.

use std::collections::HashSet;

use crate::config::{AlgorithmConfig, CaseSensitivity, PreprocessingMode};
use crate::kernels::simd::{self, ASCII_BINS};
use crate::multiset::Multiset;
use crate::tokenize::tokenize;
use crate::unicode::{fold_char, UnicodeText};

/// Scale factor carrying real distances over an integer transport.
pub const DISTANCE_SCALE: f64 = 1000.0;

#[inline]
pub(crate) fn quantize(distance: f64) -> u32 {
    (distance * DISTANCE_SCALE).round() as u32
}

fn token_multiset(text: &UnicodeText, config: &AlgorithmConfig) -> Multiset<String> {
    tokenize(text, config)
        .into_iter()
        .map(|token| token.as_str().to_owned())
        .collect()
}

// ============================================================================
// Cosine
// ============================================================================

/// Cosine similarity in [0, 1].
pub fn cosine_similarity(s1: &UnicodeText, s2: &UnicodeText, config: &AlgorithmConfig) -> f64 {
    if config.preprocessing == PreprocessingMode::Character {
        if s1.is_ascii() && s2.is_ascii() {
            return ascii_frequency_cosine(s1.as_str(), s2.as_str(), config.case_sensitivity);
        }
        return character_presence_cosine(s1, s2, config.case_sensitivity);
    }

    let vector1 = token_multiset(s1, config);
    let vector2 = token_multiset(s2, config);

    if vector1.is_empty() && vector2.is_empty() {
        return 1.0;
    }
    if vector1.is_empty() || vector2.is_empty() {
        return 0.0;
    }

    // Identical frequency maps short-circuit, avoiding float round-off on
    // the exact-match case.
    if vector1 == vector2 {
        return 1.0;
    }

    let magnitude1 = vector1.magnitude();
    let magnitude2 = vector2.magnitude();
    if magnitude1 == 0.0 || magnitude2 == 0.0 {
        return 0.0;
    }

    (vector1.dot_product(&vector2) / (magnitude1 * magnitude2)).clamp(0.0, 1.0)
}

/// Cosine distance, quantized: `round((1 - similarity) * 1000)`.
pub fn cosine_distance(s1: &UnicodeText, s2: &UnicodeText, config: &AlgorithmConfig) -> u32 {
    quantize(1.0 - cosine_similarity(s1, s2, config))
}

/// Byte-frequency cosine over pure-ASCII inputs.
fn ascii_frequency_cosine(s1: &str, s2: &str, case: CaseSensitivity) -> f64 {
    if s1.is_empty() && s2.is_empty() {
        return 1.0;
    }
    if s1.is_empty() || s2.is_empty() {
        return 0.0;
    }

    let mut freq1 = byte_frequencies(s1);
    let mut freq2 = byte_frequencies(s2);

    if case == CaseSensitivity::Insensitive {
        fold_upper_bins(&mut freq1);
        fold_upper_bins(&mut freq2);
    }

    let (dot, mag1_sq, mag2_sq) = simd::accumulate(&freq1, &freq2);

    let denominator = (mag1_sq * mag2_sq).sqrt();
    if denominator == 0.0 {
        return 0.0;
    }
    (dot / denominator).clamp(0.0, 1.0)
}

fn byte_frequencies(s: &str) -> [u32; ASCII_BINS] {
    let mut bins = [0u32; ASCII_BINS];
    for b in s.bytes() {
        bins[b as usize] += 1;
    }
    bins
}

/// Merge `A-Z` bins into `a-z` for case-insensitive comparison.
fn fold_upper_bins(bins: &mut [u32; ASCII_BINS]) {
    for upper in b'A'..=b'Z' {
        bins[(upper + 32) as usize] += bins[upper as usize];
        bins[upper as usize] = 0;
    }
}

/// Presence-vector cosine over distinct code points.
fn character_presence_cosine(s1: &UnicodeText, s2: &UnicodeText, case: CaseSensitivity) -> f64 {
    if s1.is_empty() && s2.is_empty() {
        return 1.0;
    }
    if s1.is_empty() || s2.is_empty() {
        return 0.0;
    }

    let distinct = |text: &UnicodeText| -> HashSet<char> {
        text.chars()
            .iter()
            .map(|&c| {
                if case == CaseSensitivity::Insensitive {
                    fold_char(c)
                } else {
                    c
                }
            })
            .collect()
    };

    let chars1 = distinct(s1);
    let chars2 = distinct(s2);

    let (smaller, larger) = if chars1.len() <= chars2.len() {
        (&chars1, &chars2)
    } else {
        (&chars2, &chars1)
    };
    let intersection = smaller.iter().filter(|c| larger.contains(c)).count();

    let denominator = ((chars1.len() as f64) * (chars2.len() as f64)).sqrt();
    if denominator == 0.0 {
        return 0.0;
    }
    intersection as f64 / denominator
}

// ============================================================================
// Lp distances
// ============================================================================

fn lp_vectors(
    s1: &UnicodeText,
    s2: &UnicodeText,
    config: &AlgorithmConfig,
) -> (Multiset<String>, Multiset<String>) {
    (token_multiset(s1, config), token_multiset(s2, config))
}

/// L2 distance over the union of keys, quantized.
pub fn euclidean_distance(s1: &UnicodeText, s2: &UnicodeText, config: &AlgorithmConfig) -> u32 {
    let (vector1, vector2) = lp_vectors(s1, s2, config);
    let sum_squared: f64 = vector1
        .union_of_keys(&vector2)
        .map(|term| {
            let difference = f64::from(vector1.count(term)) - f64::from(vector2.count(term));
            difference * difference
        })
        .sum();
    quantize(sum_squared.sqrt())
}

/// Euclidean similarity: `exp(-d)` over the quantized distance.
pub fn euclidean_similarity(s1: &UnicodeText, s2: &UnicodeText, config: &AlgorithmConfig) -> f64 {
    if let Some(similarity) = empty_rule(s1, s2, config) {
        return similarity;
    }
    let distance = f64::from(euclidean_distance(s1, s2, config)) / DISTANCE_SCALE;
    (-distance).exp()
}

/// L1 distance over the union of keys, quantized.
pub fn manhattan_distance(s1: &UnicodeText, s2: &UnicodeText, config: &AlgorithmConfig) -> u32 {
    let (vector1, vector2) = lp_vectors(s1, s2, config);
    let sum_absolute: f64 = vector1
        .union_of_keys(&vector2)
        .map(|term| (f64::from(vector1.count(term)) - f64::from(vector2.count(term))).abs())
        .sum();
    quantize(sum_absolute)
}

/// Manhattan similarity: `1 / (1 + d)` over the quantized distance.
pub fn manhattan_similarity(s1: &UnicodeText, s2: &UnicodeText, config: &AlgorithmConfig) -> f64 {
    if let Some(similarity) = empty_rule(s1, s2, config) {
        return similarity;
    }
    let distance = f64::from(manhattan_distance(s1, s2, config)) / DISTANCE_SCALE;
    1.0 / (1.0 + distance)
}

/// L-infinity distance over the union of keys, quantized.
pub fn chebyshev_distance(s1: &UnicodeText, s2: &UnicodeText, config: &AlgorithmConfig) -> u32 {
    let (vector1, vector2) = lp_vectors(s1, s2, config);
    let max_difference = vector1
        .union_of_keys(&vector2)
        .map(|term| (f64::from(vector1.count(term)) - f64::from(vector2.count(term))).abs())
        .fold(0.0f64, f64::max);
    quantize(max_difference)
}

/// Chebyshev similarity: `exp(-d)` over the quantized distance.
pub fn chebyshev_similarity(s1: &UnicodeText, s2: &UnicodeText, config: &AlgorithmConfig) -> f64 {
    if let Some(similarity) = empty_rule(s1, s2, config) {
        return similarity;
    }
    let distance = f64::from(chebyshev_distance(s1, s2, config)) / DISTANCE_SCALE;
    (-distance).exp()
}

/// Shared empty-bag rule: 1.0 when both token bags are empty, 0.0 when
/// exactly one is.
fn empty_rule(s1: &UnicodeText, s2: &UnicodeText, config: &AlgorithmConfig) -> Option<f64> {
    let empty1 = tokenize(s1, config).is_empty();
    let empty2 = tokenize(s2, config).is_empty();
    match (empty1, empty2) {
        (true, true) => Some(1.0),
        (true, false) | (false, true) => Some(0.0),
        (false, false) => None,
    }
}
