//! Alignment kernels: Jaro and Jaro-Winkler.
//!
//! Matching window is `max(|s1|, |s2|) / 2 - 1`, clamped to zero; a zero
//! window means only same-index code points can match. Transpositions are
//! counted over the matched positions in order and halved.

use crate::config::{
    AlgorithmConfig, DEFAULT_PREFIX_LENGTH, DEFAULT_PREFIX_WEIGHT, DEFAULT_WINKLER_THRESHOLD,
};
use crate::unicode::{chars_equal, UnicodeText};

/// Jaro similarity in [0, 1].
pub fn jaro_similarity(s1: &UnicodeText, s2: &UnicodeText, config: &AlgorithmConfig) -> f64 {
    let a = s1.chars();
    let b = s2.chars();
    let len1 = a.len();
    let len2 = b.len();

    if len1 == 0 && len2 == 0 {
        return 1.0;
    }
    if len1 == 0 || len2 == 0 {
        return 0.0;
    }

    let case_sensitive = config.case_sensitivity.is_sensitive();
    let window = (len1.max(len2) / 2).saturating_sub(1);

    let mut s1_matches = vec![false; len1];
    let mut s2_matches = vec![false; len2];
    let mut matches = 0usize;

    for i in 0..len1 {
        let low = i.saturating_sub(window);
        let high = (i + window).min(len2 - 1);

        for j in low..=high {
            if s2_matches[j] || !chars_equal(a[i], b[j], case_sensitive) {
                continue;
            }
            s1_matches[i] = true;
            s2_matches[j] = true;
            matches += 1;
            break;
        }
    }

    if matches == 0 {
        return 0.0;
    }

    // Walk matched positions of both strings in order; every disagreement is
    // half a transposition.
    let mut transpositions = 0usize;
    let mut k = 0usize;
    for i in 0..len1 {
        if !s1_matches[i] {
            continue;
        }
        while k < len2 && !s2_matches[k] {
            k += 1;
        }
        if k < len2 {
            if !chars_equal(a[i], b[k], case_sensitive) {
                transpositions += 1;
            }
            k += 1;
        }
    }
    let transpositions = transpositions / 2;

    let m = matches as f64;
    let jaro = (m / len1 as f64 + m / len2 as f64 + (m - transpositions as f64) / m) / 3.0;
    jaro.clamp(0.0, 1.0)
}

/// Jaro-Winkler similarity: Jaro plus a common-prefix bonus, applied only
/// when Jaro reaches the activation threshold (0.7 by default).
pub fn jaro_winkler_similarity(s1: &UnicodeText, s2: &UnicodeText, config: &AlgorithmConfig) -> f64 {
    let jaro = jaro_similarity(s1, s2, config);

    let threshold = config.threshold.unwrap_or(DEFAULT_WINKLER_THRESHOLD);
    if jaro < threshold {
        return jaro;
    }

    let prefix = common_prefix_length(s1, s2, config);
    if prefix == 0 {
        return jaro;
    }

    let weight = config
        .prefix_weight
        .unwrap_or(DEFAULT_PREFIX_WEIGHT)
        .clamp(0.0, 0.25);

    (jaro + prefix as f64 * weight * (1.0 - jaro)).clamp(0.0, 1.0)
}

/// Common prefix under the configured case mode, capped at
/// `min(|s1|, |s2|, prefix_length)`.
fn common_prefix_length(s1: &UnicodeText, s2: &UnicodeText, config: &AlgorithmConfig) -> usize {
    let cap = config.prefix_length.unwrap_or(DEFAULT_PREFIX_LENGTH) as usize;
    let case_sensitive = config.case_sensitivity.is_sensitive();

    s1.chars()
        .iter()
        .zip(s2.chars().iter())
        .take(cap)
        .take_while(|&(&c1, &c2)| chars_equal(c1, c2, case_sensitive))
        .count()
}
