//! Token-set kernels: Jaccard, Sorensen-Dice, Overlap and Tversky.
//!
//! All four tokenize both inputs per the configuration and compare token
//! bags. Jaccard deduplicates tokens under Word preprocessing (set
//! semantics) and respects counts otherwise (multiset semantics); the other
//! three always use multisets. Every kernel returns 1.0 when both inputs
//! reduce to empty token bags and 0.0 when exactly one does.

use std::collections::HashSet;

use crate::config::{AlgorithmConfig, PreprocessingMode};
use crate::error::{Result, SimilarityError};
use crate::multiset::Multiset;
use crate::tokenize::tokenize;
use crate::unicode::UnicodeText;

/// Token counts keyed by the token's code-point sequence.
fn token_multiset(text: &UnicodeText, config: &AlgorithmConfig) -> Multiset<String> {
    tokenize(text, config)
        .into_iter()
        .map(|token| token.as_str().to_owned())
        .collect()
}

/// Deduplicated tokens, for set-semantics Jaccard.
fn token_set(text: &UnicodeText, config: &AlgorithmConfig) -> HashSet<String> {
    tokenize(text, config)
        .into_iter()
        .map(|token| token.as_str().to_owned())
        .collect()
}

/// Jaccard similarity.
///
/// Word preprocessing compares deduplicated token sets
/// (`|A ∩ B| / |A ∪ B|`); every other mode compares multisets
/// (`total(min) / total(max)`).
pub fn jaccard_similarity(s1: &UnicodeText, s2: &UnicodeText, config: &AlgorithmConfig) -> f64 {
    if config.preprocessing == PreprocessingMode::Word {
        let set1 = token_set(s1, config);
        let set2 = token_set(s2, config);

        if set1.is_empty() && set2.is_empty() {
            return 1.0;
        }
        if set1.is_empty() || set2.is_empty() {
            return 0.0;
        }

        let intersection = set1.intersection(&set2).count();
        let union = set1.len() + set2.len() - intersection;
        if union == 0 {
            return 0.0;
        }
        return intersection as f64 / union as f64;
    }

    let counter1 = token_multiset(s1, config);
    let counter2 = token_multiset(s2, config);

    if counter1.is_empty() && counter2.is_empty() {
        return 1.0;
    }
    if counter1.is_empty() || counter2.is_empty() {
        return 0.0;
    }

    let intersection = counter1.intersect(&counter2).total_count();
    let union = counter1.union_with(&counter2).total_count();
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

/// Sorensen-Dice similarity: `2·total(min) / (total(A) + total(B))`.
pub fn dice_similarity(s1: &UnicodeText, s2: &UnicodeText, config: &AlgorithmConfig) -> f64 {
    let counter1 = token_multiset(s1, config);
    let counter2 = token_multiset(s2, config);

    if counter1.is_empty() && counter2.is_empty() {
        return 1.0;
    }
    if counter1.is_empty() || counter2.is_empty() {
        return 0.0;
    }

    let intersection = counter1.intersect(&counter2).total_count();
    let total = counter1.total_count() + counter2.total_count();
    if total == 0 {
        return 0.0;
    }
    2.0 * intersection as f64 / total as f64
}

/// Overlap coefficient: `total(min) / min(total(A), total(B))`.
pub fn overlap_similarity(s1: &UnicodeText, s2: &UnicodeText, config: &AlgorithmConfig) -> f64 {
    let counter1 = token_multiset(s1, config);
    let counter2 = token_multiset(s2, config);

    if counter1.is_empty() && counter2.is_empty() {
        return 1.0;
    }
    if counter1.is_empty() || counter2.is_empty() {
        return 0.0;
    }

    let intersection = counter1.intersect(&counter2).total_count();
    let smaller = counter1.total_count().min(counter2.total_count());
    if smaller == 0 {
        return 0.0;
    }
    intersection as f64 / smaller as f64
}

/// Tversky index: `c / (c + α·|A−B| + β·|B−A|)` over token counts.
///
/// Requires `alpha` and `beta` in the configuration. With `α = β = 0.5` the
/// index collapses to Sorensen-Dice; with `α = β = 1` to (set) Jaccard.
pub fn tversky_similarity(
    s1: &UnicodeText,
    s2: &UnicodeText,
    config: &AlgorithmConfig,
) -> Result<f64> {
    let (alpha, beta) = match (config.alpha, config.beta) {
        (Some(alpha), Some(beta)) => (alpha, beta),
        _ => {
            return Err(SimilarityError::InvalidConfiguration(
                "Tversky algorithm requires alpha and beta parameters".into(),
            ));
        }
    };

    let counter1 = token_multiset(s1, config);
    let counter2 = token_multiset(s2, config);

    if counter1.is_empty() && counter2.is_empty() {
        return Ok(1.0);
    }
    if counter1.is_empty() || counter2.is_empty() {
        return Ok(0.0);
    }

    let intersection = counter1.intersect(&counter2).total_count() as f64;
    let only_first = counter1.total_count() as f64 - intersection;
    let only_second = counter2.total_count() as f64 - intersection;

    let denominator = intersection + alpha * only_first + beta * only_second;
    if denominator == 0.0 {
        return Ok(0.0);
    }
    Ok(intersection / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(mode: PreprocessingMode, n: u32) -> AlgorithmConfig {
        AlgorithmConfig {
            preprocessing: mode,
            ngram_size: n,
            ..Default::default()
        }
    }

    #[test]
    fn test_jaccard_word_mode_uses_sets() {
        let config = config_with(PreprocessingMode::Word, 2);
        let sim = jaccard_similarity(&"hello world".into(), &"world hello".into(), &config);
        assert_eq!(sim, 1.0);

        // Repeated words collapse under set semantics
        let sim = jaccard_similarity(&"the the cat".into(), &"the cat".into(), &config);
        assert_eq!(sim, 1.0);

        let sim = jaccard_similarity(&"alpha beta".into(), &"beta gamma".into(), &config);
        assert!((sim - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_jaccard_character_mode_uses_multisets() {
        let config = config_with(PreprocessingMode::Character, 2);
        // Counts matter: {a:2, b:1} vs {a:1, b:1}
        let sim = jaccard_similarity(&"aab".into(), &"ab".into(), &config);
        assert!((sim - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_jaccard_ngram_mode() {
        let config = config_with(PreprocessingMode::NGram, 2);
        // Bigrams: {he, el, ll, lo} vs {ha, al, ll, lo}
        let sim = jaccard_similarity(&"hello".into(), &"hallo".into(), &config);
        assert!((sim - 2.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_rules_apply_to_all_kernels() {
        let config = config_with(PreprocessingMode::Character, 2);
        let tversky_config = AlgorithmConfig {
            alpha: Some(0.5),
            beta: Some(0.5),
            ..config.clone()
        };

        assert_eq!(jaccard_similarity(&"".into(), &"".into(), &config), 1.0);
        assert_eq!(dice_similarity(&"".into(), &"".into(), &config), 1.0);
        assert_eq!(overlap_similarity(&"".into(), &"".into(), &config), 1.0);
        assert_eq!(
            tversky_similarity(&"".into(), &"".into(), &tversky_config).unwrap(),
            1.0
        );

        assert_eq!(jaccard_similarity(&"abc".into(), &"".into(), &config), 0.0);
        assert_eq!(dice_similarity(&"abc".into(), &"".into(), &config), 0.0);
        assert_eq!(overlap_similarity(&"".into(), &"abc".into(), &config), 0.0);
        assert_eq!(
            tversky_similarity(&"abc".into(), &"".into(), &tversky_config).unwrap(),
            0.0
        );
    }

    #[test]
    fn test_dice_on_bigrams() {
        let config = config_with(PreprocessingMode::NGram, 2);
        let sim = dice_similarity(&"hello".into(), &"hallo".into(), &config);
        assert!((sim - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_overlap_subset_is_one() {
        let config = config_with(PreprocessingMode::Character, 2);
        let sim = overlap_similarity(&"abc".into(), &"abcdef".into(), &config);
        assert_eq!(sim, 1.0);
    }

    #[test]
    fn test_tversky_requires_parameters() {
        let config = config_with(PreprocessingMode::NGram, 2);
        let result = tversky_similarity(&"hello".into(), &"hallo".into(), &config);
        assert!(matches!(
            result,
            Err(SimilarityError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_tversky_half_half_collapses_to_dice() {
        let base = config_with(PreprocessingMode::NGram, 2);
        let tversky_config = AlgorithmConfig {
            alpha: Some(0.5),
            beta: Some(0.5),
            ..base.clone()
        };

        let tversky = tversky_similarity(&"hello".into(), &"hallo".into(), &tversky_config).unwrap();
        let dice = dice_similarity(&"hello".into(), &"hallo".into(), &base);
        assert!((tversky - dice).abs() < 1e-12);
    }

    #[test]
    fn test_tversky_is_asymmetric_when_weights_differ() {
        let config = AlgorithmConfig {
            preprocessing: PreprocessingMode::Character,
            alpha: Some(0.9),
            beta: Some(0.1),
            ..Default::default()
        };
        let forward = tversky_similarity(&"abcd".into(), &"ab".into(), &config).unwrap();
        let backward = tversky_similarity(&"ab".into(), &"abcd".into(), &config).unwrap();
        assert!(forward != backward);
    }
}
