//! Algorithm kernels and the tag -> kernel dispatch.
//!
//! Kernels are pure functions of `(text, text, config)` plus an arena for
//! DP scratch. The engine owns all shared state; nothing here locks.

pub mod alignment;
pub mod edit;
pub mod simd;
pub mod token;
pub mod vector;

use crate::config::{AlgorithmConfig, AlgorithmType};
use crate::error::Result;
use crate::pool::MemoryPool;
use crate::unicode::UnicodeText;

/// Normalized similarity in [0, 1] for the configured algorithm.
pub fn compute_similarity(
    s1: &UnicodeText,
    s2: &UnicodeText,
    config: &AlgorithmConfig,
    pool: &MemoryPool,
) -> Result<f64> {
    match config.algorithm {
        AlgorithmType::Levenshtein => edit::levenshtein_similarity(s1, s2, config, pool),
        AlgorithmType::DamerauLevenshtein => {
            edit::damerau_levenshtein_similarity(s1, s2, config, pool)
        }
        AlgorithmType::Hamming => edit::hamming_similarity(s1, s2, config),
        AlgorithmType::Jaro => Ok(alignment::jaro_similarity(s1, s2, config)),
        AlgorithmType::JaroWinkler => Ok(alignment::jaro_winkler_similarity(s1, s2, config)),
        AlgorithmType::Jaccard => Ok(token::jaccard_similarity(s1, s2, config)),
        AlgorithmType::SorensenDice => Ok(token::dice_similarity(s1, s2, config)),
        AlgorithmType::Overlap => Ok(token::overlap_similarity(s1, s2, config)),
        AlgorithmType::Tversky => token::tversky_similarity(s1, s2, config),
        AlgorithmType::Cosine => Ok(vector::cosine_similarity(s1, s2, config)),
        AlgorithmType::Euclidean => Ok(vector::euclidean_similarity(s1, s2, config)),
        AlgorithmType::Manhattan => Ok(vector::manhattan_similarity(s1, s2, config)),
        AlgorithmType::Chebyshev => Ok(vector::chebyshev_similarity(s1, s2, config)),
    }
}

/// Non-negative integer distance for the configured algorithm.
///
/// Edit kernels report exact edit counts. Every normalized kernel reports
/// `round((1 - similarity) * 1000)`; the Lp kernels report their real
/// distance scaled the same way.
pub fn compute_distance(
    s1: &UnicodeText,
    s2: &UnicodeText,
    config: &AlgorithmConfig,
    pool: &MemoryPool,
) -> Result<u32> {
    match config.algorithm {
        AlgorithmType::Levenshtein => edit::levenshtein_distance(s1, s2, config, pool),
        AlgorithmType::DamerauLevenshtein => {
            edit::damerau_levenshtein_distance(s1, s2, config, pool)
        }
        AlgorithmType::Hamming => edit::hamming_distance(s1, s2, config),
        AlgorithmType::Jaro => {
            Ok(vector::quantize(1.0 - alignment::jaro_similarity(s1, s2, config)))
        }
        AlgorithmType::JaroWinkler => Ok(vector::quantize(
            1.0 - alignment::jaro_winkler_similarity(s1, s2, config),
        )),
        AlgorithmType::Jaccard => {
            Ok(vector::quantize(1.0 - token::jaccard_similarity(s1, s2, config)))
        }
        AlgorithmType::SorensenDice => {
            Ok(vector::quantize(1.0 - token::dice_similarity(s1, s2, config)))
        }
        AlgorithmType::Overlap => {
            Ok(vector::quantize(1.0 - token::overlap_similarity(s1, s2, config)))
        }
        AlgorithmType::Tversky => {
            let similarity = token::tversky_similarity(s1, s2, config)?;
            Ok(vector::quantize(1.0 - similarity))
        }
        AlgorithmType::Cosine => Ok(vector::cosine_distance(s1, s2, config)),
        AlgorithmType::Euclidean => Ok(vector::euclidean_distance(s1, s2, config)),
        AlgorithmType::Manhattan => Ok(vector::manhattan_distance(s1, s2, config)),
        AlgorithmType::Chebyshev => Ok(vector::chebyshev_distance(s1, s2, config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_for(algorithm: AlgorithmType) -> AlgorithmConfig {
        let mut config = AlgorithmConfig {
            algorithm,
            ..Default::default()
        };
        if algorithm == AlgorithmType::Tversky {
            config.alpha = Some(0.5);
            config.beta = Some(0.5);
        }
        config
    }

    #[test]
    fn test_similarity_range_and_identity_across_kernels() {
        let pool = MemoryPool::new();
        for algorithm in AlgorithmType::ALL {
            let config = config_for(algorithm);
            let identical =
                compute_similarity(&"abcd".into(), &"abcd".into(), &config, &pool).unwrap();
            assert_eq!(identical, 1.0, "{algorithm} identity");

            let similar =
                compute_similarity(&"abcd".into(), &"abce".into(), &config, &pool).unwrap();
            assert!(
                (0.0..=1.0).contains(&similar),
                "{algorithm} out of range: {similar}"
            );
        }
    }

    #[test]
    fn test_distance_zero_on_identity_across_kernels() {
        let pool = MemoryPool::new();
        for algorithm in AlgorithmType::ALL {
            let config = config_for(algorithm);
            let distance =
                compute_distance(&"abcd".into(), &"abcd".into(), &config, &pool).unwrap();
            assert_eq!(distance, 0, "{algorithm} self-distance");
        }
    }

    #[test]
    fn test_symmetry_of_symmetric_kernels() {
        let pool = MemoryPool::new();
        for algorithm in AlgorithmType::ALL {
            if algorithm == AlgorithmType::Hamming {
                // Requires equal lengths; covered in the edit kernel tests
                continue;
            }
            let config = config_for(algorithm);
            let forward =
                compute_similarity(&"kitten".into(), &"sitting".into(), &config, &pool).unwrap();
            let backward =
                compute_similarity(&"sitting".into(), &"kitten".into(), &config, &pool).unwrap();
            assert_eq!(forward, backward, "{algorithm} symmetry");
        }
    }
}
