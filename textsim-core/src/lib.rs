//! Textsim Core - Unicode string similarity engine
//!
//! Thirteen similarity and distance algorithms in three families behind one
//! configuration model:
//!
//! - **Edit-based**: Levenshtein, Damerau-Levenshtein (OSA), Hamming
//! - **Alignment-based**: Jaro, Jaro-Winkler
//! - **Set/vector-based**: Jaccard, Sorensen-Dice, Overlap, Tversky,
//!   Cosine, Euclidean, Manhattan, Chebyshev
//!
//! Design principles:
//!
//! - **Code points everywhere**: comparisons operate on decoded code points,
//!   with exact byte-level fast paths for pure-ASCII input
//! - **Pure kernels**: algorithms are functions of `(text, text, config)`;
//!   only the engine holds shared state
//! - **Arena allocation**: per-call bumpalo arenas back the DP scratch of
//!   the edit kernels
//! - **Uniform errors**: every fallible path reports one of five error
//!   kinds; kernels never panic
//!
//! ```
//! use textsim_core::{AlgorithmType, SimilarityEngine};
//!
//! let engine = SimilarityEngine::new();
//! let sim = engine
//!     .similarity("kitten", "sitting", AlgorithmType::Levenshtein, None)
//!     .unwrap();
//! assert!((sim - (1.0 - 3.0 / 7.0)).abs() < 1e-9);
//!
//! let dist = engine
//!     .distance("kitten", "sitting", AlgorithmType::Levenshtein, None)
//!     .unwrap();
//! assert_eq!(dist, 3);
//! ```

#![warn(clippy::clone_on_ref_ptr)]
#![warn(clippy::unnecessary_to_owned)]

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod kernels;
pub mod multiset;
pub mod pool;
pub mod tokenize;
pub mod unicode;
pub mod wire;

pub use cache::{ResultCache, CACHE_TTL, MAX_CACHE_ENTRIES};
pub use config::{
    merge_config, AlgorithmConfig, AlgorithmType, CaseSensitivity, ConfigPatch, PreprocessingMode,
    DEFAULT_MAX_STRING_LENGTH, DEFAULT_NGRAM_SIZE,
};
pub use engine::SimilarityEngine;
pub use error::{Result, SimilarityError};
pub use executor::AsyncExecutor;
pub use multiset::Multiset;
pub use pool::MemoryPool;
pub use tokenize::tokenize;
pub use unicode::{chars_equal, fold_char, UnicodeText};
pub use wire::{
    algorithm_name, parse_algorithm_type, supported_algorithms, AlgorithmInfo, DistanceResponse,
    SimilarityResponse, WireConfig, WireError,
};
