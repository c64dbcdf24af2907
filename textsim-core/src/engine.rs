//! Similarity engine: configuration merge, dispatch, caching and the async
//! entry points.
//!
//! The engine is the only stateful component. Kernels stay pure; shared
//! state is limited to the layered configuration (reader/writer lock), the
//! result cache (one exclusive lock) and the worker pool. Configuration is
//! copied into every call, so a concurrent reconfiguration never mutates an
//! in-flight computation.
//!
//! Dispatch order for one call:
//! 1. merge configuration layers (global, per-algorithm, per-call, then the
//!    `algorithm` parameter),
//! 2. gate both inputs against the merged maximum string length,
//! 3. validate the merged configuration,
//! 4. probe the similarity cache,
//! 5. decode, take the early answers (empty, equal, case-folded equal),
//! 6. run the kernel and write the cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::cache::{fingerprint, ResultCache};
use crate::config::{merge_config, AlgorithmConfig, AlgorithmType, CaseSensitivity, ConfigPatch};
use crate::error::{Result, SimilarityError};
use crate::executor::AsyncExecutor;
use crate::kernels;
use crate::pool::MemoryPool;
use crate::unicode::UnicodeText;

/// Relaxed operation counters, read for introspection.
#[derive(Debug, Default)]
struct EngineMetrics {
    total_operations: AtomicU64,
    cache_hits: AtomicU64,
}

/// Layered configuration: the global base plus per-algorithm overlays.
#[derive(Debug, Default)]
struct ConfigurationState {
    global: AlgorithmConfig,
    per_algorithm: HashMap<AlgorithmType, ConfigPatch>,
}

/// The similarity engine.
///
/// Cheap to share behind an `Arc`; every entry point takes `&self`.
pub struct SimilarityEngine {
    config: RwLock<ConfigurationState>,
    cache: Mutex<ResultCache>,
    executor: Arc<AsyncExecutor>,
    metrics: EngineMetrics,
}

impl Default for SimilarityEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SimilarityEngine {
    /// Engine with a worker pool sized to the logical core count.
    pub fn new() -> Self {
        Self::with_worker_threads(crate::executor::default_worker_count())
    }

    pub fn with_worker_threads(count: usize) -> Self {
        Self {
            config: RwLock::new(ConfigurationState::default()),
            cache: Mutex::new(ResultCache::new()),
            executor: Arc::new(AsyncExecutor::with_threads(count)),
            metrics: EngineMetrics::default(),
        }
    }

    // ------------------------------------------------------------------
    // Synchronous entry points
    // ------------------------------------------------------------------

    /// Normalized similarity in [0, 1].
    pub fn similarity(
        &self,
        s1: &str,
        s2: &str,
        algorithm: AlgorithmType,
        patch: Option<&ConfigPatch>,
    ) -> Result<f64> {
        self.metrics.total_operations.fetch_add(1, Ordering::Relaxed);

        let config = self.merged_config(algorithm, patch);
        check_input_sizes(s1, s2, &config)?;
        config.validate()?;

        let key = fingerprint(
            config.algorithm.tag(),
            config.preprocessing.tag(),
            config.case_sensitivity.tag(),
            config.ngram_size,
            s1,
            s2,
        );
        if let Some(cached) = self.cache.lock().get(&key) {
            self.metrics.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(cached);
        }

        let value = compute_similarity_with(s1, s2, &config)?;
        self.cache.lock().insert(key, value);
        Ok(value)
    }

    /// Non-negative integer distance. Edit kernels report edit counts;
    /// normalized and Lp kernels report `round(d * 1000)`.
    pub fn distance(
        &self,
        s1: &str,
        s2: &str,
        algorithm: AlgorithmType,
        patch: Option<&ConfigPatch>,
    ) -> Result<u32> {
        self.metrics.total_operations.fetch_add(1, Ordering::Relaxed);

        let config = self.merged_config(algorithm, patch);
        check_input_sizes(s1, s2, &config)?;
        config.validate()?;

        compute_distance_with(s1, s2, &config)
    }

    /// Per-pair similarities, order-preserving; a failed pair does not
    /// abort the rest.
    pub fn similarity_batch<S: AsRef<str>>(
        &self,
        pairs: &[(S, S)],
        algorithm: AlgorithmType,
        patch: Option<&ConfigPatch>,
    ) -> Vec<Result<f64>> {
        pairs
            .iter()
            .map(|(s1, s2)| self.similarity(s1.as_ref(), s2.as_ref(), algorithm, patch))
            .collect()
    }

    // ------------------------------------------------------------------
    // Asynchronous entry points
    // ------------------------------------------------------------------

    /// Similarity computed on the worker pool; the outcome is delivered
    /// exactly once. Runs the kernel directly, bypassing the cache.
    pub async fn similarity_async(
        &self,
        s1: &str,
        s2: &str,
        algorithm: AlgorithmType,
        patch: Option<&ConfigPatch>,
    ) -> Result<f64> {
        self.metrics.total_operations.fetch_add(1, Ordering::Relaxed);

        let config = self.merged_config(algorithm, patch);
        check_input_sizes(s1, s2, &config)?;
        config.validate()?;

        let s1 = s1.to_owned();
        let s2 = s2.to_owned();
        let receiver = self
            .executor
            .submit(move || compute_similarity_with(&s1, &s2, &config));

        match receiver.await {
            Ok(result) => result,
            Err(_) => Err(completion_lost(&self.executor)),
        }
    }

    /// Distance computed on the worker pool.
    pub async fn distance_async(
        &self,
        s1: &str,
        s2: &str,
        algorithm: AlgorithmType,
        patch: Option<&ConfigPatch>,
    ) -> Result<u32> {
        self.metrics.total_operations.fetch_add(1, Ordering::Relaxed);

        let config = self.merged_config(algorithm, patch);
        check_input_sizes(s1, s2, &config)?;
        config.validate()?;

        let s1 = s1.to_owned();
        let s2 = s2.to_owned();
        let receiver = self
            .executor
            .submit(move || compute_distance_with(&s1, &s2, &config));

        match receiver.await {
            Ok(result) => result,
            Err(_) => Err(completion_lost(&self.executor)),
        }
    }

    /// Whole batch fanned out across the worker pool; per-pair order is
    /// preserved in the returned sequence.
    pub async fn similarity_batch_async<S: AsRef<str>>(
        &self,
        pairs: &[(S, S)],
        algorithm: AlgorithmType,
        patch: Option<&ConfigPatch>,
    ) -> Vec<Result<f64>> {
        let config = self.merged_config(algorithm, patch);

        let submissions: Vec<_> = pairs
            .iter()
            .map(|(s1, s2)| {
                self.metrics.total_operations.fetch_add(1, Ordering::Relaxed);
                let s1 = s1.as_ref();
                let s2 = s2.as_ref();

                check_input_sizes(s1, s2, &config)?;
                config.validate()?;

                let s1 = s1.to_owned();
                let s2 = s2.to_owned();
                let job_config = config.clone();
                Ok(self
                    .executor
                    .submit(move || compute_similarity_with(&s1, &s2, &job_config)))
            })
            .collect();

        let mut results = Vec::with_capacity(submissions.len());
        for submission in submissions {
            let result = match submission {
                Err(error) => Err(error),
                Ok(receiver) => match receiver.await {
                    Ok(result) => result,
                    Err(_) => Err(completion_lost(&self.executor)),
                },
            };
            results.push(result);
        }
        results
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Replace the global configuration. Validates first, then swaps and
    /// invalidates the cache.
    pub fn set_global_config(&self, config: AlgorithmConfig) -> Result<()> {
        config.validate()?;
        {
            let mut state = self.config.write();
            state.global = config;
        }
        self.cache.lock().clear();
        info!("global configuration updated, cache invalidated");
        Ok(())
    }

    /// Copy of the current global configuration.
    pub fn get_global_config(&self) -> AlgorithmConfig {
        self.config.read().global.clone()
    }

    /// Install a per-algorithm overlay, applied between the global base and
    /// any per-call patch.
    pub fn set_algorithm_config(&self, algorithm: AlgorithmType, patch: ConfigPatch) {
        {
            let mut state = self.config.write();
            state.per_algorithm.insert(algorithm, patch);
        }
        self.cache.lock().clear();
        debug!(%algorithm, "per-algorithm configuration updated, cache invalidated");
    }

    /// Resolved configuration for an algorithm (global plus its overlay).
    pub fn get_algorithm_config(&self, algorithm: AlgorithmType) -> AlgorithmConfig {
        let state = self.config.read();
        merge_config(&state.global, state.per_algorithm.get(&algorithm), None, algorithm)
    }

    /// Drop every overlay and restore the default global configuration.
    pub fn reset_to_defaults(&self) {
        {
            let mut state = self.config.write();
            state.global = AlgorithmConfig::default();
            state.per_algorithm.clear();
        }
        self.cache.lock().clear();
        info!("configuration reset to defaults");
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// Every algorithm the engine dispatches to, in tag order.
    pub fn supported_algorithms(&self) -> &'static [AlgorithmType] {
        &AlgorithmType::ALL
    }

    /// Estimated bytes held by the result cache.
    pub fn memory_usage(&self) -> usize {
        self.cache.lock().memory_usage()
    }

    /// Drop every cached result.
    pub fn clear_caches(&self) {
        self.cache.lock().clear();
    }

    /// Total similarity/distance operations since construction.
    pub fn total_operations(&self) -> u64 {
        self.metrics.total_operations.load(Ordering::Relaxed)
    }

    /// Cache hits since construction.
    pub fn cache_hits(&self) -> u64 {
        self.metrics.cache_hits.load(Ordering::Relaxed)
    }

    /// Stop the worker pool and drop cached results. Runs on drop too;
    /// calling it twice is harmless.
    pub fn shutdown(&self) {
        self.executor.shutdown();
        self.cache.lock().clear();
    }

    fn merged_config(
        &self,
        algorithm: AlgorithmType,
        call_patch: Option<&ConfigPatch>,
    ) -> AlgorithmConfig {
        let state = self.config.read();
        merge_config(
            &state.global,
            state.per_algorithm.get(&algorithm),
            call_patch,
            algorithm,
        )
    }
}

impl Drop for SimilarityEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ============================================================================
// Call pipeline
// ============================================================================

/// A completion port closed without a value: a shutdown race in the normal
/// case, an abandoned worker otherwise.
fn completion_lost(executor: &AsyncExecutor) -> SimilarityError {
    if executor.is_shutdown() {
        SimilarityError::ThreadingError("executor is shutting down".into())
    } else {
        SimilarityError::Unknown("worker abandoned the computation".into())
    }
}

fn check_input_sizes(s1: &str, s2: &str, config: &AlgorithmConfig) -> Result<()> {
    let max = config.effective_max_string_length();
    if s1.len() > max || s2.len() > max {
        return Err(SimilarityError::InvalidInput(format!(
            "input exceeds maximum string length of {max} bytes"
        )));
    }
    Ok(())
}

/// Decode, take the early answers, then run the similarity kernel.
fn compute_similarity_with(s1: &str, s2: &str, config: &AlgorithmConfig) -> Result<f64> {
    let text1 = UnicodeText::new(s1);
    let text2 = UnicodeText::new(s2);

    if let Some(answer) = quick_similarity(&text1, &text2, config) {
        return Ok(answer);
    }

    let (text1, text2) = folded_pair(text1, text2, config);
    let pool = MemoryPool::new();
    kernels::compute_similarity(&text1, &text2, config, &pool)
}

/// Decode, take the early answers, then run the distance kernel.
fn compute_distance_with(s1: &str, s2: &str, config: &AlgorithmConfig) -> Result<u32> {
    let text1 = UnicodeText::new(s1);
    let text2 = UnicodeText::new(s2);

    if let Some(answer) = quick_distance(&text1, &text2, config) {
        return Ok(answer);
    }

    let (text1, text2) = folded_pair(text1, text2, config);
    let pool = MemoryPool::new();
    kernels::compute_distance(&text1, &text2, config, &pool)
}

/// Engine-level shortcuts: identity on empty/empty, zero on one-empty,
/// identity on exact or case-folded equality.
///
/// Hamming keeps its equal-length invariant, so a one-empty pair falls
/// through to the kernel and its `InvalidInput` rejection.
fn quick_similarity(s1: &UnicodeText, s2: &UnicodeText, config: &AlgorithmConfig) -> Option<f64> {
    if s1.is_empty() && s2.is_empty() {
        return Some(1.0);
    }
    if s1.is_empty() || s2.is_empty() {
        if config.algorithm == AlgorithmType::Hamming {
            return None;
        }
        return Some(0.0);
    }
    if s1 == s2 {
        return Some(1.0);
    }
    if config.case_sensitivity == CaseSensitivity::Insensitive && s1.to_folded() == s2.to_folded() {
        return Some(1.0);
    }
    None
}

/// Distance shortcuts: zero on empty/empty and on (case-folded) equality.
///
/// A one-empty pair is length-valued only for the edit-count kernels;
/// every other algorithm reports its own quantized distance, and Hamming
/// rejects the unequal lengths.
fn quick_distance(s1: &UnicodeText, s2: &UnicodeText, config: &AlgorithmConfig) -> Option<u32> {
    if s1.is_empty() && s2.is_empty() {
        return Some(0);
    }
    if s1.is_empty() || s2.is_empty() {
        return match config.algorithm {
            AlgorithmType::Levenshtein | AlgorithmType::DamerauLevenshtein => {
                Some(s1.len().max(s2.len()) as u32)
            }
            _ => None,
        };
    }
    if s1 == s2 {
        return Some(0);
    }
    if config.case_sensitivity == CaseSensitivity::Insensitive && s1.to_folded() == s2.to_folded() {
        return Some(0);
    }
    None
}

/// Fold both inputs once when the call is case-insensitive, so kernels and
/// tokenizers observe folded text.
fn folded_pair(
    text1: UnicodeText,
    text2: UnicodeText,
    config: &AlgorithmConfig,
) -> (UnicodeText, UnicodeText) {
    if config.case_sensitivity == CaseSensitivity::Insensitive {
        (text1.to_folded(), text2.to_folded())
    } else {
        (text1, text2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PreprocessingMode;

    #[test]
    fn test_similarity_dispatch_basic() {
        let engine = SimilarityEngine::with_worker_threads(1);
        let sim = engine
            .similarity("kitten", "sitting", AlgorithmType::Levenshtein, None)
            .unwrap();
        assert!((sim - (1.0 - 3.0 / 7.0)).abs() < 1e-12);

        let distance = engine
            .distance("kitten", "sitting", AlgorithmType::Levenshtein, None)
            .unwrap();
        assert_eq!(distance, 3);
    }

    #[test]
    fn test_cache_round_trip_and_hit_counter() {
        let engine = SimilarityEngine::with_worker_threads(1);
        let first = engine
            .similarity("hello", "hallo", AlgorithmType::Jaro, None)
            .unwrap();
        assert_eq!(engine.cache_hits(), 0);

        let second = engine
            .similarity("hello", "hallo", AlgorithmType::Jaro, None)
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(engine.cache_hits(), 1);
        assert!(engine.memory_usage() > 0);

        engine.clear_caches();
        assert_eq!(engine.memory_usage(), 0);
    }

    #[test]
    fn test_quick_answers() {
        let engine = SimilarityEngine::with_worker_threads(1);
        assert_eq!(
            engine.similarity("", "", AlgorithmType::Hamming, None).unwrap(),
            1.0
        );
        assert_eq!(
            engine.similarity("abc", "", AlgorithmType::Jaccard, None).unwrap(),
            0.0
        );
        assert_eq!(
            engine.distance("", "abc", AlgorithmType::Levenshtein, None).unwrap(),
            3
        );
        assert_eq!(
            engine.distance("same", "same", AlgorithmType::Cosine, None).unwrap(),
            0
        );

        // Length-valued one-empty distances are an edit-kernel shortcut;
        // the normalized kernels report their own quantized distance
        assert_eq!(
            engine.distance("abc", "", AlgorithmType::Jaccard, None).unwrap(),
            1000
        );
        // Hamming keeps its equal-length invariant even against ""
        assert!(matches!(
            engine.similarity("abc", "", AlgorithmType::Hamming, None),
            Err(SimilarityError::InvalidInput(_))
        ));

        let insensitive = ConfigPatch {
            case_sensitivity: Some(CaseSensitivity::Insensitive),
            ..Default::default()
        };
        assert_eq!(
            engine
                .similarity("HELLO", "hello", AlgorithmType::Euclidean, Some(&insensitive))
                .unwrap(),
            1.0
        );
    }

    #[test]
    fn test_input_size_gate() {
        let engine = SimilarityEngine::with_worker_threads(1);
        let tiny_limit = ConfigPatch {
            max_string_length: Some(4),
            ..Default::default()
        };
        let result =
            engine.similarity("hello", "hi", AlgorithmType::Levenshtein, Some(&tiny_limit));
        assert!(matches!(result, Err(SimilarityError::InvalidInput(_))));

        let result = engine.similarity("hi", "hey", AlgorithmType::Levenshtein, Some(&tiny_limit));
        assert!(result.is_ok());
    }

    #[test]
    fn test_invalid_configuration_propagates() {
        let engine = SimilarityEngine::with_worker_threads(1);
        let result = engine.similarity("hello", "hallo", AlgorithmType::Tversky, None);
        assert!(matches!(result, Err(SimilarityError::InvalidConfiguration(_))));

        let zero_ngrams = ConfigPatch {
            ngram_size: Some(0),
            ..Default::default()
        };
        let result =
            engine.similarity("hello", "hallo", AlgorithmType::Jaccard, Some(&zero_ngrams));
        assert!(matches!(result, Err(SimilarityError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_global_and_per_algorithm_layers() {
        let engine = SimilarityEngine::with_worker_threads(1);
        engine
            .set_global_config(AlgorithmConfig {
                case_sensitivity: CaseSensitivity::Insensitive,
                ..Default::default()
            })
            .unwrap();

        // The global layer applies to every algorithm
        assert_eq!(
            engine.similarity("ABC", "abc", AlgorithmType::Levenshtein, None).unwrap(),
            1.0
        );

        engine.set_algorithm_config(
            AlgorithmType::Jaccard,
            ConfigPatch {
                preprocessing: Some(PreprocessingMode::Word),
                ..Default::default()
            },
        );
        let resolved = engine.get_algorithm_config(AlgorithmType::Jaccard);
        assert_eq!(resolved.preprocessing, PreprocessingMode::Word);
        assert_eq!(resolved.case_sensitivity, CaseSensitivity::Insensitive);

        // The per-call layer still wins over both
        let sensitive_call = ConfigPatch {
            case_sensitivity: Some(CaseSensitivity::Sensitive),
            ..Default::default()
        };
        let sim = engine
            .similarity("ABC", "abc", AlgorithmType::Levenshtein, Some(&sensitive_call))
            .unwrap();
        assert!(sim < 1.0);

        engine.reset_to_defaults();
        assert_eq!(engine.get_global_config(), AlgorithmConfig::default());
        assert_eq!(
            engine.get_algorithm_config(AlgorithmType::Jaccard).preprocessing,
            PreprocessingMode::Character
        );
    }

    #[test]
    fn test_set_global_config_rejects_invalid() {
        let engine = SimilarityEngine::with_worker_threads(1);
        let result = engine.set_global_config(AlgorithmConfig {
            ngram_size: 0,
            ..Default::default()
        });
        assert!(matches!(result, Err(SimilarityError::InvalidConfiguration(_))));
        // The previous configuration is untouched
        assert_eq!(engine.get_global_config(), AlgorithmConfig::default());
    }

    #[test]
    fn test_batch_preserves_order_and_isolates_failures() {
        let engine = SimilarityEngine::with_worker_threads(1);
        let pairs = [
            ("kitten".to_owned(), "sitting".to_owned()),
            ("hello".to_owned(), "hi".to_owned()),
            ("same".to_owned(), "same".to_owned()),
        ];
        let results = engine.similarity_batch(&pairs, AlgorithmType::Hamming, None);
        assert_eq!(results.len(), 3);
        assert!(matches!(results[1], Err(SimilarityError::InvalidInput(_))));
        assert_eq!(results[2], Ok(1.0));
    }

    #[tokio::test]
    async fn test_async_matches_sync() {
        let engine = SimilarityEngine::with_worker_threads(2);
        let sync = engine
            .similarity("martha", "marhta", AlgorithmType::JaroWinkler, None)
            .unwrap();
        let fanned = engine
            .similarity_async("martha", "marhta", AlgorithmType::JaroWinkler, None)
            .await
            .unwrap();
        assert_eq!(sync, fanned);

        let distance = engine
            .distance_async("kitten", "sitting", AlgorithmType::Levenshtein, None)
            .await
            .unwrap();
        assert_eq!(distance, 3);
    }

    #[tokio::test]
    async fn test_async_batch_preserves_order() {
        let engine = SimilarityEngine::with_worker_threads(4);
        let pairs = [
            ("kitten".to_owned(), "sitting".to_owned()),
            ("hello".to_owned(), "hallo".to_owned()),
            ("abc".to_owned(), "abc".to_owned()),
        ];
        let results = engine
            .similarity_batch_async(&pairs, AlgorithmType::Levenshtein, None)
            .await;
        assert_eq!(results.len(), 3);
        assert!((results[0].as_ref().unwrap() - (1.0 - 3.0 / 7.0)).abs() < 1e-12);
        assert_eq!(*results[1].as_ref().unwrap(), 0.8);
        assert_eq!(*results[2].as_ref().unwrap(), 1.0);
    }

    #[tokio::test]
    async fn test_async_after_shutdown_is_threading_error() {
        let engine = SimilarityEngine::with_worker_threads(1);
        engine.shutdown();
        let result = engine
            .similarity_async("a", "b", AlgorithmType::Levenshtein, None)
            .await;
        assert!(matches!(result, Err(SimilarityError::ThreadingError(_))));
    }
}
