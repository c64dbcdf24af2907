//! Edit-based kernels: Levenshtein, Damerau-Levenshtein (OSA) and Hamming.
//!
//! All three compare code points under the configured case mode. Levenshtein
//! and Hamming take a byte-level shortcut when both inputs are pure ASCII;
//! the shortcut is exact, not approximate.
//!
//! Levenshtein runs a single-row DP over the shorter string. When a
//! `threshold` of `k` is configured, a banded variant only evaluates cells
//! within `k` of the diagonal and reports `k + 1` as a saturating "too far"
//! answer.

use crate::config::AlgorithmConfig;
use crate::error::{Result, SimilarityError};
use crate::pool::MemoryPool;
use crate::unicode::{chars_equal, UnicodeText};

#[inline]
fn ascii_bytes_equal(a: u8, b: u8, case_sensitive: bool) -> bool {
    if case_sensitive {
        a == b
    } else {
        (a | 0x20) == (b | 0x20)
    }
}

#[inline]
fn distance_to_similarity(distance: u32, max_length: usize) -> f64 {
    if max_length == 0 {
        return 1.0;
    }
    1.0 - f64::from(distance) / max_length as f64
}

// ============================================================================
// Levenshtein
// ============================================================================

/// Levenshtein similarity: `1 - d / max(|s1|, |s2|)`, with 1.0 on two empty
/// inputs.
pub fn levenshtein_similarity(
    s1: &UnicodeText,
    s2: &UnicodeText,
    config: &AlgorithmConfig,
    pool: &MemoryPool,
) -> Result<f64> {
    let distance = levenshtein_distance(s1, s2, config, pool)?;
    Ok(distance_to_similarity(distance, s1.len().max(s2.len())))
}

/// Levenshtein distance over code points.
///
/// With `config.threshold = k`, the result saturates at `k + 1`.
pub fn levenshtein_distance(
    s1: &UnicodeText,
    s2: &UnicodeText,
    config: &AlgorithmConfig,
    pool: &MemoryPool,
) -> Result<u32> {
    if s1.is_empty() {
        return Ok(s2.len() as u32);
    }
    if s2.is_empty() {
        return Ok(s1.len() as u32);
    }
    if s1 == s2 {
        return Ok(0);
    }

    let case_sensitive = config.case_sensitivity.is_sensitive();

    if let Some(threshold) = config.threshold {
        let k = threshold as u32;
        return Ok(banded_distance(s1.chars(), s2.chars(), k, case_sensitive, pool));
    }

    if s1.is_ascii() && s2.is_ascii() {
        return Ok(single_row_bytes(
            s1.as_str().as_bytes(),
            s2.as_str().as_bytes(),
            case_sensitive,
            pool,
        ));
    }

    Ok(single_row_chars(s1.chars(), s2.chars(), case_sensitive, pool))
}

fn single_row_chars(s1: &[char], s2: &[char], case_sensitive: bool, pool: &MemoryPool) -> u32 {
    // Shorter string on the inner axis keeps the row small.
    if s1.len() > s2.len() {
        return single_row_chars(s2, s1, case_sensitive, pool);
    }

    let len1 = s1.len();
    let row = pool.alloc_row(len1 + 1);
    for (i, cell) in row.iter_mut().enumerate() {
        *cell = i as u32;
    }

    for (j, &c2) in s2.iter().enumerate() {
        let mut previous_diagonal = row[0];
        row[0] = j as u32 + 1;

        for (i, &c1) in s1.iter().enumerate() {
            let previous_current = row[i + 1];
            row[i + 1] = if chars_equal(c1, c2, case_sensitive) {
                previous_diagonal
            } else {
                1 + row[i + 1].min(row[i]).min(previous_diagonal)
            };
            previous_diagonal = previous_current;
        }
    }

    row[len1]
}

fn single_row_bytes(s1: &[u8], s2: &[u8], case_sensitive: bool, pool: &MemoryPool) -> u32 {
    if s1.len() > s2.len() {
        return single_row_bytes(s2, s1, case_sensitive, pool);
    }

    let len1 = s1.len();
    let row = pool.alloc_row(len1 + 1);
    for (i, cell) in row.iter_mut().enumerate() {
        *cell = i as u32;
    }

    for (j, &b2) in s2.iter().enumerate() {
        let mut previous_diagonal = row[0];
        row[0] = j as u32 + 1;

        for (i, &b1) in s1.iter().enumerate() {
            let previous_current = row[i + 1];
            row[i + 1] = if ascii_bytes_equal(b1, b2, case_sensitive) {
                previous_diagonal
            } else {
                1 + row[i + 1].min(row[i]).min(previous_diagonal)
            };
            previous_diagonal = previous_current;
        }
    }

    row[len1]
}

/// Banded Levenshtein: only cells with `|i - j| <= k` are evaluated; any
/// answer beyond `k` collapses to `k + 1`.
fn banded_distance(s1: &[char], s2: &[char], k: u32, case_sensitive: bool, pool: &MemoryPool) -> u32 {
    if s1.len() > s2.len() {
        return banded_distance(s2, s1, k, case_sensitive, pool);
    }

    let len1 = s1.len();
    let len2 = s2.len();
    if (len2 - len1) as u64 > u64::from(k) {
        return k + 1;
    }

    let sentinel = k + 1;
    let band = k as usize;

    let mut prev = pool.alloc_row(len1 + 1);
    let mut cur = pool.alloc_row(len1 + 1);
    for (i, cell) in prev.iter_mut().enumerate() {
        *cell = (i as u32).min(sentinel);
    }

    for (j, &c2) in s2.iter().enumerate() {
        let j1 = j + 1;
        cur.fill(sentinel);
        cur[0] = (j1 as u32).min(sentinel);

        let lo = j1.saturating_sub(band).max(1);
        let hi = (j1 + band).min(len1);

        let mut row_min = cur[0];
        for i in lo..=hi {
            let cost = u32::from(!chars_equal(s1[i - 1], c2, case_sensitive));
            let value = (prev[i] + 1)
                .min(cur[i - 1] + 1)
                .min(prev[i - 1] + cost)
                .min(sentinel);
            cur[i] = value;
            row_min = row_min.min(value);
        }

        // Nothing in the band can still finish within k
        if row_min > k {
            return sentinel;
        }

        std::mem::swap(&mut prev, &mut cur);
    }

    prev[len1].min(sentinel)
}

// ============================================================================
// Damerau-Levenshtein (Optimal String Alignment)
// ============================================================================

/// Damerau-Levenshtein similarity using the OSA distance.
pub fn damerau_levenshtein_similarity(
    s1: &UnicodeText,
    s2: &UnicodeText,
    config: &AlgorithmConfig,
    pool: &MemoryPool,
) -> Result<f64> {
    let distance = damerau_levenshtein_distance(s1, s2, config, pool)?;
    Ok(distance_to_similarity(distance, s1.len().max(s2.len())))
}

/// Optimal String Alignment distance: the three edit operations plus
/// adjacent transpositions, with no overlapping edits on the same substring.
pub fn damerau_levenshtein_distance(
    s1: &UnicodeText,
    s2: &UnicodeText,
    config: &AlgorithmConfig,
    pool: &MemoryPool,
) -> Result<u32> {
    if s1.is_empty() {
        return Ok(s2.len() as u32);
    }
    if s2.is_empty() {
        return Ok(s1.len() as u32);
    }
    if s1 == s2 {
        return Ok(0);
    }

    let a = s1.chars();
    let b = s2.chars();
    let len1 = a.len();
    let len2 = b.len();
    let case_sensitive = config.case_sensitivity.is_sensitive();

    let width = len2 + 1;
    let matrix = pool.alloc_row((len1 + 1) * width);

    for i in 0..=len1 {
        matrix[i * width] = i as u32;
    }
    for j in 0..=len2 {
        matrix[j] = j as u32;
    }

    for i in 1..=len1 {
        for j in 1..=len2 {
            let cost = u32::from(!chars_equal(a[i - 1], b[j - 1], case_sensitive));

            let mut value = (matrix[(i - 1) * width + j] + 1)
                .min(matrix[i * width + j - 1] + 1)
                .min(matrix[(i - 1) * width + j - 1] + cost);

            // Restricted transposition of the two adjacent code points
            if i > 1
                && j > 1
                && chars_equal(a[i - 1], b[j - 2], case_sensitive)
                && chars_equal(a[i - 2], b[j - 1], case_sensitive)
            {
                value = value.min(matrix[(i - 2) * width + j - 2] + cost);
            }

            matrix[i * width + j] = value;
        }
    }

    Ok(matrix[len1 * width + len2])
}

// ============================================================================
// Hamming
// ============================================================================

/// Hamming similarity: `1 - d / n` over equal-length inputs.
pub fn hamming_similarity(
    s1: &UnicodeText,
    s2: &UnicodeText,
    config: &AlgorithmConfig,
) -> Result<f64> {
    let distance = hamming_distance(s1, s2, config)?;
    Ok(distance_to_similarity(distance, s1.len()))
}

/// Count of positions whose code points differ. Inputs must have equal
/// code-point length.
pub fn hamming_distance(s1: &UnicodeText, s2: &UnicodeText, config: &AlgorithmConfig) -> Result<u32> {
    if s1.len() != s2.len() {
        return Err(SimilarityError::InvalidInput(
            "Hamming distance requires equal-length strings".into(),
        ));
    }
    if s1 == s2 {
        return Ok(0);
    }

    let case_sensitive = config.case_sensitivity.is_sensitive();

    if s1.is_ascii() && s2.is_ascii() {
        let mismatches = s1
            .as_str()
            .bytes()
            .zip(s2.as_str().bytes())
            .filter(|&(a, b)| !ascii_bytes_equal(a, b, case_sensitive))
            .count();
        return Ok(mismatches as u32);
    }

    let mismatches = s1
        .chars()
        .iter()
        .zip(s2.chars().iter())
        .filter(|&(&a, &b)| !chars_equal(a, b, case_sensitive))
        .count();
    Ok(mismatches as u32)
}
