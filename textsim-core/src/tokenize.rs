//! Tokenization pipeline shared by the set and vector kernels.
//!
//! Produces ordered [`UnicodeText`] tokens from an input according to the
//! configured [`PreprocessingMode`]: the whole input, single code points,
//! word runs, or sliding code-point n-grams.

use crate::config::{AlgorithmConfig, PreprocessingMode};
use crate::unicode::UnicodeText;

/// Tokenize `input` per the merged configuration.
pub fn tokenize(input: &UnicodeText, config: &AlgorithmConfig) -> Vec<UnicodeText> {
    match config.preprocessing {
        PreprocessingMode::None => vec![input.clone()],
        PreprocessingMode::Character => input
            .chars()
            .iter()
            .map(|&c| UnicodeText::from_chars(vec![c]))
            .collect(),
        PreprocessingMode::Word => word_tokens(input),
        PreprocessingMode::NGram => ngram_tokens(input, config.ngram_size as usize),
    }
}

/// Maximal `[A-Za-z0-9_]+` runs, scanned over the UTF-8 bytes.
///
/// Word characters are pure ASCII, so run boundaries always fall on UTF-8
/// character boundaries.
fn word_tokens(input: &UnicodeText) -> Vec<UnicodeText> {
    let bytes = input.as_str().as_bytes();
    let mut tokens = Vec::new();
    let mut start = None;

    for (i, &b) in bytes.iter().enumerate() {
        if is_word_byte(b) {
            start.get_or_insert(i);
        } else if let Some(s) = start.take() {
            tokens.push(UnicodeText::new(&input.as_str()[s..i]));
        }
    }
    if let Some(s) = start {
        tokens.push(UnicodeText::new(&input.as_str()[s..]));
    }

    tokens
}

#[inline]
fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Sliding code-point windows of length `n`.
///
/// Inputs shorter than `n` yield a single token equal to the whole text;
/// empty inputs yield no tokens. `n == 0` never reaches this point
/// (rejected by configuration validation).
fn ngram_tokens(input: &UnicodeText, n: usize) -> Vec<UnicodeText> {
    if n == 0 || input.is_empty() {
        return Vec::new();
    }

    let chars = input.chars();
    if chars.len() < n {
        return vec![input.clone()];
    }

    chars
        .windows(n)
        .map(|window| UnicodeText::from_chars(window.to_vec()))
        .collect()
}
