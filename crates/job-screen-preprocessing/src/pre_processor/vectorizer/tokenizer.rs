use indicatif::{ParallelProgressIterator, ProgressIterator};
use rayon::prelude::*;
use tracing::debug;

use super::stop_words::is_stop_word;
use crate::pre_processor::{normalize, progress::progress_bar_setup};

/// Minimum number of texts to consider parallelization
const MIN_TEXTS_FOR_PARALLEL: usize = 100;

/// Minimum total character count to consider parallelization
const MIN_CHARS_FOR_PARALLEL: usize = 10_000;

/// Tokens shorter than this never become features.
const MIN_TOKEN_LEN: usize = 2;

/// Split cleaned text into its whitespace-separated words.
///
/// Every word is kept, including single characters and stop words.
pub fn word_tokens(cleaned: &str) -> impl Iterator<Item = &str> {
    cleaned.split(' ').filter(|word| !word.is_empty())
}

/// Tokens that take part in n-gram features: normalized words of at least
/// two characters, optionally without stop words.
pub(crate) fn feature_tokens(text: &str, drop_stop_words: bool) -> Vec<String> {
    let cleaned = normalize(text);
    word_tokens(&cleaned)
        .filter(|word| word.len() >= MIN_TOKEN_LEN)
        .filter(|word| !(drop_stop_words && is_stop_word(word)))
        .map(str::to_owned)
        .collect()
}

fn tokenize_texts_par<T: AsRef<str> + Sync>(texts: &[T], drop_stop_words: bool) -> Vec<Vec<String>> {
    debug!(num_texts = texts.len(), "Using parallel tokenization");
    let pb = progress_bar_setup(texts.len(), "Tokenizing texts in parallel");
    let result = texts
        .par_iter()
        .progress_with(pb.clone())
        .map(|text| feature_tokens(text.as_ref(), drop_stop_words))
        .collect();
    pb.finish_with_message("Parallel tokenization complete");
    result
}

fn tokenize_texts<T: AsRef<str>>(texts: &[T], drop_stop_words: bool) -> Vec<Vec<String>> {
    debug!(num_texts = texts.len(), "Using sequential tokenization");
    let pb = progress_bar_setup(texts.len(), "Tokenizing texts");
    let result = texts
        .iter()
        .progress_with(pb.clone())
        .map(|text| feature_tokens(text.as_ref(), drop_stop_words))
        .collect();
    pb.finish_with_message("Tokenization complete");
    result
}

/// Determine if parallel processing should be used based on workload characteristics.
///
/// Parallelization is beneficial when:
/// - There are many texts (>= 100), OR
/// - The total character count is large (>= 10,000 chars)
#[inline]
fn should_use_parallel<T: AsRef<str>>(texts: &[T]) -> bool {
    let num_texts = texts.len();

    if num_texts >= MIN_TEXTS_FOR_PARALLEL {
        return true;
    }

    let total_chars: usize = if num_texts > 20 {
        // Estimate from the first 20 texts
        let sample_chars: usize = texts.iter().take(20).map(|s| s.as_ref().len()).sum();
        (sample_chars * num_texts) / 20
    } else {
        texts.iter().map(|s| s.as_ref().len()).sum()
    };

    total_chars >= MIN_CHARS_FOR_PARALLEL
}

pub(crate) fn tokenize<T: AsRef<str> + Sync>(texts: &[T], drop_stop_words: bool) -> Vec<Vec<String>> {
    if should_use_parallel(texts) {
        tokenize_texts_par(texts, drop_stop_words)
    } else {
        tokenize_texts(texts, drop_stop_words)
    }
}
