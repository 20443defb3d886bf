//! Pre-processing for job-screen.
//!
//! Text is first normalized with [`normalize`], then vectorized with a
//! [`TfidfVectorizer`] built over word-level n-grams.

mod normalize;
mod progress;
mod vectorizer;

pub use normalize::normalize;
pub use progress::{progress_bar, progress_enabled, set_progress_enabled};
pub use vectorizer::{
    CountVectorizer, DEFAULT_MAX_FEATURES, DEFAULT_MAX_NGRAM, DEFAULT_MIN_NGRAM, TfidfVectorizer,
    VectorizerParams, Vocabulary, is_stop_word, word_tokens,
};
