mod count_vectorizer;
mod ngrams;
mod params;
mod stop_words;
mod tfidf_vectorizer;
mod tokenizer;
mod vocabulary;

pub use count_vectorizer::CountVectorizer;
pub use params::{DEFAULT_MAX_FEATURES, DEFAULT_MAX_NGRAM, DEFAULT_MIN_NGRAM, VectorizerParams};
pub use stop_words::is_stop_word;
pub use tfidf_vectorizer::TfidfVectorizer;
pub use tokenizer::word_tokens;
pub use vocabulary::Vocabulary;
