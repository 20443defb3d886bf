use std::ops::RangeInclusive;

pub const DEFAULT_MIN_NGRAM: usize = 1;
pub const DEFAULT_MAX_NGRAM: usize = 2;
pub const DEFAULT_MAX_FEATURES: usize = 5000;

#[cfg_attr(feature = "bincode", derive(bincode::Encode, bincode::Decode))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq)]
pub struct VectorizerParams {
    ngram_range: Vec<usize>,
    /// Minimum document frequency for filtering vocabulary.
    /// - If `min_df` is in (0.0, 1.0), it's a proportion of documents
    /// - If `min_df` >= 1.0, it's an absolute document count
    min_df: f64,
    /// Maximum document frequency for filtering vocabulary.
    /// - If `max_df` is in (0.0, 1.0], it's a proportion of documents
    /// - If `max_df` > 1.0, it's an absolute document count
    max_df: f64,
    /// Keep at most this many n-grams, ranked by total corpus frequency.
    max_features: usize,
    /// Apply sublinear tf scaling: replace term frequency `tf` with `1 + log(tf)`.
    sublinear_tf: bool,
    /// Drop English stop words before forming n-grams.
    stop_words: bool,
}

impl VectorizerParams {
    pub fn new(
        ngram_range: impl Into<RangeInclusive<usize>>,
        min_df: f64,
        max_df: f64,
        max_features: usize,
        sublinear_tf: bool,
    ) -> Self {
        let params = Self {
            ngram_range: ngram_range.into().collect(),
            min_df,
            max_df,
            max_features,
            sublinear_tf,
            stop_words: true,
        };
        if let Err(reason) = params.validate() {
            panic!("invalid vectorizer parameters: {reason}");
        }
        params
    }

    #[must_use]
    pub fn with_stop_words(mut self, stop_words: bool) -> Self {
        self.stop_words = stop_words;
        self
    }

    #[must_use]
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    /// Check the invariants `new` enforces. Useful for params that were
    /// deserialized rather than constructed.
    pub fn validate(&self) -> Result<(), String> {
        if self.ngram_range.is_empty() {
            return Err("ngram_range must contain at least one value".to_string());
        }
        if self.ngram_range.contains(&0) {
            return Err("ngram sizes must be at least 1".to_string());
        }
        if self.min_df <= 0.0 {
            return Err(
                "min_df must be positive (proportion in (0.0, 1.0) or absolute count >= 1.0)"
                    .to_string(),
            );
        }
        if self.max_df <= 0.0 {
            return Err(
                "max_df must be positive (proportion in (0.0, 1.0] or absolute count > 1.0)"
                    .to_string(),
            );
        }
        if self.max_features == 0 {
            return Err("max_features must be at least 1".to_string());
        }
        Ok(())
    }

    #[must_use]
    pub fn ngram_sizes(&self) -> &[usize] {
        &self.ngram_range
    }

    #[must_use]
    pub fn ngram_range(&self) -> (usize, usize) {
        (
            self.ngram_range.first().copied().unwrap_or(DEFAULT_MIN_NGRAM),
            self.ngram_range.last().copied().unwrap_or(DEFAULT_MAX_NGRAM),
        )
    }

    #[must_use]
    pub fn min_df(&self) -> f64 {
        self.min_df
    }

    #[must_use]
    pub fn max_df(&self) -> f64 {
        self.max_df
    }

    #[must_use]
    pub fn max_features(&self) -> usize {
        self.max_features
    }

    #[must_use]
    pub fn sublinear_tf(&self) -> bool {
        self.sublinear_tf
    }

    #[must_use]
    pub fn stop_words(&self) -> bool {
        self.stop_words
    }

    /// Resolve `min_df`/`max_df` into absolute document counts for a corpus
    /// of `n_docs` documents.
    #[must_use]
    pub(crate) fn df_bounds(&self, n_docs: usize) -> (f64, f64) {
        let n_docs = n_docs as f64;
        let min = if self.min_df >= 1.0 {
            self.min_df
        } else {
            (self.min_df * n_docs).ceil()
        };
        let max = if self.max_df > 1.0 {
            self.max_df
        } else {
            (self.max_df * n_docs).floor()
        };
        (min, max)
    }
}

impl Default for VectorizerParams {
    fn default() -> Self {
        Self {
            ngram_range: (DEFAULT_MIN_NGRAM..=DEFAULT_MAX_NGRAM).collect(),
            min_df: 1.0,
            max_df: 1.0,
            max_features: DEFAULT_MAX_FEATURES,
            sublinear_tf: false,
            stop_words: true,
        }
    }
}
