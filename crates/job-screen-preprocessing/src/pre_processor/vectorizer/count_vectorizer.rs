use ahash::AHashMap;
use sprs::CsMat;
use tracing::debug;

use super::{
    ngrams::{self, TermStats},
    params::VectorizerParams,
    tokenizer,
    vocabulary::Vocabulary,
};

#[cfg_attr(feature = "bincode", derive(bincode::Encode, bincode::Decode))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct CountVectorizer {
    params: VectorizerParams,
    vocab: Vocabulary,
}

/// Output of a single-pass fit: the vectorizer, the count matrix of the
/// training texts, and the document frequency of every kept feature.
pub(crate) struct FittedCounts {
    pub vectorizer: CountVectorizer,
    pub counts: CsMat<f64>,
    pub document_frequency: Vec<usize>,
}

impl CountVectorizer {
    pub(crate) fn from_parts(params: VectorizerParams, vocab: Vocabulary) -> Self {
        Self { params, vocab }
    }

    /// Pick the vocabulary from corpus statistics.
    ///
    /// N-grams outside the `min_df`/`max_df` bounds are dropped, the
    /// `max_features` most frequent survivors are kept (ties broken by the
    /// n-gram text), and indices are assigned in lexicographic order.
    fn select_vocabulary(
        stats: Vec<(String, TermStats)>,
        n_docs: usize,
        params: &VectorizerParams,
    ) -> Vec<(String, TermStats)> {
        let candidate_count = stats.len();
        let (min_df, max_df) = params.df_bounds(n_docs);
        debug!(min_df, max_df, "Applying document frequency bounds");

        let mut kept = stats
            .into_iter()
            .filter(|(_, s)| s.df as f64 >= min_df && s.df as f64 <= max_df)
            .collect::<Vec<_>>();

        if kept.len() > params.max_features() {
            kept.sort_by(|(a_term, a), (b_term, b)| {
                b.total.cmp(&a.total).then_with(|| a_term.cmp(b_term))
            });
            kept.truncate(params.max_features());
        }
        kept.sort_by(|(a, _), (b, _)| a.cmp(b));

        debug!(
            original_size = candidate_count,
            filtered_size = kept.len(),
            "Vocabulary selected"
        );
        kept
    }

    /// Fit the vocabulary and count the training texts in one pass:
    /// tokenize once, count n-grams once, reuse them for both steps.
    pub(crate) fn fit_counts<T: AsRef<str> + Sync>(
        texts: &[T],
        params: VectorizerParams,
    ) -> FittedCounts {
        debug!(
            num_texts = texts.len(),
            "Fitting CountVectorizer: tokenizing and computing n-grams once"
        );
        let tokenized_texts = tokenizer::tokenize(texts, params.stop_words());

        debug!("Computing n-grams for all documents");
        let ngram_maps = tokenized_texts
            .iter()
            .map(|tokens| ngrams::count_ngrams(tokens, params.ngram_sizes()))
            .collect::<Vec<_>>();

        let stats = ngrams::corpus_stats(&ngram_maps).into_iter().collect();
        let selected = Self::select_vocabulary(stats, texts.len(), &params);

        let document_frequency = selected.iter().map(|(_, s)| s.df).collect();
        let vocab = Vocabulary::from_terms(selected.into_iter().map(|(term, _)| term));
        let vectorizer = Self { params, vocab };

        debug!("Counting training texts using cached n-grams");
        let counts = vectorizer.counts_matrix(&ngram_maps);

        debug!(
            vocab_size = vectorizer.num_features(),
            "CountVectorizer fitting complete"
        );
        FittedCounts {
            vectorizer,
            counts,
            document_frequency,
        }
    }

    pub fn fit<T: AsRef<str> + Sync>(texts: &[T], params: VectorizerParams) -> Self {
        Self::fit_counts(texts, params).vectorizer
    }

    /// In-vocabulary `(feature index, count)` pairs of one document, sorted
    /// by feature index.
    fn row_entries(&self, ngrams: &AHashMap<String, usize>) -> Vec<(usize, f64)> {
        let mut row_entries = ngrams
            .iter()
            .filter_map(|(ngram, &count)| self.vocab.get(ngram).map(|col| (col, count as f64)))
            .collect::<Vec<_>>();
        row_entries.sort_unstable_by_key(|(col, _)| *col);
        row_entries
    }

    fn counts_matrix(&self, ngram_maps: &[AHashMap<String, usize>]) -> CsMat<f64> {
        let mut indptr = Vec::with_capacity(ngram_maps.len() + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        indptr.push(0);

        for ngrams in ngram_maps {
            for (col, count) in self.row_entries(ngrams) {
                indices.push(col);
                data.push(count);
            }
            indptr.push(indices.len());
        }

        debug!(non_zero_entries = data.len(), "Count matrix built");
        CsMat::new((ngram_maps.len(), self.num_features()), indptr, indices, data)
    }

    pub fn transform<T: AsRef<str> + Sync>(&self, texts: &[T]) -> CsMat<f64> {
        debug!(
            num_texts = texts.len(),
            "Transforming texts using CountVectorizer"
        );
        let tokenized_texts = tokenizer::tokenize(texts, self.params.stop_words());
        let ngram_maps = tokenized_texts
            .iter()
            .map(|tokens| ngrams::count_ngrams(tokens, self.params.ngram_sizes()))
            .collect::<Vec<_>>();
        self.counts_matrix(&ngram_maps)
    }

    /// Counts for a single document, without the progress reporting of the
    /// batch path.
    pub fn transform_one(&self, text: &str) -> Vec<(usize, f64)> {
        let tokens = tokenizer::feature_tokens(text, self.params.stop_words());
        let ngrams = ngrams::count_ngrams(&tokens, self.params.ngram_sizes());
        self.row_entries(&ngrams)
    }

    pub fn num_features(&self) -> usize {
        self.vocab.len()
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn params(&self) -> &VectorizerParams {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(max_features: usize) -> VectorizerParams {
        VectorizerParams::new(1..=2, 1.0, 1.0, max_features, false)
    }

    #[test]
    fn test_vocabulary_sorted_lexicographically() {
        let texts = ["wire money urgent", "urgent bonus"];
        let cv = CountVectorizer::fit(&texts, params(100));
        let terms = cv.vocabulary().terms();
        let mut sorted = terms.to_vec();
        sorted.sort();
        assert_eq!(terms, sorted.as_slice());
        assert!(cv.vocabulary().contains("wire money"));
        assert!(cv.vocabulary().contains("urgent bonus"));
    }

    #[test]
    fn test_max_features_keeps_most_frequent_with_stable_ties() {
        let texts = ["alpha alpha beta", "alpha gamma", "delta"];
        let cv = CountVectorizer::fit(&texts, VectorizerParams::new(1..=1, 1.0, 1.0, 2, false));
        // alpha (3) wins outright, beta/delta/gamma tie at 1 and beta sorts first
        assert_eq!(cv.vocabulary().terms(), &["alpha".to_string(), "beta".to_string()]);
    }

    #[test]
    fn test_min_df_filters_rare_terms() {
        let texts = ["wire money", "wire bonus", "wire"];
        let cv = CountVectorizer::fit(&texts, VectorizerParams::new(1..=1, 2.0, 1.0, 100, false));
        assert_eq!(cv.vocabulary().terms(), &["wire".to_string()]);
    }

    #[test]
    fn test_fit_counts_matches_transform() {
        let texts = ["wire money wire", "remote engineer benefits", "wire bonus"];
        let fitted = CountVectorizer::fit_counts(&texts, params(100));
        let again = fitted.vectorizer.transform(&texts);
        assert_eq!(fitted.counts, again);

        let wire = fitted.vectorizer.vocabulary().get("wire").unwrap();
        assert_eq!(fitted.document_frequency[wire], 2);
        assert_eq!(fitted.counts.get(0, wire), Some(&2.0));
    }

    #[test]
    fn test_out_of_vocabulary_is_ignored() {
        let cv = CountVectorizer::fit(&["wire money"], params(100));
        assert!(cv.transform_one("completely unrelated words").is_empty());
        assert_eq!(cv.transform(&["completely unrelated"]).nnz(), 0);
    }
}
