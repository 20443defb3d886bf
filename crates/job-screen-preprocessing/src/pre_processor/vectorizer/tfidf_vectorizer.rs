use sprs::{CsMat, CsVec};
use tracing::debug;

use super::{count_vectorizer::CountVectorizer, params::VectorizerParams, vocabulary::Vocabulary};

#[cfg_attr(feature = "bincode", derive(bincode::Encode, bincode::Decode))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct TfidfVectorizer {
    count_vectorizer: CountVectorizer,
    idf: Vec<f64>,
}

/// Smoothed inverse document frequency: `ln((n_docs + 1) / (df + 1)) + 1`.
#[inline]
fn smoothed_idf(n_docs: usize, doc_freq: usize) -> f64 {
    ((n_docs as f64 + 1.0) / (doc_freq as f64 + 1.0)).ln() + 1.0
}

impl TfidfVectorizer {
    pub fn fit<T: AsRef<str> + Sync>(texts: &[T], params: VectorizerParams) -> Self {
        Self::fit_transform(texts, params).0
    }

    /// Fit on `texts` and return their TF-IDF matrix without tokenizing twice.
    pub fn fit_transform<T: AsRef<str> + Sync>(
        texts: &[T],
        params: VectorizerParams,
    ) -> (Self, CsMat<f64>) {
        debug!(num_texts = texts.len(), "Fitting TfidfVectorizer");
        let fitted = CountVectorizer::fit_counts(texts, params);

        debug!("Calculating IDF values");
        let idf = fitted
            .document_frequency
            .iter()
            .map(|&doc_freq| smoothed_idf(texts.len(), doc_freq))
            .collect();
        debug!("IDF calculation complete");

        let vectorizer = Self {
            count_vectorizer: fitted.vectorizer,
            idf,
        };
        let matrix = vectorizer.weight_counts(fitted.counts);
        (vectorizer, matrix)
    }

    /// Assemble a vectorizer from an explicit vocabulary and IDF weights.
    ///
    /// # Panics
    /// If `idf` does not have one entry per vocabulary term.
    #[must_use]
    pub fn from_parts(params: VectorizerParams, vocabulary: Vocabulary, idf: Vec<f64>) -> Self {
        assert_eq!(
            vocabulary.len(),
            idf.len(),
            "idf must have one weight per vocabulary term"
        );
        Self {
            count_vectorizer: CountVectorizer::from_parts(params, vocabulary),
            idf,
        }
    }

    #[inline]
    fn tf(&self, count: f64) -> f64 {
        if self.params().sublinear_tf() {
            1.0 + count.ln()
        } else {
            count
        }
    }

    /// Apply tf scaling, IDF weighting and L2 normalization to every row.
    fn weight_counts(&self, mut tf_matrix: CsMat<f64>) -> CsMat<f64> {
        for mut row_vec in tf_matrix.outer_iterator_mut() {
            for (col_idx, val) in row_vec.iter_mut() {
                *val = self.tf(*val) * self.idf[col_idx];
            }
            let norm = row_vec.iter().map(|(_, &v)| v * v).sum::<f64>().sqrt();
            // Rows with no in-vocabulary terms stay zero
            if norm > 0.0 {
                for (_, val) in row_vec.iter_mut() {
                    *val /= norm;
                }
            }
        }
        tf_matrix
    }

    /// TF-IDF matrix with one L2-normalized row per text.
    pub fn transform<T: AsRef<str> + Sync>(&self, texts: &[T]) -> CsMat<f64> {
        debug!(
            num_texts = texts.len(),
            "Transforming texts using TfidfVectorizer"
        );
        self.weight_counts(self.count_vectorizer.transform(texts))
    }

    /// TF-IDF feature vector of one text. Unit length, or the zero vector
    /// when no n-gram of the text is in the vocabulary.
    pub fn transform_one(&self, text: &str) -> CsVec<f64> {
        let entries = self.count_vectorizer.transform_one(text);
        let (indices, mut data): (Vec<usize>, Vec<f64>) = entries
            .into_iter()
            .map(|(col, count)| (col, self.tf(count) * self.idf[col]))
            .unzip();

        let norm = data.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for val in &mut data {
                *val /= norm;
            }
        }
        CsVec::new(self.num_features(), indices, data)
    }

    pub fn num_features(&self) -> usize {
        self.count_vectorizer.num_features()
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        self.count_vectorizer.vocabulary()
    }

    /// Feature names in index order.
    pub fn feature_names(&self) -> &[String] {
        self.vocabulary().terms()
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    pub fn params(&self) -> &VectorizerParams {
        self.count_vectorizer.params()
    }
}

#[cfg(feature = "bincode")]
impl TfidfVectorizer {
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::error::EncodeError> {
        bincode::encode_to_vec(self, bincode::config::standard())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::error::DecodeError> {
        bincode::decode_from_slice(bytes, bincode::config::standard()).map(|(value, _)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORPUS: [&str; 4] = [
        "urgent wire money now no interview required",
        "senior software engineer health insurance dental",
        "software engineer remote team benefits",
        "wire transfer fee required before start",
    ];

    fn fitted() -> TfidfVectorizer {
        TfidfVectorizer::fit(&CORPUS, VectorizerParams::default())
    }

    fn l2(v: &CsVec<f64>) -> f64 {
        v.iter().map(|(_, &x)| x * x).sum::<f64>().sqrt()
    }

    #[test]
    fn test_rows_are_unit_norm() {
        let vectorizer = fitted();
        let matrix = vectorizer.transform(&CORPUS);
        assert_eq!(matrix.rows(), CORPUS.len());
        for row in matrix.outer_iterator() {
            let norm = row.iter().map(|(_, &v)| v * v).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_out_of_vocabulary_document_is_zero_vector() {
        let vectorizer = fitted();
        let vec = vectorizer.transform_one("quantum astrophysics");
        assert_eq!(vec.dim(), vectorizer.num_features());
        assert_eq!(vec.nnz(), 0);

        let vec = vectorizer.transform_one("");
        assert_eq!(vec.nnz(), 0);
    }

    #[test]
    fn test_transform_one_matches_batch_row() {
        let vectorizer = fitted();
        let text = "Wire money to the engineer!";
        let single = vectorizer.transform_one(text);
        let batch = vectorizer.transform(&[text]);
        let row = batch.outer_view(0).unwrap();
        assert_eq!(single.indices(), row.indices());
        for (a, b) in single.data().iter().zip(row.data()) {
            assert!((a - b).abs() < 1e-12);
        }
        assert!((l2(&single) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rarer_terms_get_higher_idf() {
        let vectorizer = fitted();
        let vocab = vectorizer.vocabulary();
        let common = vectorizer.idf()[vocab.get("software").unwrap()];
        let rare = vectorizer.idf()[vocab.get("dental").unwrap()];
        assert!(rare > common);
        // df = 2 of 4 documents
        assert!((common - ((5.0_f64 / 3.0).ln() + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_fit_is_deterministic() {
        assert_eq!(fitted(), fitted());
    }

    #[test]
    fn test_sublinear_tf_dampens_repeats() {
        let corpus = ["wire wire wire wire money", "money bonus"];
        let plain = TfidfVectorizer::fit(&corpus, VectorizerParams::new(1..=1, 1.0, 1.0, 10, false));
        let damped = TfidfVectorizer::fit(&corpus, VectorizerParams::new(1..=1, 1.0, 1.0, 10, true));
        let wire = plain.vocabulary().get("wire").unwrap();
        let p = plain.transform_one(corpus[0]);
        let d = damped.transform_one(corpus[0]);
        assert!(d.get(wire).unwrap() < p.get(wire).unwrap());
    }

    #[cfg(feature = "bincode")]
    #[test]
    fn test_bytes_round_trip() {
        let vectorizer = fitted();
        let bytes = vectorizer.to_bytes().unwrap();
        assert_eq!(TfidfVectorizer::from_bytes(&bytes).unwrap(), vectorizer);
    }
}
