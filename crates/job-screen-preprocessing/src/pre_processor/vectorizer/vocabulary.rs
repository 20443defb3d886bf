use ahash::HashMap;

/// Ordered mapping from n-gram to feature index.
///
/// Indices are dense (`0..len`) and follow the order of `terms`.
#[cfg_attr(feature = "bincode", derive(bincode::Encode, bincode::Decode))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Vocabulary {
    terms: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Build a vocabulary from terms in feature order. Repeated terms keep
    /// their first position.
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vocabulary = Self::default();
        for term in terms {
            let term = term.into();
            if !vocabulary.index.contains_key(&term) {
                vocabulary.index.insert(term.clone(), vocabulary.terms.len());
                vocabulary.terms.push(term);
            }
        }
        vocabulary
    }

    #[must_use]
    pub fn get(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    #[must_use]
    pub fn contains(&self, term: &str) -> bool {
        self.index.contains_key(term)
    }

    #[must_use]
    pub fn term(&self, idx: usize) -> Option<&str> {
        self.terms.get(idx).map(String::as_str)
    }

    /// Terms in feature-index order.
    #[must_use]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Whether `index` and `terms` describe the same dense mapping. Only a
    /// hand-edited or corrupted serialized vocabulary can fail this.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.index.len() == self.terms.len()
            && self
                .index
                .iter()
                .all(|(term, &idx)| self.terms.get(idx).is_some_and(|t| t == term))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.terms
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.as_str(), idx))
    }
}
