use ahash::AHashMap as HashMap;
use dashmap::DashMap;
use indicatif::ParallelProgressIterator;
use rayon::prelude::*;

use crate::pre_processor::progress::progress_bar_setup;

/// Corpus-wide counts for a single n-gram.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TermStats {
    /// Occurrences across all documents.
    pub total: usize,
    /// Number of documents containing the n-gram.
    pub df: usize,
}

/// Count every n-gram of the requested sizes in one token stream.
/// N-grams are the tokens joined by a single space.
pub fn count_ngrams(tokens: &[String], ngram_sizes: &[usize]) -> HashMap<String, usize> {
    let mut ngram_counter = HashMap::new();

    for &n in ngram_sizes {
        for window in tokens.windows(n) {
            *ngram_counter.entry(window.join(" ")).or_insert(0) += 1;
        }
    }
    ngram_counter
}

/// Aggregate per-document n-gram counts into corpus statistics.
pub fn corpus_stats(
    ngram_maps: &[HashMap<String, usize>],
) -> DashMap<String, TermStats, ahash::RandomState> {
    let stats = DashMap::with_hasher(ahash::RandomState::default());

    ngram_maps
        .par_iter()
        .progress_with(progress_bar_setup(ngram_maps.len(), "Counting n-grams"))
        .for_each(|ngrams| {
            for (ngram, &count) in ngrams {
                let mut entry = stats.entry(ngram.clone()).or_insert_with(TermStats::default);
                entry.total += count;
                entry.df += 1;
            }
        });
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(s: &str) -> Vec<String> {
        s.split(' ').map(str::to_owned).collect()
    }

    #[test]
    fn test_unigrams_and_bigrams() {
        let counts = count_ngrams(&tokens("wire money wire money"), &[1, 2]);
        assert_eq!(counts["wire"], 2);
        assert_eq!(counts["money"], 2);
        assert_eq!(counts["wire money"], 2);
        assert_eq!(counts["money wire"], 1);
        assert_eq!(counts.len(), 4);
    }

    #[test]
    fn test_short_stream_has_no_bigrams() {
        let counts = count_ngrams(&tokens("wire"), &[1, 2]);
        assert_eq!(counts.len(), 1);
        assert!(count_ngrams(&[], &[1, 2]).is_empty());
    }

    #[test]
    fn test_corpus_stats_totals_and_df() {
        let maps = vec![
            count_ngrams(&tokens("wire wire money"), &[1]),
            count_ngrams(&tokens("wire bonus"), &[1]),
        ];
        let stats = corpus_stats(&maps);
        assert_eq!(*stats.get("wire").unwrap(), TermStats { total: 3, df: 2 });
        assert_eq!(*stats.get("money").unwrap(), TermStats { total: 1, df: 1 });
    }
}
