//! Word-level attribution.
//!
//! Explains a prediction by looking up the global coefficient of every
//! distinct word in the posting that is also a standalone vocabulary entry.
//! A word therefore gets the same score in every posting it appears in.
//! Bigram features are not surfaced, even when they carry more weight than
//! the words they contain.

use std::cmp::Ordering;

use ahash::AHashSet;
use job_screen_preprocessing::pre_processor::{Vocabulary, word_tokens};
use serde::{Deserialize, Serialize};

use crate::model::{FLAG_THRESHOLD, MAX_FLAGS, ModelWeights};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplainParams {
    /// Words need a coefficient above `+threshold` (red) or below
    /// `-threshold` (green) to be reported.
    pub threshold: f64,
    /// Maximum length of each flag list.
    pub top_k: usize,
}

impl Default for ExplainParams {
    fn default() -> Self {
        Self {
            threshold: FLAG_THRESHOLD,
            top_k: MAX_FLAGS,
        }
    }
}

/// A word and its trained coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flag {
    pub word: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attribution {
    /// Fake indicators, strongest (most positive) first.
    pub red_flags: Vec<Flag>,
    /// Real indicators, strongest (most negative) first.
    pub green_flags: Vec<Flag>,
}

/// Rank the words of `cleaned_text` by their trained coefficients.
#[must_use]
pub fn explain(
    cleaned_text: &str,
    vocabulary: &Vocabulary,
    weights: &ModelWeights,
    params: &ExplainParams,
) -> Attribution {
    let words = word_tokens(cleaned_text).collect::<AHashSet<_>>();

    let mut attribution = Attribution::default();
    for word in words {
        let Some(score) = vocabulary
            .get(word)
            .and_then(|feature| weights.coefficient(feature))
        else {
            continue;
        };
        let flag = Flag {
            word: word.to_owned(),
            score,
        };
        if score > params.threshold {
            attribution.red_flags.push(flag);
        } else if score < -params.threshold {
            attribution.green_flags.push(flag);
        }
    }

    // Ties are ordered by word so the output does not depend on hash order
    attribution.red_flags.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.word.cmp(&b.word))
    });
    attribution.green_flags.sort_by(|a, b| {
        a.score
            .partial_cmp(&b.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.word.cmp(&b.word))
    });
    attribution.red_flags.truncate(params.top_k);
    attribution.green_flags.truncate(params.top_k);
    attribution
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(entries: &[(&str, f64)]) -> (Vocabulary, ModelWeights) {
        let vocabulary = Vocabulary::from_terms(entries.iter().map(|(term, _)| *term));
        let weights = ModelWeights::new(entries.iter().map(|(_, w)| *w).collect(), 0.0);
        (vocabulary, weights)
    }

    #[test]
    fn test_wire_ranks_above_urgent() {
        let (vocab, weights) = setup(&[
            ("interview", -0.2),
            ("money", 0.3),
            ("required", 0.1),
            ("urgent", 0.8),
            ("wire", 1.2),
            ("wire money", 2.5),
        ]);
        let attribution = explain(
            "urgent wire money now no interview required",
            &vocab,
            &weights,
            &ExplainParams::default(),
        );
        let words: Vec<_> = attribution.red_flags.iter().map(|f| f.word.as_str()).collect();
        assert_eq!(words, vec!["wire", "urgent"]);
        assert!((attribution.red_flags[0].score - 1.2).abs() < 1e-12);
        assert!(attribution.green_flags.is_empty());
    }

    #[test]
    fn test_repeated_word_reported_once() {
        let (vocab, weights) = setup(&[("wire", 1.2), ("benefits", -0.9)]);
        let attribution = explain(
            "wire wire benefits wire benefits",
            &vocab,
            &weights,
            &ExplainParams::default(),
        );
        assert_eq!(attribution.red_flags.len(), 1);
        assert_eq!(attribution.green_flags.len(), 1);
        assert_eq!(attribution.green_flags[0].word, "benefits");
    }

    #[test]
    fn test_threshold_is_strict() {
        let (vocab, weights) = setup(&[("edge", 0.5), ("low", -0.5), ("mid", 0.49)]);
        let attribution = explain("edge low mid", &vocab, &weights, &ExplainParams::default());
        assert!(attribution.red_flags.is_empty());
        assert!(attribution.green_flags.is_empty());
    }

    #[test]
    fn test_ordering_and_truncation() {
        let entries: Vec<(String, f64)> = (0..15)
            .map(|i| (format!("fake{i:02}"), 0.6 + f64::from(i) * 0.1))
            .chain((0..15).map(|i| (format!("real{i:02}"), -0.6 - f64::from(i) * 0.1)))
            .collect();
        let vocab = Vocabulary::from_terms(entries.iter().map(|(t, _)| t.clone()));
        let weights = ModelWeights::new(entries.iter().map(|(_, w)| *w).collect(), 0.0);
        let text = entries
            .iter()
            .map(|(t, _)| t.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let attribution = explain(&text, &vocab, &weights, &ExplainParams::default());
        assert_eq!(attribution.red_flags.len(), 10);
        assert_eq!(attribution.green_flags.len(), 10);
        assert_eq!(attribution.red_flags[0].word, "fake14");
        assert_eq!(attribution.green_flags[0].word, "real14");
        assert!(attribution.red_flags.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(attribution.green_flags.windows(2).all(|w| w[0].score <= w[1].score));
    }

    #[test]
    fn test_flags_come_from_the_text_and_are_disjoint() {
        let (vocab, weights) = setup(&[("wire", 1.2), ("salary", -1.0), ("cash", 0.9)]);
        let text = "salary paid by wire";
        let attribution = explain(text, &vocab, &weights, &ExplainParams::default());
        let words: AHashSet<_> = word_tokens(text).collect();
        for flag in attribution.red_flags.iter().chain(&attribution.green_flags) {
            assert!(words.contains(flag.word.as_str()));
        }
        assert!(
            attribution
                .red_flags
                .iter()
                .all(|r| attribution.green_flags.iter().all(|g| g.word != r.word))
        );
        assert!(!attribution.red_flags.iter().any(|f| f.word == "cash"));
    }

    #[test]
    fn test_custom_params() {
        let (vocab, weights) = setup(&[("wire", 1.2), ("urgent", 0.8), ("bonus", 0.3)]);
        let params = ExplainParams {
            threshold: 0.2,
            top_k: 2,
        };
        let attribution = explain("bonus urgent wire", &vocab, &weights, &params);
        let words: Vec<_> = attribution.red_flags.iter().map(|f| f.word.as_str()).collect();
        assert_eq!(words, vec!["wire", "urgent"]);
    }
}
