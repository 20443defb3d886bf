use core::fmt;

use serde::{Deserialize, Serialize};

use crate::explain::{Attribution, Flag};
use crate::model::CLASSIFICATION_THRESHOLD;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Real,
    Fake,
}

impl Classification {
    #[must_use]
    pub fn is_real(&self) -> bool {
        matches!(self, Self::Real)
    }

    #[must_use]
    pub fn is_fake(&self) -> bool {
        matches!(self, Self::Fake)
    }

    /// 0.0 for real, 1.0 for fake; the regression target.
    #[must_use]
    pub(crate) fn target(self) -> f64 {
        match self {
            Self::Real => 0.0,
            Self::Fake => 1.0,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real => write!(f, "real"),
            Self::Fake => write!(f, "fake"),
        }
    }
}

impl From<Classification> for i64 {
    fn from(class: Classification) -> Self {
        match class {
            Classification::Real => 0,
            Classification::Fake => 1,
        }
    }
}

impl From<bool> for Classification {
    /// `true` means fake.
    fn from(is_fake: bool) -> Self {
        if is_fake { Self::Fake } else { Self::Real }
    }
}

/// Class probabilities for one posting.
/// 0: P(real), 1: P(fake)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction(f64, f64);

impl Prediction {
    /// Build from P(fake); P(real) is its complement.
    #[must_use]
    pub fn from_fake_probability(fake_prob: f64) -> Self {
        Self(1.0 - fake_prob, fake_prob)
    }

    #[must_use]
    pub fn real_probability(&self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn fake_probability(&self) -> f64 {
        self.1
    }

    /// `Fake` iff P(fake) >= 0.5.
    #[inline]
    #[must_use]
    pub fn classification(&self) -> Classification {
        self.classification_at(CLASSIFICATION_THRESHOLD)
    }

    #[inline]
    #[must_use]
    pub fn classification_at(&self, threshold: f64) -> Classification {
        if self.1 >= threshold {
            Classification::Fake
        } else {
            Classification::Real
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P(real)={:.3}, P(fake)={:.3}", self.0, self.1)
    }
}

/// Result of screening one posting: probabilities plus the words that
/// drove them.
#[derive(Debug, Clone, PartialEq)]
pub struct Screening {
    pub prediction: Prediction,
    pub attribution: Attribution,
}

impl Screening {
    #[must_use]
    pub fn classification(&self) -> Classification {
        self.prediction.classification()
    }

    #[must_use]
    pub fn red_flags(&self) -> &[Flag] {
        &self.attribution.red_flags
    }

    #[must_use]
    pub fn green_flags(&self) -> &[Flag] {
        &self.attribution.green_flags
    }

    /// Wire payload with percentages rounded to two decimals and flag
    /// scores rounded to three.
    #[must_use]
    pub fn to_response(&self) -> ScreeningResponse {
        let flags = |flags: &[Flag]| {
            flags
                .iter()
                .map(|flag| (flag.word.clone(), round_to(flag.score, 3)))
                .collect()
        };
        ScreeningResponse {
            prediction: self.classification().into(),
            probabilities: Probabilities {
                real: round_to(self.prediction.real_probability() * 100.0, 2),
                fake: round_to(self.prediction.fake_probability() * 100.0, 2),
            },
            red_flags: flags(self.red_flags()),
            green_flags: flags(self.green_flags()),
            wordcloud: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Probabilities {
    pub real: f64,
    pub fake: f64,
}

/// Serialized shape of a screening result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningResponse {
    /// 0 = real, 1 = fake
    pub prediction: i64,
    pub probabilities: Probabilities,
    pub red_flags: Vec<(String, f64)>,
    pub green_flags: Vec<(String, f64)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wordcloud: Option<String>,
}

impl ScreeningResponse {
    #[must_use]
    pub fn with_wordcloud(mut self, svg: Option<String>) -> Self {
        self.wordcloud = svg;
        self
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
