//! # job-screen
//!
//! Fake job posting detection with word-level explanations.
//!
//! A TF-IDF vectorizer and a logistic regression classifier are trained
//! offline into a [`TrainedArtifact`]. A [`Screener`] holds the artifact and
//! turns raw posting text into a probability plus the words that pushed the
//! decision toward "fake" (red flags) or "real" (green flags).
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use job_screen::{Screener, TrainedArtifact};
//!
//! let artifact = TrainedArtifact::load("model.bin")?;
//! let screener = Screener::new(Arc::new(artifact));
//!
//! let screening = screener.serve("URGENT: wire money to secure your interview")?;
//! println!("P(fake) = {:.2}", screening.prediction.fake_probability());
//! for flag in screening.red_flags() {
//!     println!("red flag: {} ({:.3})", flag.word, flag.score);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Training
//!
//! ```no_run
//! use job_screen::train::{DatasetSchema, TrainConfig, Trainer, load_csv};
//!
//! let postings = load_csv("postings.csv", &DatasetSchema::default())?;
//! let outcome = Trainer::new(TrainConfig::default()).train(&postings)?;
//! outcome.artifact.save("model.bin")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[cfg(feature = "cli")]
pub mod cli;

pub mod artifact;
pub mod error;
pub mod explain;
pub mod model;
mod pipeline;
pub mod train;
pub mod wordcloud;

use std::sync::Arc;

pub use artifact::TrainedArtifact;
pub use error::{ArtifactError, ClassifierError, DatasetError, ServeError, TrainError};
pub use explain::{Attribution, ExplainParams, Flag, explain};
use job_screen_preprocessing::pre_processor::normalize;
pub use model::CLASSIFICATION_THRESHOLD;
pub use pipeline::{Classification, Prediction, Probabilities, Screening, ScreeningResponse};
use rayon::prelude::*;
use tracing::debug;
pub use wordcloud::render_wordcloud;

/// Request-level entry point: scores a posting and explains the score.
///
/// Cheap to clone and safe to share across threads; all clones read the same
/// immutable artifact.
///
/// # Examples
///
/// ```
/// use job_screen::{Screener, ServeError};
///
/// let screener = Screener::unavailable();
/// assert!(matches!(screener.serve("   "), Err(ServeError::NoInput)));
/// assert!(matches!(
///     screener.serve("Data entry from home"),
///     Err(ServeError::ModelUnavailable)
/// ));
/// ```
#[derive(Debug, Clone)]
pub struct Screener {
    artifact: Option<Arc<TrainedArtifact>>,
    explain: ExplainParams,
}

impl Screener {
    #[must_use]
    pub fn new(artifact: Arc<TrainedArtifact>) -> Self {
        Self {
            artifact: Some(artifact),
            explain: ExplainParams::default(),
        }
    }

    /// A screener with no model loaded. Every non-empty request fails with
    /// [`ServeError::ModelUnavailable`].
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            artifact: None,
            explain: ExplainParams::default(),
        }
    }

    #[must_use]
    pub fn with_explain_params(mut self, params: ExplainParams) -> Self {
        self.explain = params;
        self
    }

    #[must_use]
    pub fn artifact(&self) -> Option<&Arc<TrainedArtifact>> {
        self.artifact.as_ref()
    }

    /// Screen one raw posting.
    ///
    /// Empty or whitespace-only input is rejected before the artifact is
    /// touched. The text is normalized once and the same cleaned text feeds
    /// both scoring and attribution.
    pub fn serve(&self, raw: &str) -> Result<Screening, ServeError> {
        if raw.trim().is_empty() {
            return Err(ServeError::NoInput);
        }
        let artifact = self.artifact.as_ref().ok_or(ServeError::ModelUnavailable)?;

        let cleaned = normalize(raw);
        let features = artifact.vectorizer().transform_one(&cleaned);
        let classifier = artifact.classifier();
        let prediction = classifier
            .predict(features.view())
            .map_err(ServeError::Prediction)?;
        let weights = classifier.weights().map_err(ServeError::Prediction)?;
        let attribution = explain(&cleaned, artifact.vocabulary(), weights, &self.explain);

        debug!(
            nnz = features.nnz(),
            p_fake = prediction.fake_probability(),
            red = attribution.red_flags.len(),
            green = attribution.green_flags.len(),
            "Screened posting"
        );
        Ok(Screening {
            prediction,
            attribution,
        })
    }

    /// Screen many postings in parallel. Results keep the input order and
    /// each carries its own error.
    pub fn serve_batch<T: AsRef<str> + Sync>(
        &self,
        texts: &[T],
    ) -> Vec<Result<Screening, ServeError>> {
        texts.par_iter().map(|t| self.serve(t.as_ref())).collect()
    }
}
