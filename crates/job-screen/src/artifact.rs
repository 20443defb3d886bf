//! The persisted unit of a trained model.
//!
//! Binary files start with the magic bytes `JSCR` and a little-endian `u32`
//! format version, followed by the bincode encoding of the artifact. Paths
//! ending in `.json` are written and read as JSON instead.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use job_screen_preprocessing::pre_processor::{TfidfVectorizer, Vocabulary};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::{
    error::ArtifactError,
    model::{LinearClassifier, ModelWeights},
    train::TrainingSummary,
};

const MAGIC: &[u8; 4] = b"JSCR";
pub const FORMAT_VERSION: u32 = 1;

/// Fitted vectorizer and classifier, plus how they were trained.
///
/// Immutable once built; share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct TrainedArtifact {
    vectorizer: TfidfVectorizer,
    classifier: LinearClassifier,
    summary: TrainingSummary,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ArtifactError + '_ {
    move |source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

impl TrainedArtifact {
    /// Bundle a fitted vectorizer and classifier.
    ///
    /// Fails if the classifier is unfitted or its weights do not cover the
    /// vectorizer's features exactly.
    pub fn new(
        vectorizer: TfidfVectorizer,
        classifier: LinearClassifier,
        summary: TrainingSummary,
    ) -> Result<Self, ArtifactError> {
        let artifact = Self {
            vectorizer,
            classifier,
            summary,
        };
        artifact.validate()?;
        Ok(artifact)
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        let weights = self
            .classifier
            .weights()
            .map_err(|e| ArtifactError::Inconsistent(e.to_string()))?;
        if weights.num_features() != self.vectorizer.num_features() {
            return Err(ArtifactError::Inconsistent(format!(
                "classifier has {} weights but the vocabulary has {} features",
                weights.num_features(),
                self.vectorizer.num_features()
            )));
        }
        if !self.vectorizer.vocabulary().is_consistent() {
            return Err(ArtifactError::Inconsistent(
                "vocabulary index does not match its terms".to_string(),
            ));
        }
        if self.vectorizer.idf().len() != self.vectorizer.num_features() {
            return Err(ArtifactError::Inconsistent(
                "IDF length does not match the vocabulary".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    #[must_use]
    pub fn classifier(&self) -> &LinearClassifier {
        &self.classifier
    }

    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        self.vectorizer.vocabulary()
    }

    /// Trained weights. Always present: construction rejects unfitted
    /// classifiers.
    #[must_use]
    pub fn weights(&self) -> Option<&ModelWeights> {
        self.classifier.weights().ok()
    }

    #[must_use]
    pub fn summary(&self) -> &TrainingSummary {
        &self.summary
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ArtifactError> {
        let mut bytes = Vec::with_capacity(1 << 16);
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bincode::encode_into_std_write(self, &mut bytes, bincode::config::standard())?;
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArtifactError> {
        let (magic, rest) = bytes.split_at_checked(MAGIC.len()).ok_or(ArtifactError::BadMagic)?;
        if magic != MAGIC {
            return Err(ArtifactError::BadMagic);
        }
        let (version, body) = rest.split_at_checked(4).ok_or(ArtifactError::BadMagic)?;
        let version = u32::from_le_bytes([version[0], version[1], version[2], version[3]]);
        if version != FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedVersion {
                found: version,
                expected: FORMAT_VERSION,
            });
        }
        let (artifact, _): (Self, usize) =
            bincode::decode_from_slice(body, bincode::config::standard())?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// Write the artifact to `path`.
    ///
    /// The bytes go to a temporary file in the same directory which is then
    /// renamed over `path`, so readers never observe a partial file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ArtifactError> {
        let path = path.as_ref();
        let bytes = if is_json(path) {
            serde_json::to_vec(self)?
        } else {
            self.to_bytes()?
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(io_error(&dir))?;

        let mut tmp = NamedTempFile::new_in(&dir).map_err(io_error(&dir))?;
        tmp.write_all(&bytes).map_err(io_error(tmp.path()))?;
        tmp.as_file().sync_all().map_err(io_error(path))?;
        debug!(tmp = %tmp.path().display(), "Artifact staged");
        tmp.persist(path).map_err(|e| ArtifactError::Persist {
            path: path.to_path_buf(),
            source: e.error,
        })?;

        info!(path = %path.display(), bytes = bytes.len(), "Artifact saved");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(io_error(path))?;
        let artifact = if is_json(path) {
            let artifact: Self = serde_json::from_slice(&bytes)?;
            artifact.validate()?;
            artifact
        } else {
            Self::from_bytes(&bytes)?
        };
        info!(
            path = %path.display(),
            num_features = artifact.vectorizer.num_features(),
            "Artifact loaded"
        );
        Ok(artifact)
    }
}
