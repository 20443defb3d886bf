use std::path::PathBuf;

use thiserror::Error;

/// Failures of the linear classifier.
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("model not ready: the classifier has not been fitted or loaded")]
    NotReady,

    #[error("feature dimension mismatch: model expects {expected} features, got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("cannot fit a classifier on an empty training set")]
    EmptyTrainingSet,

    #[error("label count mismatch: {rows} feature rows but {labels} labels")]
    LabelCountMismatch { rows: usize, labels: usize },
}

/// Rejections and failures of a single screening request.
#[derive(Error, Debug)]
pub enum ServeError {
    /// The caller sent nothing to classify.
    #[error("no input: the job posting text is empty")]
    NoInput,

    /// No trained artifact is loaded; the request itself may be fine.
    #[error("model unavailable: no trained artifact is loaded")]
    ModelUnavailable,

    #[error("prediction error: {0}")]
    Prediction(#[source] ClassifierError),
}

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode artifact: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("failed to decode artifact: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("JSON artifact error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not a job-screen artifact (bad magic bytes)")]
    BadMagic,

    #[error("unsupported artifact format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("failed to publish artifact to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("artifact is inconsistent: {0}")]
    Inconsistent(String),
}

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset has no column named {0:?}")]
    MissingColumn(String),

    #[error("none of the text columns {0:?} exist in the dataset")]
    NoTextColumns(Vec<String>),

    #[error("row {row}: cannot parse label {value:?} (expected 0/1, true/false or real/fake)")]
    InvalidLabel { row: usize, value: String },
}

#[derive(Error, Debug)]
pub enum TrainError {
    #[error("training corpus is empty")]
    EmptyCorpus,

    #[error("training corpus only contains {class} postings; both real and fake are required")]
    SingleClass { class: crate::Classification },

    #[error("invalid training configuration: {0}")]
    InvalidConfig(String),

    #[error("no terms survived vectorization; the corpus has no usable vocabulary")]
    EmptyVocabulary,

    #[error("classifier training failed: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("failed to save artifact: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("failed to write training report: {0}")]
    Report(#[source] std::io::Error),
}
