//! Offline training: dataset ingestion, seeded split, fitting and reporting.

use std::{fs, path::Path};

use job_screen_preprocessing::pre_processor::{TfidfVectorizer, VectorizerParams, normalize};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

mod dataset;
mod report;
mod split;

pub use dataset::{DatasetSchema, LabeledPosting, load_csv, read_csv};
pub use report::{DescriptiveReport, FileReportSink, PerClass, ReportSink};
pub use split::{Split, stratified_split};

use crate::{
    Classification,
    artifact::TrainedArtifact,
    error::TrainError,
    model::{ClassifierParams, LinearClassifier},
};

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_TEST_SIZE: f64 = 0.2;

/// Everything that controls a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub vectorizer: VectorizerParams,
    pub classifier: ClassifierParams,
    /// Fraction of each class held out for evaluation, in `[0, 1)`.
    pub test_size: f64,
    pub seed: u64,
    pub schema: DatasetSchema,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            vectorizer: VectorizerParams::default(),
            classifier: ClassifierParams::default(),
            test_size: DEFAULT_TEST_SIZE,
            seed: DEFAULT_SEED,
            schema: DatasetSchema::default(),
        }
    }
}

impl TrainConfig {
    /// Read a config from a JSON file; absent fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, TrainError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            TrainError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            TrainError::InvalidConfig(format!("cannot parse {}: {e}", path.display()))
        })
    }

    pub fn validate(&self) -> Result<(), TrainError> {
        if !(0.0..1.0).contains(&self.test_size) {
            return Err(TrainError::InvalidConfig(format!(
                "test_size must be in [0, 1), got {}",
                self.test_size
            )));
        }
        self.vectorizer
            .validate()
            .map_err(TrainError::InvalidConfig)?;
        self.classifier
            .validate()
            .map_err(TrainError::InvalidConfig)?;
        Ok(())
    }
}

/// How an artifact was trained. Stored inside the artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct TrainingSummary {
    pub real_count: usize,
    pub fake_count: usize,
    pub train_size: usize,
    pub test_size: usize,
    pub train_accuracy: Option<f64>,
    /// `None` when nothing was held out.
    pub test_accuracy: Option<f64>,
    pub seed: u64,
}

#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub artifact: TrainedArtifact,
    pub report: DescriptiveReport,
}

pub struct Trainer {
    config: TrainConfig,
}

impl Trainer {
    #[must_use]
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Fit a vectorizer and classifier on `postings`.
    ///
    /// Fails on an empty corpus, a corpus with a single class, an invalid
    /// config, or when no term survives vectorization. The same postings and config always give the same artifact.
    pub fn train(&self, postings: &[LabeledPosting]) -> Result<TrainOutcome, TrainError> {
        self.config.validate()?;
        if postings.is_empty() {
            return Err(TrainError::EmptyCorpus);
        }
        let labels = postings.iter().map(|p| p.label).collect::<Vec<_>>();
        let fake_count = labels.iter().filter(|l| l.is_fake()).count();
        let real_count = labels.len() - fake_count;
        match (real_count, fake_count) {
            (_, 0) => {
                return Err(TrainError::SingleClass {
                    class: Classification::Real,
                });
            }
            (0, _) => {
                return Err(TrainError::SingleClass {
                    class: Classification::Fake,
                });
            }
            _ => {}
        }
        info!(
            postings = postings.len(),
            real = real_count,
            fake = fake_count,
            "Starting training"
        );

        let cleaned = postings
            .par_iter()
            .map(|p| normalize(&p.text))
            .collect::<Vec<_>>();
        let empty = cleaned.iter().filter(|t| t.is_empty()).count();
        if empty > 0 {
            warn!(empty, "Postings with no usable text after normalization");
        }

        let split = stratified_split(&labels, self.config.test_size, self.config.seed);
        let select = |rows: &[usize]| {
            (
                rows.iter().map(|&i| cleaned[i].as_str()).collect::<Vec<_>>(),
                rows.iter().map(|&i| labels[i]).collect::<Vec<_>>(),
            )
        };
        let (train_texts, train_labels) = select(&split.train);
        let (test_texts, test_labels) = select(&split.test);
        info!(
            train = train_texts.len(),
            test = test_texts.len(),
            seed = self.config.seed,
            "Split corpus"
        );

        let (vectorizer, train_features) =
            TfidfVectorizer::fit_transform(&train_texts, self.config.vectorizer.clone());
        info!(num_features = vectorizer.num_features(), "Vectorizer fitted");
        if vectorizer.num_features() == 0 {
            return Err(TrainError::EmptyVocabulary);
        }

        let mut classifier = LinearClassifier::new(self.config.classifier.clone());
        classifier.fit(&train_features, &train_labels)?;

        let train_accuracy = classifier.accuracy(&train_features, &train_labels)?;
        let test_accuracy = if test_texts.is_empty() {
            None
        } else {
            classifier.accuracy(&vectorizer.transform(&test_texts), &test_labels)?
        };
        info!(?train_accuracy, ?test_accuracy, "Classifier fitted");

        let summary = TrainingSummary {
            real_count,
            fake_count,
            train_size: train_texts.len(),
            test_size: test_texts.len(),
            train_accuracy,
            test_accuracy,
            seed: self.config.seed,
        };
        let artifact = TrainedArtifact::new(vectorizer, classifier, summary)?;

        let categories = postings
            .iter()
            .map(|p| p.category.clone())
            .collect::<Vec<_>>();
        let report = DescriptiveReport::build(&cleaned, &labels, &categories);

        Ok(TrainOutcome { artifact, report })
    }

    /// Train, publish the report to `sink`, then save the artifact to
    /// `output`. Nothing is written to `output` unless every step succeeds.
    pub fn run(
        &self,
        postings: &[LabeledPosting],
        output: impl AsRef<Path>,
        sink: Option<&dyn ReportSink>,
    ) -> Result<TrainOutcome, TrainError> {
        let outcome = self.train(postings)?;
        if let Some(sink) = sink {
            sink.publish(&outcome.report).map_err(TrainError::Report)?;
        }
        outcome.artifact.save(output)?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<LabeledPosting> {
        let real = [
            "Senior engineer building payment services in Rust, health insurance",
            "Data analyst role, SQL and Python required, dental benefits",
            "Frontend developer with React experience, pension plan and insurance",
            "Nurse position at regional hospital, shift allowance and benefits",
            "Accountant for audit team, CPA preferred, health insurance",
            "Warehouse supervisor managing inventory, overtime and benefits",
        ];
        let fake = [
            "Urgent! Wire money to start, earn cash from home today",
            "Earn cash fast, no experience, wire transfer fee required",
        ];
        real.iter()
            .map(|t| LabeledPosting::new(*t, Classification::Real).with_category("Tech"))
            .chain(
                fake.iter()
                    .map(|t| LabeledPosting::new(*t, Classification::Fake).with_category("Other")),
            )
            .collect()
    }

    fn small_config() -> TrainConfig {
        TrainConfig {
            classifier: ClassifierParams {
                max_iter: 300,
                ..ClassifierParams::default()
            },
            test_size: 0.25,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_rejects_empty_and_single_class() {
        let trainer = Trainer::new(TrainConfig::default());
        assert!(matches!(trainer.train(&[]), Err(TrainError::EmptyCorpus)));

        let only_real = vec![
            LabeledPosting::new("engineer role", Classification::Real),
            LabeledPosting::new("analyst role", Classification::Real),
        ];
        assert!(matches!(
            trainer.train(&only_real),
            Err(TrainError::SingleClass {
                class: Classification::Real
            })
        ));
    }

    #[test]
    fn test_rejects_corpus_without_features() {
        let postings = vec![
            LabeledPosting::new("the and of a", Classification::Real),
            LabeledPosting::new("!!! ...", Classification::Real),
            LabeledPosting::new("is it to be", Classification::Fake),
            LabeledPosting::new("", Classification::Fake),
        ];
        assert!(matches!(
            Trainer::new(small_config()).train(&postings),
            Err(TrainError::EmptyVocabulary)
        ));
    }

    #[test]
    fn test_rejects_invalid_test_size() {
        let config = TrainConfig {
            test_size: 1.0,
            ..TrainConfig::default()
        };
        assert!(matches!(
            Trainer::new(config).train(&corpus()),
            Err(TrainError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_train_produces_consistent_artifact() {
        let outcome = Trainer::new(small_config()).train(&corpus()).unwrap();
        let summary = outcome.artifact.summary();
        assert_eq!(summary.real_count, 6);
        assert_eq!(summary.fake_count, 2);
        // round(6 * 0.25) = 2 real, round(2 * 0.25) = 1 fake
        assert_eq!(summary.test_size, 3);
        assert_eq!(summary.train_size, 5);
        assert!(summary.test_accuracy.is_some());
        assert_eq!(
            outcome.artifact.weights().unwrap().num_features(),
            outcome.artifact.vocabulary().len()
        );
        assert_eq!(outcome.report.class_counts, PerClass { real: 6, fake: 2 });
        assert_eq!(outcome.report.top_categories.fake, vec![("Other".to_string(), 2)]);
    }

    #[test]
    fn test_no_holdout_means_no_test_accuracy() {
        let config = TrainConfig {
            test_size: 0.0,
            ..small_config()
        };
        let outcome = Trainer::new(config).train(&corpus()).unwrap();
        assert_eq!(outcome.artifact.summary().test_size, 0);
        assert_eq!(outcome.artifact.summary().test_accuracy, None);
        assert!(outcome.artifact.summary().train_accuracy.is_some());
    }

    #[test]
    fn test_config_json_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"seed": 7, "classifier": {"c": 0.5}}"#).unwrap();
        let config = TrainConfig::from_json_file(&path).unwrap();
        assert_eq!(config.seed, 7);
        assert!((config.classifier.c - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.classifier.max_iter, 2000);
        assert!((config.test_size - DEFAULT_TEST_SIZE).abs() < f64::EPSILON);
        assert_eq!(config.vectorizer, VectorizerParams::default());
    }

    #[test]
    fn test_run_writes_artifact_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("model.bin");
        let sink = FileReportSink::new(dir.path().join("report"));
        let outcome = Trainer::new(small_config())
            .run(&corpus(), &model, Some(&sink))
            .unwrap();

        assert_eq!(TrainedArtifact::load(&model).unwrap(), outcome.artifact);
        assert!(dir.path().join("report/training_report.json").exists());
    }

    struct FailingSink;

    impl ReportSink for FailingSink {
        fn publish(&self, _report: &DescriptiveReport) -> std::io::Result<()> {
            Err(std::io::Error::other("disk full"))
        }
    }

    #[test]
    fn test_failed_report_leaves_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("model.bin");
        let result = Trainer::new(small_config()).run(&corpus(), &model, Some(&FailingSink));

        assert!(matches!(result, Err(TrainError::Report(_))));
        assert!(!model.exists());
    }
}
