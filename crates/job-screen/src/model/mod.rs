//! Binary logistic regression over TF-IDF feature vectors.

use indicatif::ProgressStyle;
use job_screen_preprocessing::pre_processor::progress_bar;
use serde::{Deserialize, Serialize};
use sprs::{CsMat, CsVecView};
use tracing::{debug, info};

mod threshold;
pub use threshold::{CLASSIFICATION_THRESHOLD, FLAG_THRESHOLD, MAX_FLAGS};

use crate::{Classification, Prediction, error::ClassifierError};

/// How training examples are weighted by class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
#[serde(rename_all = "lowercase")]
pub enum ClassWeight {
    /// Every example counts once.
    None,
    /// Each example is weighted by `n_samples / (2 * n_samples_of_its_class)`,
    /// so both classes contribute equally to the gradient.
    Balanced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
#[serde(default)]
pub struct ClassifierParams {
    pub learning_rate: f64,
    pub max_iter: usize,
    /// Inverse L2 regularization strength; smaller values regularize more.
    pub c: f64,
    /// Stop once every gradient component is below this in absolute value.
    pub tolerance: f64,
    pub class_weight: ClassWeight,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self {
            learning_rate: 1.0,
            max_iter: 2000,
            c: 1.0,
            tolerance: 1e-6,
            class_weight: ClassWeight::Balanced,
        }
    }
}

impl ClassifierParams {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err("learning_rate must be a positive finite number".to_string());
        }
        if self.max_iter == 0 {
            return Err("max_iter must be at least 1".to_string());
        }
        if !(self.c > 0.0 && self.c.is_finite()) {
            return Err("c must be a positive finite number".to_string());
        }
        if self.tolerance < 0.0 {
            return Err("tolerance must not be negative".to_string());
        }
        Ok(())
    }
}

/// One coefficient per vocabulary feature plus a bias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct ModelWeights {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl ModelWeights {
    #[must_use]
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }

    /// Coefficients in feature-index order. Positive values push toward fake.
    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    #[must_use]
    pub fn coefficient(&self, feature: usize) -> Option<f64> {
        self.coefficients.get(feature).copied()
    }

    #[must_use]
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    #[must_use]
    pub fn num_features(&self) -> usize {
        self.coefficients.len()
    }

    fn score(&self, row: CsVecView<'_, f64>) -> f64 {
        self.intercept
            + row
                .iter()
                .map(|(idx, &x)| self.coefficients[idx] * x)
                .sum::<f64>()
    }
}

#[inline]
fn logistic(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Logistic regression classifier. Unusable for prediction until fitted or
/// built from known weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct LinearClassifier {
    params: ClassifierParams,
    weights: Option<ModelWeights>,
}

impl LinearClassifier {
    #[must_use]
    pub fn new(params: ClassifierParams) -> Self {
        Self {
            params,
            weights: None,
        }
    }

    #[must_use]
    pub fn from_weights(params: ClassifierParams, weights: ModelWeights) -> Self {
        Self {
            params,
            weights: Some(weights),
        }
    }

    #[must_use]
    pub fn params(&self) -> &ClassifierParams {
        &self.params
    }

    pub fn weights(&self) -> Result<&ModelWeights, ClassifierError> {
        self.weights.as_ref().ok_or(ClassifierError::NotReady)
    }

    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.weights.is_some()
    }

    fn sample_weights(&self, labels: &[Classification]) -> Vec<f64> {
        match self.params.class_weight {
            ClassWeight::None => vec![1.0; labels.len()],
            ClassWeight::Balanced => {
                let n = labels.len() as f64;
                let fake = labels.iter().filter(|l| l.is_fake()).count() as f64;
                let real = n - fake;
                labels
                    .iter()
                    .map(|label| {
                        let class_count = if label.is_fake() { fake } else { real };
                        n / (2.0 * class_count)
                    })
                    .collect()
            }
        }
    }

    /// Fit weights by full-batch gradient descent on the class-weighted,
    /// L2-penalized logistic loss
    /// `(1/n) Σ s_i ℓ_i + ‖w‖² / (2·c·n)`. The intercept is not penalized.
    pub fn fit(
        &mut self,
        features: &CsMat<f64>,
        labels: &[Classification],
    ) -> Result<(), ClassifierError> {
        if features.rows() != labels.len() {
            return Err(ClassifierError::LabelCountMismatch {
                rows: features.rows(),
                labels: labels.len(),
            });
        }
        if labels.is_empty() {
            return Err(ClassifierError::EmptyTrainingSet);
        }
        let converted;
        let csr = if features.is_csr() {
            features.view()
        } else {
            converted = features.to_other_storage();
            converted.view()
        };

        let n = labels.len() as f64;
        let num_features = features.cols();
        let sample_weights = self.sample_weights(labels);
        let targets = labels.iter().map(|l| l.target()).collect::<Vec<_>>();
        let penalty = 1.0 / (self.params.c * n);

        let mut weights = ModelWeights::new(vec![0.0; num_features], 0.0);
        let mut grad = vec![0.0; num_features];

        let pb = progress_bar(self.params.max_iter);
        pb.set_style(
            ProgressStyle::with_template("{msg} [{bar:40.green/white}] {pos}/{len}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb.set_message("Fitting classifier");

        debug!(
            samples = labels.len(),
            num_features,
            "Starting gradient descent"
        );
        let mut converged_at = None;
        for iteration in 0..self.params.max_iter {
            grad.iter_mut().for_each(|g| *g = 0.0);
            let mut grad_intercept = 0.0;

            for ((row, &y), &s) in csr.outer_iterator().zip(&targets).zip(&sample_weights) {
                let residual = s * (logistic(weights.score(row.view())) - y) / n;
                for (idx, &x) in row.iter() {
                    grad[idx] += residual * x;
                }
                grad_intercept += residual;
            }

            let mut max_abs = grad_intercept.abs();
            for (g, &w) in grad.iter_mut().zip(&weights.coefficients) {
                *g += penalty * w;
                max_abs = max_abs.max(g.abs());
            }

            if max_abs < self.params.tolerance {
                converged_at = Some(iteration);
                break;
            }

            let lr = self.params.learning_rate;
            for (w, g) in weights.coefficients.iter_mut().zip(&grad) {
                *w -= lr * g;
            }
            weights.intercept -= lr * grad_intercept;
            pb.inc(1);
        }
        pb.finish_and_clear();

        match converged_at {
            Some(iteration) => debug!(iteration, "Gradient descent converged"),
            None => info!(
                max_iter = self.params.max_iter,
                "Gradient descent stopped at max_iter before reaching tolerance"
            ),
        }
        self.weights = Some(weights);
        Ok(())
    }

    fn check_dim(weights: &ModelWeights, found: usize) -> Result<(), ClassifierError> {
        if weights.num_features() == found {
            Ok(())
        } else {
            Err(ClassifierError::DimensionMismatch {
                expected: weights.num_features(),
                found,
            })
        }
    }

    /// Raw linear score `w·x + b`.
    pub fn decision_function(&self, features: CsVecView<'_, f64>) -> Result<f64, ClassifierError> {
        let weights = self.weights()?;
        Self::check_dim(weights, features.dim())?;
        Ok(weights.score(features))
    }

    pub fn predict(&self, features: CsVecView<'_, f64>) -> Result<Prediction, ClassifierError> {
        self.decision_function(features)
            .map(|score| Prediction::from_fake_probability(logistic(score)))
    }

    pub fn predict_batch(&self, features: &CsMat<f64>) -> Result<Vec<Prediction>, ClassifierError> {
        let weights = self.weights()?;
        Self::check_dim(weights, features.cols())?;
        let converted;
        let csr = if features.is_csr() {
            features.view()
        } else {
            converted = features.to_other_storage();
            converted.view()
        };
        Ok(csr
            .outer_iterator()
            .map(|row| Prediction::from_fake_probability(logistic(weights.score(row))))
            .collect())
    }

    /// Fraction of rows whose predicted class matches `labels`.
    pub fn accuracy(
        &self,
        features: &CsMat<f64>,
        labels: &[Classification],
    ) -> Result<Option<f64>, ClassifierError> {
        if labels.is_empty() {
            return Ok(None);
        }
        let predictions = self.predict_batch(features)?;
        let correct = predictions
            .iter()
            .zip(labels)
            .filter(|(pred, label)| pred.classification() == **label)
            .count();
        Ok(Some(correct as f64 / labels.len() as f64))
    }
}

#[cfg(test)]
mod tests {
    use sprs::{CsVec, TriMat};

    use super::*;

    fn matrix(rows: &[&[(usize, f64)]], cols: usize) -> CsMat<f64> {
        let mut tri = TriMat::new((rows.len(), cols));
        for (r, row) in rows.iter().enumerate() {
            for &(c, v) in *row {
                tri.add_triplet(r, c, v);
            }
        }
        tri.to_csr()
    }

    fn toy() -> (CsMat<f64>, Vec<Classification>) {
        // feature 0 marks fake postings, feature 1 marks real ones
        let x = matrix(
            &[
                &[(0, 1.0)],
                &[(0, 0.8), (2, 0.6)],
                &[(1, 1.0)],
                &[(1, 0.6), (2, 0.8)],
                &[(1, 1.0)],
                &[(1, 0.8), (2, 0.6)],
            ],
            3,
        );
        let y = vec![
            Classification::Fake,
            Classification::Fake,
            Classification::Real,
            Classification::Real,
            Classification::Real,
            Classification::Real,
        ];
        (x, y)
    }

    #[test]
    fn test_predict_before_fit_is_not_ready() {
        let clf = LinearClassifier::new(ClassifierParams::default());
        let x = CsVec::new(3, vec![0], vec![1.0]);
        assert!(matches!(clf.predict(x.view()), Err(ClassifierError::NotReady)));
        assert!(matches!(clf.weights(), Err(ClassifierError::NotReady)));
    }

    #[test]
    fn test_fit_separates_toy_data() {
        let (x, y) = toy();
        let mut clf = LinearClassifier::new(ClassifierParams::default());
        clf.fit(&x, &y).unwrap();

        let weights = clf.weights().unwrap();
        assert!(weights.coefficient(0).unwrap() > 0.0);
        assert!(weights.coefficient(1).unwrap() < 0.0);
        assert_eq!(clf.accuracy(&x, &y).unwrap(), Some(1.0));
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (x, y) = toy();
        let mut a = LinearClassifier::new(ClassifierParams::default());
        let mut b = LinearClassifier::new(ClassifierParams::default());
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_balanced_weights_equalize_classes() {
        let (_, y) = toy();
        let clf = LinearClassifier::new(ClassifierParams::default());
        let weights = clf.sample_weights(&y);
        let fake: f64 = weights[..2].iter().sum();
        let real: f64 = weights[2..].iter().sum();
        assert!((fake - real).abs() < 1e-12);
        assert!((weights.iter().sum::<f64>() - y.len() as f64).abs() < 1e-12);
    }

    #[test]
    fn test_probabilities_and_label_rule() {
        let clf = LinearClassifier::from_weights(
            ClassifierParams::default(),
            ModelWeights::new(vec![2.0, -2.0, 0.0], 0.0),
        );
        let fake = clf.predict(CsVec::new(3, vec![0], vec![1.0]).view()).unwrap();
        let real = clf.predict(CsVec::new(3, vec![1], vec![1.0]).view()).unwrap();
        let even = clf.predict(CsVec::new(3, vec![], vec![]).view()).unwrap();

        for p in [fake, real, even] {
            assert!((p.real_probability() + p.fake_probability() - 1.0).abs() < 1e-12);
        }
        assert!((fake.fake_probability() - 1.0 / (1.0 + (-2.0_f64).exp())).abs() < 1e-12);
        assert_eq!(fake.classification(), Classification::Fake);
        assert_eq!(real.classification(), Classification::Real);
        // score 0 gives exactly 0.5, which counts as fake
        assert_eq!(even.classification(), Classification::Fake);
    }

    #[test]
    fn test_dimension_mismatch() {
        let clf = LinearClassifier::from_weights(
            ClassifierParams::default(),
            ModelWeights::new(vec![1.0; 3], 0.0),
        );
        let x = CsVec::new(5, vec![4], vec![1.0]);
        assert!(matches!(
            clf.predict(x.view()),
            Err(ClassifierError::DimensionMismatch { expected: 3, found: 5 })
        ));
    }

    #[test]
    fn test_fit_rejects_bad_input() {
        let (x, _) = toy();
        let mut clf = LinearClassifier::new(ClassifierParams::default());
        assert!(matches!(
            clf.fit(&x, &[Classification::Fake]),
            Err(ClassifierError::LabelCountMismatch { rows: 6, labels: 1 })
        ));
        let empty = CsMat::<f64>::zero((0, 3));
        assert!(matches!(
            clf.fit(&empty, &[]),
            Err(ClassifierError::EmptyTrainingSet)
        ));
    }

    #[test]
    fn test_logistic_is_stable_for_large_scores() {
        assert!((logistic(1000.0) - 1.0).abs() < 1e-12);
        assert!(logistic(-1000.0) >= 0.0);
        assert!((logistic(0.0) - 0.5).abs() < 1e-12);
    }
}
