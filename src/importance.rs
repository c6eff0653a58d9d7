//! Feature importance reporting.
//!
//! Models that compute their own importances report them directly. For any
//! other [`Classifier`] the scores are estimated by permutation: random
//! inputs are labelled by the model itself, then each column is shuffled
//! and the drop in agreement with those labels is measured.

use crate::error::ImportanceError;
use crate::model::Classifier;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureImportance {
    pub feature: String,
    pub score: f64,
}

/// Knobs for the permutation estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PermutationConfig {
    pub samples: usize,
    pub repeats: usize,
    pub seed: u64,
}

impl Default for PermutationConfig {
    fn default() -> Self {
        PermutationConfig {
            samples: 100,
            repeats: 10,
            seed: 42,
        }
    }
}

/// How importances are obtained for a loaded model.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportanceStrategy {
    Native(Vec<f64>),
    Permutation(PermutationConfig),
}

impl ImportanceStrategy {
    /// Picks native scores when the model has them.
    pub fn select(model: &dyn Classifier) -> Self {
        match model.native_importances() {
            Some(scores) => ImportanceStrategy::Native(scores),
            None => ImportanceStrategy::Permutation(PermutationConfig::default()),
        }
    }

    /// One entry per schema feature, sorted by descending score.
    pub fn report(
        &self,
        model: &dyn Classifier,
    ) -> Result<Vec<FeatureImportance>, ImportanceError> {
        let schema = model.schema().ok_or(ImportanceError::MissingSchema)?;

        let scores = match self {
            ImportanceStrategy::Native(scores) => scores.clone(),
            ImportanceStrategy::Permutation(config) => {
                permutation_importance(model, model.n_features(), *config)?
            }
        };
        if scores.len() != schema.len() {
            return Err(ImportanceError::LengthMismatch {
                scores: scores.len(),
                features: schema.len(),
            });
        }

        let mut ranked: Vec<FeatureImportance> = schema
            .columns()
            .iter()
            .zip(scores)
            .map(|(feature, score)| FeatureImportance {
                feature: feature.clone(),
                score,
            })
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(ranked)
    }
}

/// Mean accuracy drop per column, measured against the model's own
/// predictions on uniform random inputs.
pub fn permutation_importance(
    model: &dyn Classifier,
    n_features: usize,
    config: PermutationConfig,
) -> Result<Vec<f64>, ImportanceError> {
    let mut rng = StdRng::seed_from_u64(config.seed);

    let samples = Array2::from_shape_fn((config.samples, n_features), |_| rng.random::<f64>());
    let reference = model.predict(samples.view())?;
    let baseline = agreement(&reference, &reference);

    let mut importances = Vec::with_capacity(n_features);
    for col in 0..n_features {
        let mut total_drop = 0.0;
        for _ in 0..config.repeats {
            let mut shuffled = samples.clone();
            let mut column: Vec<f64> = shuffled.column(col).to_vec();
            column.shuffle(&mut rng);
            shuffled
                .column_mut(col)
                .assign(&Array1::from_vec(column));

            let predicted = model.predict(shuffled.view())?;
            total_drop += baseline - agreement(&reference, &predicted);
        }
        importances.push(if config.repeats == 0 {
            0.0
        } else {
            total_drop / config.repeats as f64
        });
    }
    Ok(importances)
}

fn agreement(expected: &Array1<usize>, actual: &Array1<usize>) -> f64 {
    if expected.is_empty() {
        return 0.0;
    }
    let hits = expected.iter().zip(actual).filter(|(a, b)| a == b).count();
    hits as f64 / expected.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::model::FeatureSchema;
    use ndarray::ArrayView2;

    /// Label depends only on the second column.
    struct SecondColumn {
        schema: Option<FeatureSchema>,
        native: Option<Vec<f64>>,
    }

    impl Classifier for SecondColumn {
        fn predict(&self, input: ArrayView2<'_, f64>) -> Result<Array1<usize>, ModelError> {
            Ok(input.column(1).mapv(|v| usize::from(v > 0.5)))
        }

        fn n_features(&self) -> usize {
            3
        }

        fn schema(&self) -> Option<&FeatureSchema> {
            self.schema.as_ref()
        }

        fn native_importances(&self) -> Option<Vec<f64>> {
            self.native.clone()
        }
    }

    fn model(native: Option<Vec<f64>>) -> SecondColumn {
        SecondColumn {
            schema: Some(FeatureSchema::new(["a", "b", "c"])),
            native,
        }
    }

    #[test]
    fn native_scores_are_ranked() {
        let m = model(Some(vec![0.2, 0.5, 0.3]));
        let strategy = ImportanceStrategy::select(&m);
        assert_eq!(strategy, ImportanceStrategy::Native(vec![0.2, 0.5, 0.3]));

        let report = strategy.report(&m).unwrap();
        let names: Vec<_> = report.iter().map(|f| f.feature.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a"]);
    }

    #[test]
    fn permutation_finds_the_informative_column() {
        let m = model(None);
        let strategy = ImportanceStrategy::select(&m);
        assert!(matches!(strategy, ImportanceStrategy::Permutation(_)));

        let report = strategy.report(&m).unwrap();
        assert_eq!(report.len(), 3);
        assert_eq!(report[0].feature, "b");
        assert!(report[0].score > 0.0);
        assert!(report.windows(2).all(|w| w[0].score >= w[1].score));
        for unused in &report[1..] {
            assert_eq!(unused.score, 0.0);
        }
    }

    #[test]
    fn permutation_is_deterministic_for_a_seed() {
        let m = model(None);
        let cfg = PermutationConfig::default();
        assert_eq!(
            permutation_importance(&m, 3, cfg).unwrap(),
            permutation_importance(&m, 3, cfg).unwrap()
        );
    }

    #[test]
    fn missing_schema_is_reported() {
        let m = SecondColumn {
            schema: None,
            native: None,
        };
        assert_eq!(
            ImportanceStrategy::select(&m).report(&m),
            Err(ImportanceError::MissingSchema)
        );
    }

    #[test]
    fn native_length_must_match_schema() {
        let m = model(Some(vec![1.0]));
        assert_eq!(
            ImportanceStrategy::select(&m).report(&m),
            Err(ImportanceError::LengthMismatch {
                scores: 1,
                features: 3
            })
        );
    }
}
