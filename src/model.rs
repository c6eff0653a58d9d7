//! Trained classifiers and the feature schema they carry.

use crate::error::{ModelError, TrainingError};
use linfa::prelude::*;
use linfa_trees::DecisionTree;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Label the model emits for an approved application.
pub const APPROVED_LABEL: usize = 1;

/// Ordered lowercase column names a model was trained on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    /// Normalizes each name to its trimmed lowercase form.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        FeatureSchema {
            columns: columns
                .into_iter()
                .map(|c| c.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    /// Column names in training order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Inference contract shared by every model the service can hold.
pub trait Classifier: Send + Sync {
    /// Predicts one label per row of `input`.
    fn predict(&self, input: ArrayView2<'_, f64>) -> Result<Array1<usize>, ModelError>;

    /// Number of input columns the model was fit on.
    fn n_features(&self) -> usize;

    /// Training-time column order, when the model recorded it.
    fn schema(&self) -> Option<&FeatureSchema>;

    /// Importance scores the model computes itself, in schema order.
    fn native_importances(&self) -> Option<Vec<f64>> {
        None
    }
}

/// Hyperparameters for [`BaggedTrees`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeEnsembleParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub seed: u64,
}

impl Default for TreeEnsembleParams {
    fn default() -> Self {
        TreeEnsembleParams {
            n_estimators: 100,
            max_depth: None,
            seed: 42,
        }
    }
}

/// Decision trees fit on bootstrap resamples, combined by majority vote.
#[derive(Serialize, Deserialize)]
pub struct BaggedTrees {
    trees: Vec<DecisionTree<f64, usize>>,
    n_features: usize,
}

impl BaggedTrees {
    /// Fits `params.n_estimators` trees, each on a seeded bootstrap sample.
    pub fn fit(
        x: &Array2<f64>,
        y: &Array1<usize>,
        params: TreeEnsembleParams,
    ) -> Result<Self, TrainingError> {
        let n_rows = x.nrows();
        if n_rows == 0 || params.n_estimators == 0 {
            return Err(TrainingError::Empty);
        }

        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_estimators);

        for _ in 0..params.n_estimators {
            let sample: Vec<usize> = (0..n_rows).map(|_| rng.random_range(0..n_rows)).collect();
            let dataset = Dataset::new(x.select(Axis(0), &sample), y.select(Axis(0), &sample));

            let tree = DecisionTree::<f64, usize>::params()
                .max_depth(params.max_depth)
                .fit(&dataset)
                .map_err(|e| TrainingError::Fit(e.to_string()))?;
            trees.push(tree);
        }

        Ok(BaggedTrees {
            trees,
            n_features: x.ncols(),
        })
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }

    fn check_shape(&self, input: &ArrayView2<'_, f64>) -> Result<(), ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::Untrained);
        }
        if input.ncols() != self.n_features {
            return Err(ModelError::ShapeMismatch {
                expected: self.n_features,
                actual: input.ncols(),
            });
        }
        Ok(())
    }

    /// Majority vote of all trees, one label per row.
    pub fn predict(&self, input: ArrayView2<'_, f64>) -> Result<Array1<usize>, ModelError> {
        self.check_shape(&input)?;

        let votes: Vec<Array1<usize>> = self.trees.iter().map(|t| t.predict(&input)).collect();

        let labels = (0..input.nrows())
            .map(|row| {
                let mut counts: HashMap<usize, usize> = HashMap::new();
                for v in &votes {
                    *counts.entry(v[row]).or_insert(0) += 1;
                }
                // ties go to the smaller label so predictions are reproducible
                counts
                    .into_iter()
                    .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
                    .map(|(label, _)| label)
                    .unwrap_or_default()
            })
            .collect();

        Ok(labels)
    }

    /// Mean of the per-tree normalized impurity decreases.
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut total = vec![0.0; self.n_features];
        if self.trees.is_empty() {
            return total;
        }

        for tree in &self.trees {
            for (slot, score) in total.iter_mut().zip(tree.feature_importance()) {
                // a single-leaf tree normalizes 0/0
                if score.is_finite() {
                    *slot += score;
                }
            }
        }

        let n = self.trees.len() as f64;
        total.iter_mut().for_each(|s| *s /= n);
        total
    }
}

/// What is persisted as the model blob: the ensemble plus its schema.
#[derive(Serialize, Deserialize)]
pub struct ModelArtifact {
    pub schema: Option<FeatureSchema>,
    pub forest: BaggedTrees,
}

impl ModelArtifact {
    pub fn new(forest: BaggedTrees, schema: Option<FeatureSchema>) -> Self {
        ModelArtifact { schema, forest }
    }
}

impl Classifier for ModelArtifact {
    fn predict(&self, input: ArrayView2<'_, f64>) -> Result<Array1<usize>, ModelError> {
        self.forest.predict(input)
    }

    fn n_features(&self) -> usize {
        self.forest.n_features
    }

    fn schema(&self) -> Option<&FeatureSchema> {
        self.schema.as_ref()
    }

    fn native_importances(&self) -> Option<Vec<f64>> {
        Some(self.forest.feature_importances())
    }
}
