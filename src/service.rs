//! Raw applicant input → loan decision.

use crate::artifacts::LoadedArtifacts;
use crate::encoder::EncoderTable;
use crate::error::{ImportanceError, NormalizeError};
use crate::importance::{FeatureImportance, ImportanceStrategy};
use crate::input::RawInput;
use crate::model::{APPROVED_LABEL, Classifier, FeatureSchema};
use crate::normalize::{Anomaly, Normalized, normalize};
use std::fmt;
use tracing::{debug, error};

pub const MODEL_NOT_LOADED: &str = "model not loaded";

/// Outcome of one prediction request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Rejected,
    Unavailable(String),
    Failed(String),
}

impl Decision {
    /// `true` only for `Approved`.
    pub fn is_approved(&self) -> bool {
        matches!(self, Decision::Approved)
    }

    /// `true` for `Approved` and `Rejected`.
    pub fn is_verdict(&self) -> bool {
        matches!(self, Decision::Approved | Decision::Rejected)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Approved => f.write_str("✅ Approved"),
            Decision::Rejected => f.write_str("❌ Rejected"),
            Decision::Unavailable(reason) => write!(f, "⚠️ Unavailable: {reason}"),
            Decision::Failed(reason) => write!(f, "❌ Error in prediction: {reason}"),
        }
    }
}

/// Loaded model and encoders, immutable for the life of the process.
pub struct PredictionService {
    model: Option<Box<dyn Classifier>>,
    encoders: EncoderTable,
    importance: Option<ImportanceStrategy>,
}

impl PredictionService {
    /// Wraps an already-loaded model. The importance strategy is chosen here,
    /// once.
    pub fn new(model: Option<Box<dyn Classifier>>, encoders: EncoderTable) -> Self {
        let importance = model.as_deref().map(|m| ImportanceStrategy::select(m));
        PredictionService {
            model,
            encoders,
            importance,
        }
    }

    /// Service over whatever [`crate::artifacts::load`] found.
    pub fn from_artifacts(artifacts: LoadedArtifacts) -> Self {
        let model = artifacts
            .model
            .map(|m| Box::new(m) as Box<dyn Classifier>);
        PredictionService::new(model, artifacts.encoders)
    }

    pub fn model(&self) -> Option<&dyn Classifier> {
        self.model.as_deref()
    }

    pub fn encoders(&self) -> &EncoderTable {
        &self.encoders
    }

    /// Feature schema of the loaded model, if any.
    pub fn schema(&self) -> Option<&FeatureSchema> {
        self.model.as_deref().and_then(|m| m.schema())
    }

    pub fn importance_strategy(&self) -> Option<&ImportanceStrategy> {
        self.importance.as_ref()
    }

    /// Runs the normalizer against the loaded model's schema.
    pub fn normalize(&self, raw: &RawInput) -> Result<Normalized, NormalizeError> {
        normalize(raw, &self.encoders, self.schema())
    }

    /// Never panics and never returns an error: every failure is folded
    /// into the returned [`Decision`].
    pub fn predict_loan_status(&self, raw: &RawInput) -> Decision {
        let Some(model) = self.model.as_deref() else {
            return Decision::Unavailable(MODEL_NOT_LOADED.to_string());
        };

        let normalized = match self.normalize(raw) {
            Ok(n) => n,
            Err(e) => {
                error!("preprocessing failed: {e}");
                return Decision::Failed(e.to_string());
            }
        };
        debug!(
            columns = normalized.vector.len(),
            anomalies = ?normalized.anomalies.iter().map(Anomaly::column).collect::<Vec<_>>(),
            "input normalized"
        );

        match model.predict(normalized.vector.view()) {
            Ok(labels) if labels.get(0) == Some(&APPROVED_LABEL) => Decision::Approved,
            Ok(_) => Decision::Rejected,
            Err(e) => {
                error!("prediction failed: {e}");
                Decision::Failed(e.to_string())
            }
        }
    }

    /// Feature importances, highest first.
    pub fn feature_importances(&self) -> Result<Vec<FeatureImportance>, ImportanceError> {
        match (self.model.as_deref(), &self.importance) {
            (Some(model), Some(strategy)) => strategy.report(model),
            _ => Err(ImportanceError::MissingSchema),
        }
    }
}
