//! Counterfactual bias probe.
//!
//! Holds an application fixed and swaps one categorical attribute through
//! every label the encoder knows, recording how the decision changes.

use crate::error::BiasError;
use crate::input::{RawInput, field_key, is_categorical};
use crate::service::{Decision, PredictionService};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct BiasReport {
    pub field: String,
    pub outcomes: Vec<(String, Decision)>,
}

impl BiasReport {
    /// Whether the decision depends on the probed field for this input.
    pub fn decision_varies(&self) -> bool {
        self.outcomes
            .windows(2)
            .any(|pair| pair[0].1 != pair[1].1)
    }

    /// Share of labels that were approved.
    pub fn approval_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        let approved = self.outcomes.iter().filter(|(_, d)| d.is_approved()).count();
        approved as f64 / self.outcomes.len() as f64
    }
}

impl fmt::Display for BiasReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Bias probe for '{}':", self.field)?;
        for (label, decision) in &self.outcomes {
            writeln!(f, "{label:>25} | {decision}")?;
        }
        if self.decision_varies() {
            write!(f, "Decision changes with '{}' for this applicant.", self.field)
        } else {
            write!(f, "No dependence on '{}' detected for this applicant.", self.field)
        }
    }
}

/// Re-runs `base` once per known label of `field`.
pub fn probe(
    service: &PredictionService,
    base: &RawInput,
    field: &str,
) -> Result<BiasReport, BiasError> {
    let field = field_key(field);
    if !is_categorical(&field) {
        return Err(BiasError::NotCategorical(field));
    }
    if service.model().is_none() {
        return Err(BiasError::ModelUnavailable);
    }
    let encoder = service
        .encoders()
        .get(&field)
        .ok_or_else(|| BiasError::NoEncoder(field.clone()))?;

    let mut input = base.clone();
    input.remove(&field);

    let outcomes = encoder
        .classes()
        .iter()
        .map(|label| {
            input.insert(field.clone(), label.as_str());
            (label.clone(), service.predict_loan_status(&input))
        })
        .collect();

    Ok(BiasReport { field, outcomes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{CategoricalEncoder, EncoderTable};
    use crate::error::ModelError;
    use crate::model::{Classifier, FeatureSchema};
    use ndarray::{Array1, ArrayView2};

    /// Approves urban applicants only.
    struct UrbanOnly {
        schema: FeatureSchema,
    }

    impl Classifier for UrbanOnly {
        fn predict(&self, input: ArrayView2<'_, f64>) -> Result<Array1<usize>, ModelError> {
            Ok(input.column(1).mapv(|v| usize::from(v == 2.0)))
        }

        fn n_features(&self) -> usize {
            2
        }

        fn schema(&self) -> Option<&FeatureSchema> {
            Some(&self.schema)
        }
    }

    fn service() -> PredictionService {
        let mut encoders = EncoderTable::new();
        encoders.insert("gender", CategoricalEncoder::fit(["Female", "Male"]));
        encoders.insert(
            "property_area",
            CategoricalEncoder::fit(["Rural", "Semiurban", "Urban"]),
        );
        let model = UrbanOnly {
            schema: FeatureSchema::new(["gender", "property_area"]),
        };
        PredictionService::new(Some(Box::new(model)), encoders)
    }

    #[test]
    fn sweep_detects_dependence() {
        let base = RawInput::new().with("Property_Area", "Rural");
        let report = probe(&service(), &base, "property_area").unwrap();

        assert_eq!(
            report.outcomes,
            vec![
                ("Rural".to_string(), Decision::Rejected),
                ("Semiurban".to_string(), Decision::Rejected),
                ("Urban".to_string(), Decision::Approved),
            ]
        );
        assert!(report.decision_varies());
        assert!((report.approval_rate() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn sweep_without_dependence() {
        let base = RawInput::new().with("property_area", "Urban");
        let report = probe(&service(), &base, "gender").unwrap();
        assert!(!report.decision_varies());
        assert!(report.to_string().contains("No dependence"));
    }

    /// Approves everyone; only the gender column is read.
    struct ApproveAll {
        schema: FeatureSchema,
    }

    impl Classifier for ApproveAll {
        fn predict(&self, input: ArrayView2<'_, f64>) -> Result<Array1<usize>, ModelError> {
            Ok(Array1::from_elem(input.nrows(), 1))
        }

        fn n_features(&self) -> usize {
            1
        }

        fn schema(&self) -> Option<&FeatureSchema> {
            Some(&self.schema)
        }
    }

    #[test]
    fn padded_base_key_is_replaced_by_each_label() {
        let mut encoders = EncoderTable::new();
        encoders.insert("gender", CategoricalEncoder::fit(["Female", "Male"]));
        let model = ApproveAll {
            schema: FeatureSchema::new(["gender"]),
        };
        let svc = PredictionService::new(Some(Box::new(model)), encoders);

        let base = RawInput::new().with(" Gender ", "Male");
        assert_eq!(svc.predict_loan_status(&base), Decision::Approved);

        let report = probe(&svc, &base, "gender").unwrap();
        assert_eq!(
            report.outcomes,
            vec![
                ("Female".to_string(), Decision::Approved),
                ("Male".to_string(), Decision::Approved),
            ]
        );
    }

    #[test]
    fn numeric_fields_are_rejected() {
        assert_eq!(
            probe(&service(), &RawInput::new(), "loan_amount"),
            Err(BiasError::NotCategorical("loan_amount".to_string()))
        );
    }

    #[test]
    fn missing_encoder_or_model() {
        assert_eq!(
            probe(&service(), &RawInput::new(), "married"),
            Err(BiasError::NoEncoder("married".to_string()))
        );

        let empty = PredictionService::new(None, EncoderTable::new());
        assert_eq!(
            probe(&empty, &RawInput::new(), "gender"),
            Err(BiasError::ModelUnavailable)
        );
    }
}
