//! # loan-debugger 🏦🔍
//!
//! Predict loan approval from applicant attributes and inspect why the model
//! decided the way it did.
//!
//! The heart of the crate is a schema-aware input normalizer: free-form
//! field values are mapped through the categorical encoders saved at
//! training time, aligned to the exact column order the model was trained
//! on, and zero-filled where missing. Unknown labels and unparseable numbers
//! never fail a request; they fall back to safe defaults and are reported
//! as [`Anomaly`] values.
//!
//! ## Features
//! - Categorical encoding with fallback for unseen labels
//! - Schema alignment that tolerates missing and extra fields
//! - Bagged [`linfa-trees`](https://crates.io/crates/linfa-trees) decision tree ensemble
//! - Model persistence with `rmp-serde` (MessagePack)
//! - Native or permutation feature importances
//! - Counterfactual bias probe over one categorical field
//! - Chat about the model through an OpenAI-compatible API, with a local fallback
//!
//! ## Example
//! ```rust,no_run
//! use loan_debugger::{artifacts, ArtifactPaths, PredictionService, RawInput};
//!
//! let service = PredictionService::from_artifacts(artifacts::load(&ArtifactPaths::default()));
//! let applicant = RawInput::new()
//!     .with("gender", "Male")
//!     .with("married", "Yes")
//!     .with("applicant_income", 5000.0)
//!     .with("loan_amount_term", "360")
//!     .with("credit_history", "1")
//!     .with("property_area", "Urban");
//! println!("{}", service.predict_loan_status(&applicant));
//! ```

pub mod artifacts;
pub mod bias;
pub mod chat;
pub mod config;
pub mod encoder;
pub mod error;
pub mod importance;
pub mod input;
pub mod model;
pub mod normalize;
pub mod service;
pub mod training;

pub use artifacts::{ArtifactPaths, LoadedArtifacts};
pub use encoder::{CategoricalEncoder, DEFAULT_CODE, EncoderTable, encode_with_fallback};
pub use input::{CATEGORICAL_FIELDS, NUMERIC_FIELDS, RawInput, RawValue};
pub use model::{BaggedTrees, Classifier, FeatureSchema, ModelArtifact, TreeEnsembleParams};
pub use normalize::{Anomaly, Normalized, NumericVector, normalize};
pub use service::{Decision, PredictionService};
