//! Error types for the loan debugger.
//!
//! Each concern gets its own enum so callers can tell structural failures
//! apart from the ones the prediction boundary turns into a [`Decision`].
//!
//! [`Decision`]: crate::service::Decision

use std::path::PathBuf;
use thiserror::Error;

/// Structural failures raised while turning raw input into a vector.
///
/// Value-level problems (unknown labels, unparseable numbers) are never
/// reported here; they are recovered and surfaced as
/// [`Anomaly`](crate::normalize::Anomaly) values instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NormalizeError {
    /// Two input keys collapse to the same lowercase field name
    #[error("field '{0}' was supplied more than once")]
    DuplicateField(String),

    /// Nothing to build a vector from and no schema to fill it
    #[error("input has no fields and the model exposes no feature schema")]
    EmptyRow,

    /// Input JSON is not a flat object of scalars
    #[error("malformed input: {0}")]
    Malformed(String),
}

/// Failures raised by a classifier at inference time.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("model expects {expected} features but received {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("model has no trained estimators")]
    Untrained,
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: rmp_serde::decode::Error,
    },

    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: rmp_serde::encode::Error,
    },
}

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("failed to read training data: {0}")]
    Csv(#[from] csv::Error),

    #[error("training data has no '{0}' column")]
    MissingColumn(String),

    #[error("row {row}: unrecognised loan status '{value}'")]
    InvalidTarget { row: usize, value: String },

    #[error("training data has no usable rows")]
    Empty,

    #[error("decision tree fit failed: {0}")]
    Fit(String),

    #[error("failed to build feature matrix: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ImportanceError {
    #[error("model does not expose its feature names")]
    MissingSchema,

    #[error("model reports {scores} importances for {features} features")]
    LengthMismatch { scores: usize, features: usize },

    #[error(transparent)]
    Model(#[from] ModelError),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BiasError {
    #[error("'{0}' is not a categorical field")]
    NotCategorical(String),

    #[error("no encoder is loaded for '{0}'")]
    NoEncoder(String),

    #[error("model not loaded")]
    ModelUnavailable,
}

/// Closed set of chat failures.
///
/// Classification is driven by HTTP status codes and transport error kinds,
/// never by inspecting message text.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("API configuration missing")]
    MissingCredential,

    #[error("authentication error (HTTP {0})")]
    Authentication(u16),

    #[error("API endpoint not found")]
    EndpointNotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("empty response")]
    EmptyResponse,

    #[error("API error: {0}")]
    Unclassified(String),
}

impl ChatError {
    /// Short heading shown above the message.
    pub fn title(&self) -> &'static str {
        match self {
            ChatError::MissingCredential => "API configuration missing",
            ChatError::Authentication(_) => "Authentication error",
            ChatError::EndpointNotFound => "API endpoint error",
            ChatError::Connection(_) => "Connection error",
            ChatError::EmptyResponse => "Empty response",
            ChatError::Unclassified(_) => "API error",
        }
    }

    /// Readable explanation for the end user.
    pub fn user_message(&self) -> String {
        match self {
            ChatError::MissingCredential => {
                "Please configure NEBIUS_API_KEY in your .env file.".to_string()
            }
            ChatError::Authentication(_) => {
                "The API key may be invalid. Please check your NEBIUS_API_KEY.".to_string()
            }
            ChatError::EndpointNotFound => {
                "The API endpoint could not be found. Please check the base URL.".to_string()
            }
            ChatError::Connection(detail) => {
                format!("Could not connect to the chat API: {detail}")
            }
            ChatError::EmptyResponse => "The API returned an empty response.".to_string(),
            ChatError::Unclassified(detail) => format!("An error occurred: {detail}"),
        }
    }
}
