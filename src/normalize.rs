//! Schema-aware input normalization.
//!
//! Turns one [`RawInput`] into the single-row numeric vector a trained model
//! expects. The pipeline runs in a fixed order:
//!
//! 1. lowercase every field name,
//! 2. replace categorical labels by their encoder code (unknown labels get
//!    [`DEFAULT_CODE`]),
//! 3. parse everything else as a number,
//! 4. fill whatever could not be parsed with `0`,
//! 5. align to the feature schema when one is known (insert missing columns
//!    as `0`, reorder, drop extras),
//! 6. emit a `1 × n` array.
//!
//! Value-level problems never fail the call. They are recovered and
//! reported as [`Anomaly`] entries next to the vector, and logged.

use crate::encoder::{DEFAULT_CODE, EncoderTable, encode_with_fallback};
use crate::error::NormalizeError;
use crate::input::{RawInput, RawValue, field_key, is_categorical};
use crate::model::FeatureSchema;
use ndarray::{Array2, ArrayView2};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Fill value for missing or unparseable entries.
pub const MISSING_FILL: f64 = 0.0;

/// A value-level problem that was recovered during normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum Anomaly {
    /// Label never seen in training; the default code was used
    UnknownCategory { column: String, value: String },
    /// Value could not be read as a finite number; filled with zero
    Unparseable { column: String, value: String },
    /// Schema column absent from the input; filled with zero
    MissingColumn { column: String },
    /// Categorical column without a loaded encoder; passed through numerically
    NoEncoder { column: String },
}

impl Anomaly {
    /// Column the anomaly was recorded against.
    pub fn column(&self) -> &str {
        match self {
            Anomaly::UnknownCategory { column, .. }
            | Anomaly::Unparseable { column, .. }
            | Anomaly::MissingColumn { column }
            | Anomaly::NoEncoder { column } => column,
        }
    }
}

/// Fixed-order single-row input for a model.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericVector {
    columns: Vec<String>,
    values: Array2<f64>,
}

impl NumericVector {
    /// Column names in vector order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The `1 × n` row, ready for [`Classifier::predict`](crate::model::Classifier::predict).
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Value of a named column.
    pub fn get(&self, column: &str) -> Option<f64> {
        let idx = self.columns.iter().position(|c| c == column)?;
        Some(self.values[[0, idx]])
    }

    /// Row values in column order.
    pub fn to_vec(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }
}

/// Output of [`normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub vector: NumericVector,
    pub anomalies: Vec<Anomaly>,
}

/// Builds the model input vector for `raw`.
///
/// With `schema`, the result has exactly the schema's columns in the
/// schema's order. Without one, the input's own columns are used in
/// insertion order.
pub fn normalize(
    raw: &RawInput,
    encoders: &EncoderTable,
    schema: Option<&FeatureSchema>,
) -> Result<Normalized, NormalizeError> {
    let mut anomalies = Vec::new();
    let mut row: Vec<(String, f64)> = Vec::with_capacity(raw.len());

    for (key, value) in raw.iter() {
        let column = field_key(key);
        if row.iter().any(|(c, _)| *c == column) {
            return Err(NormalizeError::DuplicateField(column));
        }

        let cell = if is_categorical(&column) {
            encode_cell(&column, value, encoders, &mut anomalies)
        } else {
            coerce_cell(&column, value, &mut anomalies)
        };
        row.push((column, cell));
    }

    let (columns, values) = match schema {
        Some(schema) => align(row, schema, &mut anomalies),
        None => {
            if row.is_empty() {
                return Err(NormalizeError::EmptyRow);
            }
            row.into_iter().unzip()
        }
    };

    let values = Array2::from_shape_vec((1, columns.len()), values)
        .map_err(|e| NormalizeError::Malformed(e.to_string()))?;

    Ok(Normalized {
        vector: NumericVector { columns, values },
        anomalies,
    })
}

fn encode_cell(
    column: &str,
    value: &RawValue,
    encoders: &EncoderTable,
    anomalies: &mut Vec<Anomaly>,
) -> f64 {
    let Some(encoder) = encoders.get(column) else {
        debug!(column, "no encoder loaded, passing value through");
        anomalies.push(Anomaly::NoEncoder {
            column: column.to_string(),
        });
        return coerce_cell(column, value, anomalies);
    };

    let label = value.to_string();
    let (code, defaulted) = encode_with_fallback(&label, encoder);
    if defaulted {
        warn!(column, value = %label, code = DEFAULT_CODE, "unknown category, using default code");
        anomalies.push(Anomaly::UnknownCategory {
            column: column.to_string(),
            value: label,
        });
    }
    code as f64
}

fn coerce_cell(column: &str, value: &RawValue, anomalies: &mut Vec<Anomaly>) -> f64 {
    match value.as_number() {
        Some(n) => n,
        None => {
            warn!(column, value = %value, "value is not a number, filling with zero");
            anomalies.push(Anomaly::Unparseable {
                column: column.to_string(),
                value: value.to_string(),
            });
            MISSING_FILL
        }
    }
}

fn align(
    row: Vec<(String, f64)>,
    schema: &FeatureSchema,
    anomalies: &mut Vec<Anomaly>,
) -> (Vec<String>, Vec<f64>) {
    let mut cells: HashMap<String, f64> = row.into_iter().collect();

    let values = schema
        .columns()
        .iter()
        .map(|column| {
            cells.remove(column).unwrap_or_else(|| {
                debug!(column = %column, "schema column missing from input, filling with zero");
                anomalies.push(Anomaly::MissingColumn {
                    column: column.clone(),
                });
                MISSING_FILL
            })
        })
        .collect();

    if !cells.is_empty() {
        let mut dropped: Vec<_> = cells.into_keys().collect();
        dropped.sort();
        debug!(?dropped, "dropping columns the model was not trained on");
    }

    (schema.columns().to_vec(), values)
}
