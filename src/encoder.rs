//! Categorical label encoders learned at training time.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Code substituted for labels never seen during training.
pub const DEFAULT_CODE: usize = 0;

/// Bijection between the known labels of one column and `0..n`.
///
/// Classes are kept sorted, so the code of a label only depends on the set
/// of labels seen in training, not on row order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalEncoder {
    classes: Vec<String>,
}

impl CategoricalEncoder {
    /// Learns the sorted, deduplicated label set.
    pub fn fit<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let classes: BTreeSet<String> = labels
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        CategoricalEncoder {
            classes: classes.into_iter().collect(),
        }
    }

    /// Known labels; a label's code is its index here.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Code of `label`, `None` when it was never seen.
    pub fn encode(&self, label: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .ok()
    }

    /// Label for `code`, `None` when out of range.
    pub fn decode(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }
}

/// Encodes `label`, substituting [`DEFAULT_CODE`] when it is unknown.
///
/// The second element tells whether the fallback was used.
pub fn encode_with_fallback(label: &str, encoder: &CategoricalEncoder) -> (usize, bool) {
    match encoder.encode(label) {
        Some(code) => (code, false),
        None => (DEFAULT_CODE, true),
    }
}

/// Column name → encoder. Columns without an entry are non-categorical.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncoderTable {
    encoders: BTreeMap<String, CategoricalEncoder>,
}

impl EncoderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the encoder for `column`, replacing any previous one.
    pub fn insert(&mut self, column: impl Into<String>, encoder: CategoricalEncoder) {
        self.encoders.insert(column.into(), encoder);
    }

    /// Encoder for a lowercase column name.
    pub fn get(&self, column: &str) -> Option<&CategoricalEncoder> {
        self.encoders.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.encoders.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }
}

impl FromIterator<(String, CategoricalEncoder)> for EncoderTable {
    fn from_iter<I: IntoIterator<Item = (String, CategoricalEncoder)>>(iter: I) -> Self {
        EncoderTable {
            encoders: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_sorts_and_deduplicates() {
        let enc = CategoricalEncoder::fit(["Urban", "Rural", "Semiurban", "Urban"]);
        assert_eq!(enc.classes(), &["Rural", "Semiurban", "Urban"]);
        assert_eq!(enc.encode("Rural"), Some(0));
        assert_eq!(enc.encode("Urban"), Some(2));
    }

    #[test]
    fn encode_and_decode_are_inverse() {
        let enc = CategoricalEncoder::fit(["0", "1", "2", "3+"]);
        for (code, label) in enc.classes().iter().enumerate() {
            assert_eq!(enc.encode(label), Some(code));
            assert_eq!(enc.decode(code), Some(label.as_str()));
        }
        assert_eq!(enc.decode(4), None);
    }

    #[test]
    fn lookup_is_case_sensitive() {
        let enc = CategoricalEncoder::fit(["Male", "Female"]);
        assert_eq!(enc.encode("male"), None);
    }

    #[test]
    fn fallback_flags_unknown_labels() {
        let enc = CategoricalEncoder::fit(["Female", "Male"]);
        assert_eq!(encode_with_fallback("Male", &enc), (1, false));
        assert_eq!(encode_with_fallback("Other", &enc), (DEFAULT_CODE, true));
    }

    #[test]
    fn fallback_on_empty_encoder() {
        let enc = CategoricalEncoder::fit(Vec::<String>::new());
        assert_eq!(encode_with_fallback("anything", &enc), (DEFAULT_CODE, true));
    }
}
