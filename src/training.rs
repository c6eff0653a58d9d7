//! Producing the model and encoder artifacts from a loan CSV.

use crate::artifacts::{self, ArtifactPaths, LoadedArtifacts};
use crate::encoder::{CategoricalEncoder, EncoderTable};
use crate::error::TrainingError;
use crate::input::{ID_COLUMN, TARGET_COLUMN, is_categorical};
use crate::model::{BaggedTrees, Classifier, FeatureSchema, ModelArtifact, TreeEnsembleParams};
use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// One training row: raw cells in schema order plus the 0/1 target.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanRecord {
    pub cells: Vec<String>,
    pub approved: usize,
}

/// A helper type for holding train/test splits.
#[derive(Debug)]
pub struct DatasetSplit {
    pub train: Vec<LoanRecord>,
    pub test: Vec<LoanRecord>,
}

/// Shuffles with `seed` and moves `test_ratio` of the rows to the test set.
pub fn train_test_split(data: &[LoanRecord], test_ratio: f64, seed: u64) -> DatasetSplit {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = data.to_vec();
    data.shuffle(&mut rng);

    let test_size = ((data.len() as f64) * test_ratio).round() as usize;
    let test_size = test_size.min(data.len());
    let train = data.split_off(test_size);

    DatasetSplit { train, test: data }
}

/// Training settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingConfig {
    pub test_ratio: f64,
    pub split_seed: u64,
    pub ensemble: TreeEnsembleParams,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            test_ratio: 0.2,
            split_seed: 42,
            ensemble: TreeEnsembleParams::default(),
        }
    }
}

/// Loan rows read from CSV, with the columns that survive as features.
#[derive(Debug, Clone)]
pub struct TrainingData {
    pub schema: FeatureSchema,
    pub records: Vec<LoanRecord>,
}

impl TrainingData {
    /// Reads a loan CSV from disk. See [`TrainingData::from_reader`].
    pub fn from_csv(path: &Path) -> Result<Self, TrainingError> {
        let file = File::open(path).map_err(csv::Error::from)?;
        Self::from_reader(file)
    }

    /// Headers are lowercased, the id column is dropped, and rows with an
    /// empty categorical cell are skipped.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TrainingError> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_lowercase()).collect();
        let target_idx = headers
            .iter()
            .position(|h| h == TARGET_COLUMN)
            .ok_or_else(|| TrainingError::MissingColumn(TARGET_COLUMN.to_string()))?;

        let feature_idx: Vec<usize> = headers
            .iter()
            .enumerate()
            .filter(|(i, h)| *i != target_idx && h.as_str() != ID_COLUMN)
            .map(|(i, _)| i)
            .collect();
        let schema = FeatureSchema::new(feature_idx.iter().map(|&i| &headers[i]));

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for (row, result) in rdr.records().enumerate() {
            let record = result?;
            let target = record.get(target_idx).unwrap_or_default();
            let approved = parse_target(target).ok_or_else(|| TrainingError::InvalidTarget {
                row: row + 1,
                value: target.to_string(),
            })?;

            let cells: Vec<String> = feature_idx
                .iter()
                .map(|&i| record.get(i).unwrap_or_default().to_string())
                .collect();

            let incomplete = schema
                .columns()
                .iter()
                .zip(&cells)
                .any(|(col, cell)| is_categorical(col) && cell.is_empty());
            if incomplete {
                skipped += 1;
                continue;
            }
            records.push(LoanRecord { cells, approved });
        }

        if skipped > 0 {
            debug!(skipped, "dropped rows with empty categorical cells");
        }
        if records.is_empty() {
            return Err(TrainingError::Empty);
        }
        Ok(TrainingData { schema, records })
    }

    /// Fits one encoder per categorical column present in the schema.
    pub fn fit_encoders(&self) -> EncoderTable {
        self.schema
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, col)| is_categorical(col))
            .map(|(i, col)| {
                let labels = self.records.iter().map(|r| r.cells[i].as_str());
                (col.clone(), CategoricalEncoder::fit(labels))
            })
            .collect()
    }

    /// Encoded feature matrix and target vector for `records`.
    pub fn to_matrix(
        &self,
        records: &[LoanRecord],
        encoders: &EncoderTable,
    ) -> Result<(Array2<f64>, Array1<usize>), TrainingError> {
        let columns = self.schema.columns();
        let mut values = Vec::with_capacity(records.len() * columns.len());

        for r in records {
            for (col, cell) in columns.iter().zip(&r.cells) {
                let v = match encoders.get(col) {
                    Some(enc) => enc.encode(cell).unwrap_or_default() as f64,
                    None => cell.parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0),
                };
                values.push(v);
            }
        }

        let x = Array2::from_shape_vec((records.len(), columns.len()), values)?;
        let y = records.iter().map(|r| r.approved).collect();
        Ok((x, y))
    }
}

fn parse_target(value: &str) -> Option<usize> {
    match value.trim().to_lowercase().as_str() {
        "y" | "yes" | "1" | "approved" => Some(1),
        "n" | "no" | "0" | "rejected" => Some(0),
        _ => None,
    }
}

/// Share of rows where the model agrees with `y`.
pub fn accuracy(
    model: &dyn Classifier,
    x: &Array2<f64>,
    y: &Array1<usize>,
) -> Result<f64, TrainingError> {
    if y.is_empty() {
        return Ok(0.0);
    }
    let predicted = model.predict(x.view())?;
    let correct = predicted.iter().zip(y).filter(|(p, t)| p == t).count();
    Ok(correct as f64 / y.len() as f64)
}

/// Result of a training run.
pub struct TrainedArtifacts {
    pub model: ModelArtifact,
    pub encoders: EncoderTable,
    pub test_accuracy: Option<f64>,
}

/// Fits encoders and the ensemble on the training split, then scores the
/// held-out split.
pub fn train(
    data: &TrainingData,
    config: TrainingConfig,
) -> Result<TrainedArtifacts, TrainingError> {
    let encoders = data.fit_encoders();
    let split = train_test_split(&data.records, config.test_ratio, config.split_seed);
    if split.train.is_empty() {
        return Err(TrainingError::Empty);
    }

    let (x_train, y_train) = data.to_matrix(&split.train, &encoders)?;
    let forest = BaggedTrees::fit(&x_train, &y_train, config.ensemble)?;
    let model = ModelArtifact::new(forest, Some(data.schema.clone()));

    let test_accuracy = if split.test.is_empty() {
        None
    } else {
        let (x_test, y_test) = data.to_matrix(&split.test, &encoders)?;
        Some(accuracy(&model, &x_test, &y_test)?)
    };

    info!(
        features = ?data.schema.columns(),
        train_rows = split.train.len(),
        test_rows = split.test.len(),
        "trained loan model"
    );
    if let Some(acc) = test_accuracy {
        info!("test accuracy: {:.2}%", acc * 100.0);
    }

    Ok(TrainedArtifacts {
        model,
        encoders,
        test_accuracy,
    })
}

/// Trains from `csv_path` and writes both artifacts.
pub fn train_and_save(
    csv_path: &Path,
    paths: &ArtifactPaths,
    config: TrainingConfig,
) -> Result<TrainedArtifacts, TrainingError> {
    let data = TrainingData::from_csv(csv_path)?;
    let trained = train(&data, config)?;
    artifacts::save(paths, &trained.model, &trained.encoders)?;
    Ok(trained)
}

/// Whether the model is missing or older than the training CSV.
pub fn is_stale(csv_path: &Path, paths: &ArtifactPaths) -> bool {
    let mtime = |p: &Path| {
        p.metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH)
    };
    !paths.model.exists() || !paths.encoders.exists() || mtime(csv_path) > mtime(&paths.model)
}

/// Loads the saved artifacts, retraining first when [`is_stale`] says so
/// or when the saved model cannot be read.
pub fn load_or_train_if_stale(
    csv_path: &Path,
    paths: &ArtifactPaths,
    config: TrainingConfig,
) -> Result<LoadedArtifacts, TrainingError> {
    if !is_stale(csv_path, paths) {
        let loaded = artifacts::load(paths);
        if loaded.model.is_some() {
            info!(model = ?paths.model, "model is up to date");
            return Ok(loaded);
        }
        warn!(model = ?paths.model, "saved model unreadable, retraining");
    } else {
        info!("training model (CSV is newer or model missing)");
    }

    let trained = train_and_save(csv_path, paths, config)?;
    Ok(LoadedArtifacts {
        model: Some(trained.model),
        encoders: trained.encoders,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Loan_ID,Gender,Married,Credit_History,LoanAmount,Loan_Status
LP1,Male,Yes,1,120,Y
LP2,Female,No,0,80,N
LP3,,Yes,1,100,Y
LP4,Male,No,1,abc,Y
LP5,Female,Yes,0,95,N
";

    fn record(n: usize) -> LoanRecord {
        LoanRecord {
            cells: vec![n.to_string()],
            approved: n % 2,
        }
    }

    #[test]
    fn csv_headers_are_lowercased_and_id_dropped() {
        let data = TrainingData::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(
            data.schema.columns(),
            &["gender", "married", "credit_history", "loanamount"]
        );
        // LP3 has no gender
        assert_eq!(data.records.len(), 4);
        assert_eq!(data.records[0].approved, 1);
        assert_eq!(data.records[1].approved, 0);
    }

    #[test]
    fn encoders_cover_categorical_columns_only() {
        let data = TrainingData::from_reader(CSV.as_bytes()).unwrap();
        let enc = data.fit_encoders();
        let cols: Vec<_> = enc.columns().collect();
        assert_eq!(cols, vec!["gender", "married"]);
        assert_eq!(enc.get("gender").unwrap().classes(), &["Female", "Male"]);
    }

    #[test]
    fn matrix_encodes_and_zero_fills() {
        let data = TrainingData::from_reader(CSV.as_bytes()).unwrap();
        let enc = data.fit_encoders();
        let (x, y) = data.to_matrix(&data.records, &enc).unwrap();

        assert_eq!(x.dim(), (4, 4));
        assert_eq!(x.row(0).to_vec(), vec![1.0, 1.0, 1.0, 120.0]);
        // LP4 loan amount is unparseable
        assert_eq!(x.row(2).to_vec(), vec![1.0, 0.0, 1.0, 0.0]);
        assert_eq!(y.to_vec(), vec![1, 0, 1, 0]);
    }

    #[test]
    fn bad_target_names_the_row() {
        let csv = "gender,loan_status\nMale,Y\nFemale,maybe\n";
        let err = TrainingData::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            TrainingError::InvalidTarget { row: 2, ref value } if value == "maybe"
        ));
    }

    #[test]
    fn missing_target_column() {
        let err = TrainingData::from_reader("gender\nMale\n".as_bytes()).unwrap_err();
        assert!(matches!(err, TrainingError::MissingColumn(c) if c == TARGET_COLUMN));
    }

    #[test]
    fn target_spellings() {
        for yes in ["Y", "yes", " 1 ", "Approved"] {
            assert_eq!(parse_target(yes), Some(1), "{yes}");
        }
        for no in ["n", "NO", "0", "rejected"] {
            assert_eq!(parse_target(no), Some(0), "{no}");
        }
        assert_eq!(parse_target(""), None);
        assert_eq!(parse_target("pending"), None);
    }

    #[test]
    fn split_is_seeded_and_sized() {
        let data: Vec<_> = (0..10).map(record).collect();
        let a = train_test_split(&data, 0.2, 42);
        let b = train_test_split(&data, 0.2, 42);

        assert_eq!(a.test.len(), 2);
        assert_eq!(a.train.len(), 8);
        assert_eq!(a.test, b.test);
    }

    #[test]
    fn training_reports_accuracy() {
        let data = TrainingData::from_reader(CSV.as_bytes()).unwrap();
        let config = TrainingConfig {
            test_ratio: 0.25,
            ensemble: TreeEnsembleParams {
                n_estimators: 5,
                ..TreeEnsembleParams::default()
            },
            ..TrainingConfig::default()
        };
        let trained = train(&data, config).unwrap();

        assert_eq!(trained.model.schema(), Some(&data.schema));
        let acc = trained.test_accuracy.unwrap();
        assert!((0.0..=1.0).contains(&acc));
    }
}
