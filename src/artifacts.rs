//! Persisted model and encoder blobs.
//!
//! Both artifacts are MessagePack documents written with named fields.
//! Loading never fails the process: a missing or unreadable model comes
//! back as `None`, a missing encoder table as an empty one.

use crate::encoder::EncoderTable;
use crate::error::ArtifactError;
use crate::model::ModelArtifact;
use rmp_serde::{decode::from_read, encode::write_named};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const MODEL_PATH: &str = "assets/data/trained_model.msgpack";
pub const ENCODER_PATH: &str = "assets/data/label_encoders.msgpack";

/// Locations of the two artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub encoders: PathBuf,
}

impl ArtifactPaths {
    pub fn new(model: impl Into<PathBuf>, encoders: impl Into<PathBuf>) -> Self {
        ArtifactPaths {
            model: model.into(),
            encoders: encoders.into(),
        }
    }

    /// Both artifacts under `dir`, using the standard file names.
    pub fn in_dir(dir: &Path) -> Self {
        let file = |p: &str| dir.join(Path::new(p).file_name().unwrap_or_default());
        ArtifactPaths::new(file(MODEL_PATH), file(ENCODER_PATH))
    }
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        ArtifactPaths::new(MODEL_PATH, ENCODER_PATH)
    }
}

/// What was found on disk at startup.
pub struct LoadedArtifacts {
    pub model: Option<ModelArtifact>,
    pub encoders: EncoderTable,
}

/// Loads both artifacts, degrading to absent/empty on any failure.
pub fn load(paths: &ArtifactPaths) -> LoadedArtifacts {
    let model = match read_blob::<ModelArtifact>(&paths.model) {
        Ok(model) => {
            info!(path = ?paths.model, trees = model.forest.n_estimators(), "loaded model");
            Some(model)
        }
        Err(e) => {
            warn!("model unavailable: {e}");
            None
        }
    };

    let encoders = match read_blob::<EncoderTable>(&paths.encoders) {
        Ok(table) => {
            info!(path = ?paths.encoders, columns = table.len(), "loaded encoders");
            table
        }
        Err(e) => {
            warn!("encoders unavailable: {e}");
            EncoderTable::new()
        }
    };

    LoadedArtifacts { model, encoders }
}

/// Writes both artifacts, creating parent directories as needed.
pub fn save(
    paths: &ArtifactPaths,
    model: &ModelArtifact,
    encoders: &EncoderTable,
) -> Result<(), ArtifactError> {
    write_blob(&paths.model, model)?;
    write_blob(&paths.encoders, encoders)?;
    info!(model = ?paths.model, encoders = ?paths.encoders, "saved artifacts");
    Ok(())
}

/// Decodes one MessagePack artifact.
pub fn read_blob<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let file = File::open(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    from_read(BufReader::new(file)).map_err(|source| ArtifactError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Encodes `value` as MessagePack with named fields.
pub fn write_blob<T: Serialize>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let io_err = |source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    write_named(&mut writer, value).map_err(|source| ArtifactError::Encode {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::CategoricalEncoder;
    use tempfile::TempDir;

    #[test]
    fn missing_files_degrade_to_absent() {
        let dir = TempDir::new().unwrap();
        let loaded = load(&ArtifactPaths::in_dir(dir.path()));
        assert!(loaded.model.is_none());
        assert!(loaded.encoders.is_empty());
    }

    #[test]
    fn corrupt_model_is_treated_as_absent() {
        let dir = TempDir::new().unwrap();
        let paths = ArtifactPaths::in_dir(dir.path());
        fs::write(&paths.model, b"not messagepack").unwrap();

        let loaded = load(&paths);
        assert!(loaded.model.is_none());
    }

    #[test]
    fn encoder_table_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/enc.msgpack");

        let mut table = EncoderTable::new();
        table.insert("gender", CategoricalEncoder::fit(["Male", "Female"]));
        write_blob(&path, &table).unwrap();

        let back: EncoderTable = read_blob(&path).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn default_paths_are_fixed() {
        let paths = ArtifactPaths::default();
        assert_eq!(paths.model, PathBuf::from(MODEL_PATH));
        assert_eq!(paths.encoders, PathBuf::from(ENCODER_PATH));
    }
}
