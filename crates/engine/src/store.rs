//! Model persistence
//!
//! The (regressor, scaler) pair is stored as two bincode artifacts plus a
//! JSON manifest:
//! - each artifact is stamped with the model version it was trained with
//! - the manifest records both SHA-256 checksums and the feature schema
//! - files are written to a temp path, synced and renamed; the manifest last

use crate::error::{PersistenceError, Result};
use crate::models::FEATURE_NAMES;
use crate::regressor::{Regressor, StandardScaler, TrainedModel, TrainingReport};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const MODEL_FILE: &str = "surge_model.bin";
pub const SCALER_FILE: &str = "surge_scaler.bin";
pub const MANIFEST_FILE: &str = "surge_manifest.json";

/// Metadata written alongside the artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelManifest {
    pub model_version: String,
    pub trained_at: DateTime<Utc>,
    pub feature_names: Vec<String>,
    pub regressor_sha256: String,
    pub scaler_sha256: String,
    pub report: TrainingReport,
}

#[derive(Serialize)]
struct ArtifactRef<'a, T> {
    model_version: &'a str,
    value: &'a T,
}

#[derive(Deserialize)]
struct Artifact<T> {
    model_version: String,
    value: T,
}

/// Directory holding one persisted model
#[derive(Debug, Clone)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Whether all three files are present
    pub fn exists(&self) -> bool {
        [MODEL_FILE, SCALER_FILE, MANIFEST_FILE]
            .iter()
            .all(|name| self.path(name).is_file())
    }

    /// Persist the pair and its manifest
    pub fn save<R: Regressor>(&self, model: &TrainedModel<R>) -> Result<ModelManifest> {
        fs::create_dir_all(&self.dir).map_err(|e| PersistenceError::io(&self.dir, e))?;

        let version = model.model_version();
        let regressor_bytes = encode("regressor", version, model.regressor())?;
        let scaler_bytes = encode("scaler", version, model.scaler())?;

        let manifest = ModelManifest {
            model_version: version.to_string(),
            trained_at: model.trained_at(),
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            regressor_sha256: compute_checksum(&regressor_bytes),
            scaler_sha256: compute_checksum(&scaler_bytes),
            report: model.report().clone(),
        };
        let manifest_bytes =
            serde_json::to_vec_pretty(&manifest).map_err(PersistenceError::Manifest)?;

        write_atomic(&self.path(MODEL_FILE), &regressor_bytes)?;
        write_atomic(&self.path(SCALER_FILE), &scaler_bytes)?;
        write_atomic(&self.path(MANIFEST_FILE), &manifest_bytes)?;

        info!(
            version = %manifest.model_version,
            dir = %self.dir.display(),
            model_bytes = regressor_bytes.len(),
            scaler_bytes = scaler_bytes.len(),
            "Model saved"
        );

        Ok(manifest)
    }

    /// Restore a persisted pair.
    ///
    /// `Ok(None)` when nothing is persisted; an error when the files exist but
    /// do not form a compatible pair.
    pub fn load<R: Regressor>(&self) -> Result<Option<TrainedModel<R>>> {
        if !self.exists() {
            debug!(dir = %self.dir.display(), "No persisted model found");
            return Ok(None);
        }

        let manifest = self.manifest()?;
        if manifest.feature_names != FEATURE_NAMES {
            return Err(PersistenceError::SchemaMismatch(manifest.feature_names).into());
        }

        let regressor_bytes = self.read(MODEL_FILE)?;
        verify_checksum("regressor", &manifest.regressor_sha256, &regressor_bytes)?;
        let scaler_bytes = self.read(SCALER_FILE)?;
        verify_checksum("scaler", &manifest.scaler_sha256, &scaler_bytes)?;

        let regressor: Artifact<R> = decode("regressor", &regressor_bytes)?;
        let scaler: Artifact<StandardScaler> = decode("scaler", &scaler_bytes)?;

        if regressor.model_version != scaler.model_version {
            return Err(PersistenceError::VersionMismatch {
                regressor: regressor.model_version,
                scaler: scaler.model_version,
            }
            .into());
        }

        let model = TrainedModel::from_parts(
            regressor.value,
            scaler.value,
            manifest.trained_at,
            manifest.report,
        )?;
        if model.model_version() != manifest.model_version {
            return Err(PersistenceError::VersionMismatch {
                regressor: model.model_version().to_string(),
                scaler: manifest.model_version,
            }
            .into());
        }

        info!(version = %model.model_version(), dir = %self.dir.display(), "Model loaded");
        Ok(Some(model))
    }

    /// Read the manifest alone
    pub fn manifest(&self) -> Result<ModelManifest> {
        let bytes = self.read(MANIFEST_FILE)?;
        Ok(serde_json::from_slice(&bytes).map_err(PersistenceError::Manifest)?)
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.path(name);
        Ok(fs::read(&path).map_err(|e| PersistenceError::io(path, e))?)
    }
}

fn encode<T: Serialize>(artifact: &'static str, version: &str, value: &T) -> Result<Vec<u8>> {
    let envelope = ArtifactRef {
        model_version: version,
        value,
    };
    Ok(bincode::serialize(&envelope)
        .map_err(|source| PersistenceError::Codec { artifact, source })?)
}

fn decode<T: DeserializeOwned>(artifact: &'static str, bytes: &[u8]) -> Result<Artifact<T>> {
    Ok(bincode::deserialize(bytes)
        .map_err(|source| PersistenceError::Codec { artifact, source })?)
}

fn verify_checksum(artifact: &'static str, expected: &str, bytes: &[u8]) -> Result<()> {
    let actual = compute_checksum(bytes);
    if actual != expected {
        return Err(PersistenceError::ChecksumMismatch {
            artifact,
            expected: expected.to_string(),
            actual,
        }
        .into());
    }
    Ok(())
}

/// Write to a temp file, sync, then rename over the target
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let temp_path = path.with_extension("tmp");
    let mut file = File::create(&temp_path).map_err(|e| PersistenceError::io(&temp_path, e))?;
    file.write_all(bytes)
        .map_err(|e| PersistenceError::io(&temp_path, e))?;
    file.sync_all()
        .map_err(|e| PersistenceError::io(&temp_path, e))?;
    fs::rename(&temp_path, path).map_err(|e| PersistenceError::io(path, e))?;
    Ok(())
}

/// SHA-256 of data as lowercase hex
pub fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SurgeError;
    use crate::regressor::{ForestParams, RandomForestRegressor, TrainingConfig};
    use crate::synthetic::SyntheticDataGenerator;
    use tempfile::TempDir;

    fn train(seed: u64) -> TrainedModel {
        let rows = SyntheticDataGenerator::with_seed(seed).generate(200);
        let forest = RandomForestRegressor::new(ForestParams {
            n_estimators: 5,
            max_depth: Some(5),
            ..ForestParams::default()
        });
        TrainedModel::fit(&rows, forest, &TrainingConfig::default()).unwrap()
    }

    fn rewrite_manifest(store: &ModelStore, edit: impl FnOnce(&mut ModelManifest)) {
        let mut manifest = store.manifest().unwrap();
        edit(&mut manifest);
        fs::write(
            store.dir().join(MANIFEST_FILE),
            serde_json::to_vec(&manifest).unwrap(),
        )
        .unwrap();
    }

    #[test]
    fn test_checksum_is_hex_sha256() {
        assert_eq!(
            compute_checksum(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_load_from_empty_dir_is_none() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::new(dir.path().join("missing"));
        assert!(!store.exists());
        assert!(store.load::<RandomForestRegressor>().unwrap().is_none());
    }

    #[test]
    fn test_save_writes_all_files_without_temp_leftovers() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::new(dir.path());
        let model = train(1);
        let manifest = store.save(&model).unwrap();

        assert!(store.exists());
        assert_eq!(manifest.model_version, model.model_version());
        assert_eq!(manifest.feature_names.len(), FEATURE_NAMES.len());
        let leftovers = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_partial_files_count_as_absent() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::new(dir.path());
        store.save(&train(1)).unwrap();
        fs::remove_file(dir.path().join(SCALER_FILE)).unwrap();
        assert!(store.load::<RandomForestRegressor>().unwrap().is_none());
    }

    #[test]
    fn test_tampered_artifact_fails_checksum() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::new(dir.path());
        store.save(&train(1)).unwrap();

        let path = dir.path().join(MODEL_FILE);
        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        fs::write(&path, bytes).unwrap();

        let err = store.load::<RandomForestRegressor>().unwrap_err();
        assert!(matches!(
            err,
            SurgeError::Persistence(PersistenceError::ChecksumMismatch {
                artifact: "regressor",
                ..
            })
        ));
    }

    #[test]
    fn test_scaler_from_other_run_is_rejected() {
        let dir_a = TempDir::new().unwrap();
        let dir_b = TempDir::new().unwrap();
        let store_a = ModelStore::new(dir_a.path());
        let store_b = ModelStore::new(dir_b.path());
        store_a.save(&train(1)).unwrap();
        store_b.save(&train(2)).unwrap();

        fs::copy(dir_b.path().join(SCALER_FILE), dir_a.path().join(SCALER_FILE)).unwrap();
        let foreign = store_b.manifest().unwrap().scaler_sha256;
        rewrite_manifest(&store_a, |m| m.scaler_sha256 = foreign);

        let err = store_a.load::<RandomForestRegressor>().unwrap_err();
        assert!(matches!(
            err,
            SurgeError::Persistence(PersistenceError::VersionMismatch { .. })
        ));
    }

    #[test]
    fn test_schema_drift_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::new(dir.path());
        store.save(&train(1)).unwrap();
        rewrite_manifest(&store, |m| m.feature_names.swap(0, 1));

        let err = store.load::<RandomForestRegressor>().unwrap_err();
        assert!(matches!(
            err,
            SurgeError::Persistence(PersistenceError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_corrupt_manifest_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::new(dir.path());
        store.save(&train(1)).unwrap();
        fs::write(dir.path().join(MANIFEST_FILE), b"{not json").unwrap();

        let err = store.load::<RandomForestRegressor>().unwrap_err();
        assert!(matches!(
            err,
            SurgeError::Persistence(PersistenceError::Manifest(_))
        ));
    }
}
