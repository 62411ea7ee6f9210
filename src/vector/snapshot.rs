//! On-disk snapshot of a [`VectorIndex`].
//!
//! A snapshot is one JSON object:
//!
//! ```json
//! {
//!   "dimension": 3,
//!   "vectors": [[1.0, 0.0, 0.0]],
//!   "metadata": [{"text": "hello"}],
//!   "ids": ["doc_0"],
//!   "next_id": 1
//! }
//! ```
//!
//! `vectors`, `metadata` and `ids` are parallel arrays in insertion order.
//! Writes go to a temporary file in the destination directory which is then
//! renamed over the target, so readers never observe a half-written file.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{RaglineError, Result};
use crate::vector::index::{ID_PREFIX, Metadata, VectorIndex};
use crate::vector::similarity;

/// Serialized form of the whole index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub dimension: usize,
    pub vectors: Vec<Vec<f64>>,
    pub metadata: Vec<Metadata>,
    pub ids: Vec<String>,
    pub next_id: u64,
}

impl Snapshot {
    /// Capture the current state of `index`.
    pub fn from_index(index: &VectorIndex) -> Self {
        let mut vectors = Vec::with_capacity(index.len());
        let mut metadata = Vec::with_capacity(index.len());
        let mut ids = Vec::with_capacity(index.len());
        for record in index.records() {
            vectors.push(record.vector().to_vec());
            metadata.push(record.metadata().clone());
            ids.push(record.id().to_string());
        }

        Self {
            dimension: index.dimension(),
            vectors,
            metadata,
            ids,
            next_id: index.next_id(),
        }
    }

    /// Check the structural invariants of a deserialized snapshot.
    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 {
            return Err(RaglineError::corrupt_snapshot("dimension must be positive"));
        }

        let count = self.ids.len();
        if self.vectors.len() != count || self.metadata.len() != count {
            return Err(RaglineError::corrupt_snapshot(format!(
                "array lengths differ: {} ids, {} vectors, {} metadata",
                count,
                self.vectors.len(),
                self.metadata.len()
            )));
        }

        for (pos, vector) in self.vectors.iter().enumerate() {
            if vector.len() != self.dimension {
                return Err(RaglineError::corrupt_snapshot(format!(
                    "vector {pos} has {} components, expected {}",
                    vector.len(),
                    self.dimension
                )));
            }
            if !similarity::is_finite(vector) {
                return Err(RaglineError::corrupt_snapshot(format!(
                    "vector {pos} contains non-finite components"
                )));
            }
        }

        if self.next_id < count as u64 {
            return Err(RaglineError::corrupt_snapshot(format!(
                "next_id {} is smaller than document count {count}",
                self.next_id
            )));
        }

        let mut seen = HashSet::with_capacity(count);
        for id in &self.ids {
            let sequence = id
                .strip_prefix(ID_PREFIX)
                .and_then(|n| n.parse::<u64>().ok())
                .ok_or_else(|| {
                    RaglineError::corrupt_snapshot(format!("malformed id '{id}'"))
                })?;
            if sequence >= self.next_id {
                return Err(RaglineError::corrupt_snapshot(format!(
                    "id '{id}' is not below next_id {}",
                    self.next_id
                )));
            }
            if !seen.insert(sequence) {
                return Err(RaglineError::corrupt_snapshot(format!(
                    "duplicate id '{id}'"
                )));
            }
        }

        Ok(())
    }

    /// Validate and turn the snapshot into a live index.
    pub fn into_index(self) -> Result<VectorIndex> {
        self.validate()?;
        Ok(VectorIndex::from_parts(
            self.dimension,
            self.ids,
            self.vectors,
            self.metadata,
            self.next_id,
        ))
    }

    /// Read a snapshot from `path`.
    ///
    /// A missing file is an I/O error; anything unparsable is a corrupt
    /// snapshot.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            RaglineError::corrupt_snapshot(format!("{}: {e}", path.display()))
        })?;
        debug!(
            "Read snapshot {} ({} documents)",
            path.display(),
            snapshot.ids.len()
        );
        Ok(snapshot)
    }

    /// Atomically replace `path` with this snapshot, creating parent
    /// directories as needed.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent)?;
                parent.to_path_buf()
            }
            _ => PathBuf::from("."),
        };

        let file_name = path
            .file_name()
            .ok_or_else(|| {
                RaglineError::invalid_argument(format!(
                    "snapshot path has no file name: {}",
                    path.display()
                ))
            })?
            .to_string_lossy();
        let temp_path = dir.join(format!(".{file_name}.{}.tmp", Uuid::new_v4()));

        if let Err(e) = self.write_file(&temp_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
        if let Err(e) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        debug!(
            "Wrote snapshot {} ({} documents)",
            path.display(),
            self.ids.len()
        );
        Ok(())
    }

    fn write_file(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        let file = writer
            .into_inner()
            .map_err(|e| RaglineError::Io(e.into_error()))?;
        file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn sample_index() -> VectorIndex {
        let mut index = VectorIndex::new(3).unwrap();
        let metadata = json!({"text": "alpha", "tags": ["a", "b"]})
            .as_object()
            .cloned();
        index.insert(vec![0.1, 0.2, 0.3], metadata).unwrap();
        index.insert(vec![-1.5, 0.0, 2.25], None).unwrap();
        index
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("db.json");
        let index = sample_index();

        index.save(&path).unwrap();
        let loaded = VectorIndex::load(&path).unwrap();

        assert_eq!(loaded.stats(), index.stats());
        for (a, b) in index.records().zip(loaded.records()) {
            assert_eq!(a.id(), b.id());
            assert_eq!(a.metadata(), b.metadata());
            for (x, y) in a.vector().iter().zip(b.vector()) {
                assert!((x - y).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_snapshot_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        sample_index().save(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let obj = value.as_object().unwrap();
        let mut keys: Vec<&str> = obj.keys().map(|k| k.as_str()).collect();
        keys.sort();
        assert_eq!(keys, vec!["dimension", "ids", "metadata", "next_id", "vectors"]);
        assert_eq!(obj["dimension"], json!(3));
        assert_eq!(obj["ids"], json!(["doc_0", "doc_1"]));
        assert_eq!(obj["next_id"], json!(2));
        assert_eq!(obj["metadata"][1], json!({}));
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        let index = sample_index();
        index.save(&path).unwrap();
        index.save(&path).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("db.json")]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = VectorIndex::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, RaglineError::Io(_)));
    }

    #[test]
    fn test_invalid_json_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, "not json").unwrap();
        let err = VectorIndex::load(&path).unwrap_err();
        assert!(matches!(err, RaglineError::CorruptSnapshot(_)));
    }

    #[test]
    fn test_missing_field_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        fs::write(
            &path,
            r#"{"dimension": 2, "vectors": [], "metadata": [], "ids": []}"#,
        )
        .unwrap();
        let err = VectorIndex::load(&path).unwrap_err();
        assert!(matches!(err, RaglineError::CorruptSnapshot(_)));
    }

    #[test]
    fn test_validate_rejects_inconsistencies() {
        let good = Snapshot::from_index(&sample_index());
        assert!(good.validate().is_ok());

        let mut bad = good.clone();
        bad.ids.pop();
        assert!(matches!(bad.validate(), Err(RaglineError::CorruptSnapshot(_))));

        let mut bad = good.clone();
        bad.vectors[0].push(1.0);
        assert!(matches!(bad.validate(), Err(RaglineError::CorruptSnapshot(_))));

        let mut bad = good.clone();
        bad.next_id = 1;
        assert!(matches!(bad.validate(), Err(RaglineError::CorruptSnapshot(_))));

        let mut bad = good.clone();
        bad.ids[1] = bad.ids[0].clone();
        assert!(matches!(bad.validate(), Err(RaglineError::CorruptSnapshot(_))));

        let mut bad = good.clone();
        bad.ids[0] = format!("doc_{}", good.next_id);
        assert!(matches!(bad.validate(), Err(RaglineError::CorruptSnapshot(_))));

        let mut bad = good.clone();
        bad.ids[0] = "first".to_string();
        assert!(matches!(bad.validate(), Err(RaglineError::CorruptSnapshot(_))));

        let mut bad = good.clone();
        bad.ids[0] = "doc_-1".to_string();
        assert!(matches!(bad.validate(), Err(RaglineError::CorruptSnapshot(_))));

        let mut bad = good;
        bad.dimension = 0;
        assert!(matches!(bad.validate(), Err(RaglineError::CorruptSnapshot(_))));
    }

    #[test]
    fn test_load_rejects_id_the_counter_would_mint() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        fs::write(
            &path,
            r#"{"dimension": 2, "vectors": [[1.0, 0.0]], "metadata": [{}], "ids": ["doc_1"], "next_id": 1}"#,
        )
        .unwrap();

        let err = VectorIndex::load(&path).unwrap_err();
        assert!(matches!(err, RaglineError::CorruptSnapshot(_)));
    }

    #[test]
    fn test_loaded_index_continues_counter() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        let mut snapshot = Snapshot::from_index(&sample_index());
        snapshot.next_id = 7;
        snapshot.write(&path).unwrap();

        let mut index = VectorIndex::load(&path).unwrap();
        assert_eq!(index.insert(vec![1.0, 1.0, 1.0], None).unwrap(), "doc_7");
    }
}
