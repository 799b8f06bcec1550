use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use juportal_core::schema;
use juportal_core::{DedupDecision, TransformedRecord};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::StoreError;

/// Append-only deduplication log, one JSON decision per line.
pub const DEDUP_LOG: &str = "dedup_log.jsonl";
pub const RUN_STATS: &str = "run_stats.json";
/// Sorted file names of records that ended with `isValid = false`.
pub const INVALID_FILES: &str = "invalid_files.json";

/// Output directory of a run.
#[derive(Debug, Clone)]
pub struct OutputSink {
    dir: PathBuf,
}

/// Records reloaded from a previous output directory.
#[derive(Debug, Default)]
pub struct LoadedRecords {
    pub records: Vec<TransformedRecord>,
    /// `(fileName, reason)` for files that could not be reloaded.
    pub rejected: Vec<(String, String)>,
}

impl OutputSink {
    /// Create the directory (and parents) if needed.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn is_artifact(name: &str) -> bool {
        matches!(name, RUN_STATS | INVALID_FILES)
    }

    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<(), StoreError> {
        let file = File::create(path).map_err(|e| StoreError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value).map_err(|e| StoreError::json(path, e))?;
        writer.flush().map_err(|e| StoreError::io(path, e))
    }

    /// Write one record to `<dir>/<fileName>`, replacing any previous copy.
    pub fn write_record(&self, record: &TransformedRecord) -> Result<PathBuf, StoreError> {
        let name = Path::new(&record.file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| *n == record.file_name && !Self::is_artifact(n))
            .ok_or_else(|| StoreError::BadFileName(record.file_name.clone()))?;
        let path = self.dir.join(name);
        self.write_json(&path, record)?;
        debug!(path = %path.display(), "wrote record");
        Ok(path)
    }

    /// Append decisions to the dedup log. Earlier entries are never rewritten.
    pub fn append_dedup_log(&self, decisions: &[DedupDecision]) -> Result<(), StoreError> {
        let path = self.dir.join(DEDUP_LOG);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StoreError::io(&path, e))?;
        let mut writer = BufWriter::new(file);
        for decision in decisions {
            serde_json::to_writer(&mut writer, decision).map_err(|e| StoreError::json(&path, e))?;
            writer.write_all(b"\n").map_err(|e| StoreError::io(&path, e))?;
        }
        writer.flush().map_err(|e| StoreError::io(&path, e))?;
        info!(path = %path.display(), entries = decisions.len(), "appended dedup log");
        Ok(())
    }

    pub fn write_stats<T: Serialize>(&self, stats: &T) -> Result<PathBuf, StoreError> {
        let path = self.dir.join(RUN_STATS);
        self.write_json(&path, stats)?;
        Ok(path)
    }

    /// Write the sorted list of records with `isValid = false`.
    pub fn write_invalid_list(&self, records: &[TransformedRecord]) -> Result<usize, StoreError> {
        let mut invalid: Vec<&str> = records
            .iter()
            .filter(|r| !r.is_valid)
            .map(|r| r.file_name.as_str())
            .collect();
        invalid.sort_unstable();
        let path = self.dir.join(INVALID_FILES);
        self.write_json(&path, &invalid)?;
        Ok(invalid.len())
    }

    /// Reload the records of a previous run, sorted by file name.
    ///
    /// Run artifacts are skipped. A file that is not JSON or lacks part of
    /// the output schema is rejected with a reason instead of failing the load.
    pub fn load_records(&self) -> Result<LoadedRecords, StoreError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| StoreError::io(&self.dir, e))?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if path.is_file() && name.ends_with(".json") && !Self::is_artifact(name) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut loaded = LoadedRecords::default();
        for path in paths {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            match Self::load_one(&path) {
                Ok(record) => loaded.records.push(record),
                Err(reason) => {
                    warn!(file = %name, reason = %reason, "skipping unloadable record");
                    loaded.rejected.push((name, reason));
                }
            }
        }
        info!(
            dir = %self.dir.display(),
            records = loaded.records.len(),
            rejected = loaded.rejected.len(),
            "reloaded previous output"
        );
        Ok(loaded)
    }

    fn load_one(path: &Path) -> Result<TransformedRecord, String> {
        let bytes = fs::read(path).map_err(|e| e.to_string())?;
        let value: serde_json::Value = serde_json::from_slice(&bytes).map_err(|e| e.to_string())?;
        let missing = schema::missing_fields(&value);
        if !missing.is_empty() {
            return Err(format!("missing fields: {}", missing.join(", ")));
        }
        serde_json::from_value(value).map_err(|e| e.to_string())
    }
}
