use std::fs;
use std::path::{Path, PathBuf};

use juportal_core::RawDocument;
use tracing::{debug, info};

use crate::StoreError;

/// A directory of raw `*.json` documents.
#[derive(Debug, Clone)]
pub struct DocumentSource {
    root: PathBuf,
}

impl DocumentSource {
    /// Open an input root. Fails when it is missing, not a directory or
    /// cannot be listed.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        let root_err = |source| StoreError::InputRoot {
            path: root.clone(),
            source,
        };
        let meta = fs::metadata(&root).map_err(root_err)?;
        if !meta.is_dir() {
            return Err(root_err(std::io::Error::new(
                std::io::ErrorKind::NotADirectory,
                "not a directory",
            )));
        }
        fs::read_dir(&root).map_err(root_err)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All `*.json` files directly under the root, sorted by path.
    pub fn list(&self) -> Result<Vec<PathBuf>, StoreError> {
        let entries = fs::read_dir(&self.root).map_err(|e| StoreError::io(&self.root, e))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.root, e))?;
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        info!(root = %self.root.display(), count = files.len(), "listed input documents");
        Ok(files)
    }

    pub fn read(&self, path: &Path) -> Result<RawDocument, StoreError> {
        let bytes = fs::read(path).map_err(|e| StoreError::io(path, e))?;
        debug!(path = %path.display(), bytes = bytes.len(), "read document");
        RawDocument::from_json(&bytes).map_err(|e| StoreError::json(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = DocumentSource::open(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, StoreError::InputRoot { .. }));

        let file = dir.path().join("a.json");
        fs::write(&file, "{}").unwrap();
        assert!(matches!(
            DocumentSource::open(&file).unwrap_err(),
            StoreError::InputRoot { .. }
        ));
    }

    #[test]
    fn lists_only_json_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b_FR.json"), "{}").unwrap();
        fs::write(dir.path().join("a_NL.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::create_dir(dir.path().join("sub.json")).unwrap();

        let source = DocumentSource::open(dir.path()).unwrap();
        let names: Vec<String> = source
            .list()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a_NL.json", "b_FR.json"]);
    }

    #[test]
    fn read_reports_bad_json_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        let bad = dir.path().join("bad.json");
        fs::write(&good, r#"{"sections": [{"legend": "Fiche 1", "paragraphs": []}]}"#).unwrap();
        fs::write(&bad, "{ not json").unwrap();

        let source = DocumentSource::open(dir.path()).unwrap();
        assert_eq!(source.read(&good).unwrap().sections.len(), 1);
        assert!(matches!(source.read(&bad).unwrap_err(), StoreError::Json { .. }));
    }
}
