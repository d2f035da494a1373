use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fitpanel_model::Dataset;
use polars::prelude::DataFrame;
use tracing::{debug, info};

use crate::codec::{
    frame_to_csv_bytes, read_string_columns, read_string_frame, restore_types, write_atomic,
};
use crate::error::{Result, StoreError};
use crate::hash::sha256_hex;
use crate::manifest::{MANIFEST_FILE, Manifest, ManifestEntry};
use crate::store::CleanedStore;

/// One `<dataset>.csv` per table in a directory.
#[derive(Debug, Clone)]
pub struct CsvStore {
    dir: PathBuf,
    entries: BTreeMap<Dataset, ManifestEntry>,
}

impl CsvStore {
    /// Prepares `dir` for a fresh run.
    ///
    /// Creates the directory and removes dataset files and the manifest left
    /// by an earlier run, so the directory reflects only what this run puts.
    pub fn create(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir).map_err(|e| StoreError::io("create directory", dir, e))?;
        let store = Self {
            dir: dir.to_path_buf(),
            entries: BTreeMap::new(),
        };
        for dataset in Dataset::ALL {
            store.remove_file(&store.table_path(dataset))?;
        }
        store.remove_file(&store.manifest_path())?;
        Ok(store)
    }

    /// Opens an existing cleaned directory for reading.
    pub fn open(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(StoreError::io(
                "open",
                dir,
                std::io::Error::new(std::io::ErrorKind::NotFound, "directory not found"),
            ));
        }
        let manifest_path = dir.join(MANIFEST_FILE);
        let entries = if manifest_path.is_file() {
            Manifest::read(&manifest_path)?
                .tables
                .into_iter()
                .map(|entry| (entry.dataset, entry))
                .collect()
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            dir: dir.to_path_buf(),
            entries,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn table_path(&self, dataset: Dataset) -> PathBuf {
        self.dir.join(format!("{}.csv", dataset.as_str()))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    /// Manifest of the tables written or loaded so far.
    pub fn manifest(&self) -> Manifest {
        Manifest {
            tables: self.entries.values().cloned().collect(),
        }
    }

    pub fn write_manifest(&self) -> Result<PathBuf> {
        let path = self.manifest_path();
        self.manifest().write(&path)?;
        info!(path = %path.display(), tables = self.entries.len(), "wrote manifest");
        Ok(path)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => {
                debug!(path = %path.display(), "removed stale file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io("remove", path, e)),
        }
    }
}

impl CleanedStore for CsvStore {
    fn put(&mut self, dataset: Dataset, frame: DataFrame) -> Result<()> {
        let path = self.table_path(dataset);
        let bytes = frame_to_csv_bytes(&frame)?;
        write_atomic(&path, &bytes)?;
        let entry = ManifestEntry {
            dataset,
            file: format!("{}.csv", dataset.as_str()),
            rows: frame.height(),
            sha256: sha256_hex(&bytes),
        };
        debug!(dataset = %dataset, rows = entry.rows, path = %path.display(), "stored table");
        self.entries.insert(dataset, entry);
        Ok(())
    }

    fn get(&self, dataset: Dataset) -> Result<DataFrame> {
        let path = self.table_path(dataset);
        if !path.is_file() {
            return Ok(DataFrame::empty());
        }
        let raw = read_string_frame(&path)?;
        restore_types(dataset, &raw, &path)
    }

    fn get_keys(&self, dataset: Dataset) -> Result<DataFrame> {
        let path = self.table_path(dataset);
        if !path.is_file() {
            return Ok(DataFrame::empty());
        }
        read_string_columns(&path, &dataset.key_columns())
    }

    fn contains(&self, dataset: Dataset) -> bool {
        self.table_path(dataset).is_file()
    }

    fn datasets(&self) -> Vec<Dataset> {
        Dataset::ALL
            .into_iter()
            .filter(|dataset| self.contains(*dataset))
            .collect()
    }
}
