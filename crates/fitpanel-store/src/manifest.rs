//! `manifest.json` for a cleaned directory.

use std::path::Path;

use fitpanel_model::Dataset;
use serde::{Deserialize, Serialize};

use crate::codec::write_atomic;
use crate::error::{Result, StoreError};

pub const MANIFEST_FILE: &str = "manifest.json";

/// Row counts and content digests of every cleaned table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub tables: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub dataset: Dataset,
    pub file: String,
    pub rows: usize,
    pub sha256: String,
}

impl Manifest {
    pub fn entry(&self, dataset: Dataset) -> Option<&ManifestEntry> {
        self.tables.iter().find(|entry| entry.dataset == dataset)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let mut bytes = serde_json::to_vec_pretty(self).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        bytes.push(b'\n');
        write_atomic(path, &bytes)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| StoreError::io("read", path, e))?;
        serde_json::from_slice(&bytes).map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}
