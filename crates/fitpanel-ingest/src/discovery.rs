//! File discovery and dataset matching.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fitpanel_model::{Dataset, DatasetRegistry};
use tracing::{debug, warn};

use crate::error::{IngestError, Result};

/// Raw files found in an input directory, keyed by dataset.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub files: BTreeMap<Dataset, PathBuf>,
    /// CSV files that matched no dataset pattern.
    pub unmatched: Vec<PathBuf>,
    /// Later files matching an already-claimed dataset.
    pub duplicates: Vec<PathBuf>,
}

impl Discovery {
    /// Registry datasets with no raw file.
    pub fn missing(&self, registry: &DatasetRegistry) -> Vec<Dataset> {
        registry
            .specs()
            .iter()
            .map(|spec| spec.dataset)
            .filter(|dataset| !self.files.contains_key(dataset))
            .collect()
    }
}

/// Lists all CSV files in a directory, sorted by filename.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Matches every CSV file in `dir` against the registry patterns.
///
/// Matching is a case-insensitive substring test on the file stem; the
/// longest matching pattern wins. When two files match one dataset the first
/// in filename order is used.
pub fn discover_datasets(dir: &Path, registry: &DatasetRegistry) -> Result<Discovery> {
    let mut discovery = Discovery::default();
    for path in list_csv_files(dir)? {
        let stem = path
            .file_stem()
            .and_then(|v| v.to_str())
            .unwrap_or("")
            .to_string();

        match registry.match_file_stem(&stem) {
            Some(dataset) if discovery.files.contains_key(&dataset) => {
                warn!(dataset = %dataset, path = %path.display(), "ignoring second file for dataset");
                discovery.duplicates.push(path);
            }
            Some(dataset) => {
                debug!(dataset = %dataset, path = %path.display(), "matched raw file");
                discovery.files.insert(dataset, path);
            }
            None => {
                debug!(path = %path.display(), "no dataset matches file");
                discovery.unmatched.push(path);
            }
        }
    }
    Ok(discovery)
}
