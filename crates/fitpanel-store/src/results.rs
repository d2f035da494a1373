use std::path::{Path, PathBuf};

use polars::prelude::DataFrame;
use tracing::debug;

use crate::codec::{frame_to_csv_bytes, write_atomic};
use crate::error::{Result, StoreError};

/// Writes named result tables as `<dir>/<name>.csv`.
#[derive(Debug, Clone)]
pub struct ResultWriter {
    dir: PathBuf,
}

impl ResultWriter {
    pub fn create(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir).map_err(|e| StoreError::io("create directory", dir, e))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, name: &str, frame: &DataFrame) -> Result<PathBuf> {
        let path = self.dir.join(format!("{name}.csv"));
        write_atomic(&path, &frame_to_csv_bytes(frame)?)?;
        debug!(table = name, rows = frame.height(), path = %path.display(), "wrote result table");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use fitpanel_common::{f64_column, string_column};
    use insta::assert_snapshot;

    use super::*;

    #[test]
    fn writes_named_csv() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ResultWriter::create(&dir.path().join("analysis")).unwrap();
        let frame = DataFrame::new(vec![
            string_column("metric", vec![Some("active_users".into())]),
            f64_column("value", vec![Some(30.0)]),
        ])
        .unwrap();
        let path = writer.write("business_insights", &frame).unwrap();
        assert!(path.ends_with("analysis/business_insights.csv"));
        let text = std::fs::read_to_string(path).unwrap();
        assert_snapshot!(text.lines().next().unwrap(), @"metric,value");
    }
}
