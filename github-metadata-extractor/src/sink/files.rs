use super::SinkError;
use crate::client::{AccountMetadata, RepositoryMetadata};
use crate::metrics::QualityMetrics;
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tracing::info;

/// Writes run output as pretty-printed JSON files.
///
/// Files are named after the account identifier:
///
/// | File                                      | Content                     |
/// |-------------------------------------------|-----------------------------|
/// | `{identifier}_user_metadata.json`         | account profile             |
/// | `{identifier}_repo_metadata.json`         | repositories as fetched     |
/// | `{identifier}_repo_metadata_with_tags.json` | repositories with auto-tags |
/// | `{identifier}_quality_metrics.json`       | quality metrics             |
#[derive(Debug, Clone)]
pub struct FileSink {
    output_dir: PathBuf,
}

impl FileSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Writes the fetched account and repositories.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the directory cannot be created or a file
    /// cannot be written.
    pub fn write_fetched(
        &self,
        identifier: &str,
        account: &AccountMetadata,
        repositories: &[RepositoryMetadata],
    ) -> Result<Vec<PathBuf>, SinkError> {
        Ok(vec![
            self.write_json(&format!("{identifier}_user_metadata.json"), account)?,
            self.write_json(&format!("{identifier}_repo_metadata.json"), repositories)?,
        ])
    }

    /// Writes the enriched repositories and their quality metrics.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the directory cannot be created or a file
    /// cannot be written.
    pub fn write_analysis(
        &self,
        identifier: &str,
        repositories: &[RepositoryMetadata],
        metrics: &QualityMetrics,
    ) -> Result<Vec<PathBuf>, SinkError> {
        Ok(vec![
            self.write_json(
                &format!("{identifier}_repo_metadata_with_tags.json"),
                repositories,
            )?,
            self.write_json(&format!("{identifier}_quality_metrics.json"), metrics)?,
        ])
    }

    /// Serializes `value` with a 4-space indent and atomically replaces
    /// `file_name` in the output directory.
    fn write_json<T: Serialize + ?Sized>(
        &self,
        file_name: &str,
        value: &T,
    ) -> Result<PathBuf, SinkError> {
        let path = self.output_dir.join(file_name);
        let io_error = |source| SinkError::Io {
            path: path.clone(),
            source,
        };

        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        value.serialize(&mut serializer)?;

        std::fs::create_dir_all(&self.output_dir).map_err(io_error)?;
        let mut file = NamedTempFile::new_in(&self.output_dir).map_err(io_error)?;
        file.write_all(&buffer).map_err(io_error)?;
        file.persist(&path).map_err(|e| io_error(e.error))?;

        info!(path = %path.display(), "Wrote output file");
        Ok(path)
    }
}
