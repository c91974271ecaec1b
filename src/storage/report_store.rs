use crate::analyzer::CorrelationReport;
use crate::model::ReportError;
use std::path::PathBuf;
use tokio::fs;
use tracing::info;

/// Writes the correlation report to a single JSON results file.
pub struct ReportStore {
    path: PathBuf,
}

impl ReportStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Serializes the whole report, then writes it to a temp file and renames
    /// it over the destination so readers never see a partial file.
    pub async fn save(&self, report: &CorrelationReport) -> Result<(), ReportError> {
        let json = serde_json::to_vec_pretty(report)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|source| self.io_error(source))?;
        }

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        fs::write(&tmp_path, json).await.map_err(|source| self.io_error(source))?;
        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|source| self.io_error(source))?;

        info!("💾 Correlation report saved to {}", self.path.display());
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> ReportError {
        ReportError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
