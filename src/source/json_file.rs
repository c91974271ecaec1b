use crate::model::{BaselineDataset, DatasetError};
use crate::parser::{BaselineParser, Parser};
use crate::source::traits::DatasetSource;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info};

/// Reads the dataset from the first candidate file that exists.
pub struct JsonFileSource {
    candidates: Vec<PathBuf>,
    parser: BaselineParser,
}

impl JsonFileSource {
    pub fn new<I, P>(candidates: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            candidates: candidates.into_iter().map(Into::into).collect(),
            parser: BaselineParser::new(),
        }
    }

    fn tried(&self) -> String {
        self.candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[async_trait::async_trait]
impl DatasetSource for JsonFileSource {
    async fn load(&self) -> Result<BaselineDataset, DatasetError> {
        for path in &self.candidates {
            let raw = match fs::read(path).await {
                Ok(raw) => raw,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    debug!("Dataset candidate {} not found", path.display());
                    continue;
                }
                Err(source) => {
                    return Err(DatasetError::Io {
                        path: path.clone(),
                        source,
                    });
                }
            };

            let dataset = self.parser.parse(&raw)?;
            info!(
                "📂 Loaded {} weeks of baseline data from {}",
                dataset.weeks.len(),
                path.display()
            );
            return Ok(dataset);
        }

        Err(DatasetError::NotFound(self.tried()))
    }
}
