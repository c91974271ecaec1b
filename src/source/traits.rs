use crate::model::{BaselineDataset, DatasetError};

#[async_trait::async_trait]
pub trait DatasetSource: Send + Sync {
    /// Loads the complete dataset once, before any analysis starts.
    async fn load(&self) -> Result<BaselineDataset, DatasetError>;
}
