use crate::model::{BaselineDataset, DatasetError};
use crate::source::traits::DatasetSource;

/// Serves a dataset that was built in memory by the caller.
pub struct InMemorySource {
    dataset: BaselineDataset,
}

impl InMemorySource {
    pub fn new(dataset: BaselineDataset) -> Self {
        Self { dataset }
    }
}

#[async_trait::async_trait]
impl DatasetSource for InMemorySource {
    async fn load(&self) -> Result<BaselineDataset, DatasetError> {
        if self.dataset.weeks.is_empty() {
            return Err(DatasetError::Empty);
        }
        Ok(self.dataset.clone())
    }
}
