pub mod json_file;
pub mod memory;
pub mod traits;

pub use json_file::JsonFileSource;
pub use memory::InMemorySource;
pub use traits::DatasetSource;
