pub mod baseline_parser;

pub use baseline_parser::{BaselineParser, Parser, deserialize_weeks};
