// Analyzer module: statistics, per-pair analysis and the market-wide summary.

pub mod correlation;
pub mod insight;
pub mod market_indicators;
pub mod pair_analysis;
pub mod report;
pub mod summary;

// Re-export the pair analyzer and the report types it produces.
pub use pair_analysis::{Analyzer, PairAnalyzer};
pub use report::{CorrelationReport, SummaryOutcome, TickerOutcome};
