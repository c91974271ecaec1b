use std::path::Path;
use std::process::ExitCode;
use stockcoin_correlator::analyzer::{Analyzer, CorrelationReport, PairAnalyzer, SummaryOutcome};
use stockcoin_correlator::config::load_config_or_default;
use stockcoin_correlator::source::{DatasetSource, JsonFileSource};
use stockcoin_correlator::storage::ReportStore;
use tracing::{error, info, warn};

const CONFIG_PATH: &str = "config.json";

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load configuration from file
    let config = match load_config_or_default(Path::new(CONFIG_PATH)) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // The whole dataset is read up front; without it there is no report at all.
    let source = JsonFileSource::new(config.dataset_paths.clone());
    let dataset = match source.load().await {
        Ok(dataset) => dataset,
        Err(e) => {
            error!("❌ Baseline dataset load failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let analyzer = PairAnalyzer::new();
    let report = analyzer.analyze_all(&dataset, &config.aliases());

    let store = ReportStore::new(config.output_path.clone());
    if let Err(e) = store.save(&report).await {
        error!("❌ Failed to save report: {}", e);
        return ExitCode::FAILURE;
    }

    log_summary(&report);
    ExitCode::SUCCESS
}

/// Logs the market summary and any tickers that could not be analyzed.
fn log_summary(report: &CorrelationReport) {
    info!("✅ {} pairs analyzed", report.analyzed().count());
    for failed in report.failed() {
        warn!(
            "{}: {} ({} data points)",
            failed.ticker, failed.error, failed.data_points
        );
    }

    match &report.summary {
        SummaryOutcome::Ready(summary) => {
            info!("=== Market summary ===");
            info!(
                "Average correlation: {} ({})",
                summary.market_correlation.average, summary.market_correlation.interpretation
            );
            info!("Most stable pair: {}", summary.market_stability.most_stable);
            info!("Most volatile pair: {}", summary.market_stability.most_volatile);
            for recommendation in &summary.investment_recommendations {
                info!("- {}", recommendation);
            }
        }
        SummaryOutcome::Unavailable { error } => warn!("Market summary unavailable: {}", error),
    }
}
