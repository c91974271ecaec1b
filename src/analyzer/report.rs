//! Serializable report records written to the results file.
//!
//! Values here are already rounded: 4 places for correlations, betas and
//! ratios, 2 for volatility and week-over-week deltas, 6 for p-values.

use crate::analyzer::correlation::{
    CorrelationStrength, CorrelationTrend, LagCorrelation, Significance,
};
use crate::analyzer::market_indicators::{
    BetaSensitivity, DivergenceKind, RiskLevel, VolatilityComparison,
};
use crate::analyzer::summary::MarketRegime;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PearsonSummary {
    pub value: f64,
    pub p_value: f64,
    pub significance: Significance,
    pub strength: CorrelationStrength,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingSummary {
    pub values: Vec<f64>,
    pub average: f64,
    pub trend: CorrelationTrend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LagAnalysis {
    pub correlations: Vec<LagCorrelation>,
    pub best_lag: LagCorrelation,
    pub interpretation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetaSummary {
    pub value: f64,
    pub interpretation: BetaSensitivity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolatilityAnalysis {
    pub stock_volatility: f64,
    pub crypto_volatility: f64,
    pub ratio: f64,
    pub interpretation: VolatilityComparison,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecouplingEvent {
    pub date: NaiveDate,
    pub stock_change: f64,
    pub crypto_change: f64,
    #[serde(rename = "type")]
    pub kind: DivergenceKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecouplingAnalysis {
    pub total_events: usize,
    pub frequency: f64,
    pub events: Vec<DecouplingEvent>,
    pub risk_level: RiskLevel,
}

/// Full result for one stock/coin pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationAnalysis {
    pub ticker: String,
    pub analysis_period: String,
    pub data_points: usize,
    pub pearson_correlation: PearsonSummary,
    pub rolling_correlation: RollingSummary,
    pub lag_analysis: LagAnalysis,
    pub beta_coefficient: BetaSummary,
    pub volatility_analysis: VolatilityAnalysis,
    pub decoupling_analysis: DecouplingAnalysis,
    pub investment_insight: String,
}

/// Entry for a ticker that could not be analyzed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedAnalysis {
    pub ticker: String,
    pub error: String,
    pub data_points: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TickerOutcome {
    Analyzed(Box<CorrelationAnalysis>),
    Failed(FailedAnalysis),
}

impl TickerOutcome {
    pub fn ticker(&self) -> &str {
        match self {
            TickerOutcome::Analyzed(analysis) => &analysis.ticker,
            TickerOutcome::Failed(failed) => &failed.ticker,
        }
    }

    pub fn data_points(&self) -> usize {
        match self {
            TickerOutcome::Analyzed(analysis) => analysis.data_points,
            TickerOutcome::Failed(failed) => failed.data_points,
        }
    }

    pub fn analysis(&self) -> Option<&CorrelationAnalysis> {
        match self {
            TickerOutcome::Analyzed(analysis) => Some(analysis.as_ref()),
            TickerOutcome::Failed(_) => None,
        }
    }

    pub fn set_ticker(&mut self, ticker: &str) {
        match self {
            TickerOutcome::Analyzed(analysis) => analysis.ticker = ticker.to_string(),
            TickerOutcome::Failed(failed) => failed.ticker = ticker.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketCorrelation {
    pub average: f64,
    pub range: [f64; 2],
    pub interpretation: MarketRegime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSensitivity {
    pub average_beta: f64,
    pub range: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketStability {
    pub average_decoupling_frequency: f64,
    pub most_stable: String,
    pub most_volatile: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    pub market_correlation: MarketCorrelation,
    pub market_sensitivity: MarketSensitivity,
    pub market_stability: MarketStability,
    pub investment_recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SummaryOutcome {
    Ready(MarketSummary),
    Unavailable { error: String },
}

/// One entry per display ticker plus the market-wide `summary`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationReport {
    #[serde(flatten)]
    pub tickers: BTreeMap<String, TickerOutcome>,
    pub summary: SummaryOutcome,
}

impl CorrelationReport {
    pub fn analyzed(&self) -> impl Iterator<Item = &CorrelationAnalysis> {
        self.tickers.values().filter_map(TickerOutcome::analysis)
    }

    pub fn failed(&self) -> impl Iterator<Item = &FailedAnalysis> {
        self.tickers.values().filter_map(|outcome| match outcome {
            TickerOutcome::Failed(failed) => Some(failed),
            TickerOutcome::Analyzed(_) => None,
        })
    }
}
