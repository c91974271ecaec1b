use crate::analyzer::report::{
    CorrelationAnalysis, MarketCorrelation, MarketSensitivity, MarketStability, MarketSummary,
    SummaryOutcome,
};
use crate::utils::round4;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fmt;

pub const NO_VALID_RESULTS: &str = "no valid analysis results";

const STABLE_PICKS: usize = 3;
const TRADING_PICKS: usize = 2;
const PAIR_TRADING_CORRELATION: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketRegime {
    #[serde(rename = "market moves in lockstep, elevated systemic risk")]
    Lockstep,
    #[serde(rename = "moderately correlated market, some diversification benefit")]
    Moderate,
    #[serde(rename = "weakly correlated market, strong diversification benefit")]
    Diversified,
}

impl MarketRegime {
    pub fn classify(average_correlation: f64) -> Self {
        if average_correlation > 0.6 {
            Self::Lockstep
        } else if average_correlation > 0.3 {
            Self::Moderate
        } else {
            Self::Diversified
        }
    }
}

impl fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Lockstep => "market moves in lockstep, elevated systemic risk",
            Self::Moderate => "moderately correlated market, some diversification benefit",
            Self::Diversified => "weakly correlated market, strong diversification benefit",
        };
        f.write_str(text)
    }
}

/// Aggregates every successfully analyzed pair. Failed tickers must already be
/// filtered out by the caller.
pub fn market_summary(analyses: &[&CorrelationAnalysis]) -> SummaryOutcome {
    if analyses.is_empty() {
        return SummaryOutcome::Unavailable {
            error: NO_VALID_RESULTS.to_string(),
        };
    }

    let correlations: Vec<f64> = analyses
        .iter()
        .map(|a| a.pearson_correlation.value)
        .collect();
    let betas: Vec<f64> = analyses.iter().map(|a| a.beta_coefficient.value).collect();
    let frequencies: Vec<f64> = analyses
        .iter()
        .map(|a| a.decoupling_analysis.frequency)
        .collect();

    let average_correlation = correlations.iter().mean();

    SummaryOutcome::Ready(MarketSummary {
        market_correlation: MarketCorrelation {
            average: round4(average_correlation),
            range: range(&correlations),
            interpretation: MarketRegime::classify(average_correlation),
        },
        market_sensitivity: MarketSensitivity {
            average_beta: round4(betas.iter().mean()),
            range: range(&betas),
        },
        market_stability: MarketStability {
            average_decoupling_frequency: round4(frequencies.iter().mean()),
            most_stable: first_extreme(analyses, |candidate, best| candidate < best),
            most_volatile: first_extreme(analyses, |candidate, best| candidate > best),
        },
        investment_recommendations: recommendations(analyses),
    })
}

fn range(values: &[f64]) -> [f64; 2] {
    let low = values.iter().copied().fold(f64::INFINITY, f64::min);
    let high = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    [round4(low), round4(high)]
}

/// Ticker whose decoupling frequency beats all earlier ones under `better`.
fn first_extreme(analyses: &[&CorrelationAnalysis], better: fn(f64, f64) -> bool) -> String {
    let mut best: Option<&CorrelationAnalysis> = None;
    for analysis in analyses {
        let replace = match best {
            None => true,
            Some(current) => better(
                analysis.decoupling_analysis.frequency,
                current.decoupling_analysis.frequency,
            ),
        };
        if replace {
            best = Some(*analysis);
        }
    }
    best.map(|a| a.ticker.clone()).unwrap_or_default()
}

fn recommendations(analyses: &[&CorrelationAnalysis]) -> Vec<String> {
    let mut out = Vec::new();

    let stable: Vec<&str> = analyses
        .iter()
        .filter(|a| a.decoupling_analysis.risk_level.is_stable())
        .map(|a| a.ticker.as_str())
        .collect();
    if !stable.is_empty() {
        out.push(format!(
            "stable investment candidates: {}",
            stable[..stable.len().min(STABLE_PICKS)].join(", ")
        ));
    }

    let volatile: Vec<&str> = analyses
        .iter()
        .filter(|a| !a.decoupling_analysis.risk_level.is_stable())
        .map(|a| a.ticker.as_str())
        .collect();
    if !volatile.is_empty() {
        out.push(format!(
            "short-term trading candidates: {}",
            volatile[..volatile.len().min(TRADING_PICKS)].join(", ")
        ));
    }

    let paired: Vec<&str> = analyses
        .iter()
        .filter(|a| a.pearson_correlation.value.abs() > PAIR_TRADING_CORRELATION)
        .map(|a| a.ticker.as_str())
        .collect();
    if !paired.is_empty() {
        out.push(format!("pair-trading candidates: {}", paired.join(", ")));
    }

    out
}
