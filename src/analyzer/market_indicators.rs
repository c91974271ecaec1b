use crate::analyzer::correlation::has_variance;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Week-over-week move thresholds, in percentage points of the normalized series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecouplingThresholds {
    /// Move that counts as large for the leading asset.
    pub major: f64,
    /// Opposing move required from the other asset.
    pub minor: f64,
}

impl Default for DecouplingThresholds {
    fn default() -> Self {
        Self {
            major: 2.0,
            minor: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DivergenceKind {
    #[serde(rename = "stock divergence")]
    Stock,
    #[serde(rename = "crypto divergence")]
    Crypto,
}

/// A single week in which stock and coin moved against each other.
#[derive(Debug, Clone, PartialEq)]
pub struct DivergenceEvent {
    pub date: NaiveDate,
    pub stock_change: f64,
    pub crypto_change: f64,
    pub kind: DivergenceKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "high")]
    High,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "low")]
    Low,
    #[serde(rename = "very low")]
    VeryLow,
}

impl RiskLevel {
    pub fn from_frequency(frequency: f64) -> Self {
        if frequency > 0.3 {
            Self::High
        } else if frequency > 0.15 {
            Self::Medium
        } else if frequency > 0.05 {
            Self::Low
        } else {
            Self::VeryLow
        }
    }

    pub fn is_stable(self) -> bool {
        matches!(self, Self::Low | Self::VeryLow)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BetaSensitivity {
    #[serde(rename = "high sensitivity")]
    High,
    #[serde(rename = "medium sensitivity, moves in sync")]
    Medium,
    #[serde(rename = "low sensitivity")]
    Low,
    #[serde(rename = "independent")]
    Independent,
    #[serde(rename = "inverse relationship")]
    Inverse,
}

impl BetaSensitivity {
    pub fn classify(beta: f64) -> Self {
        if beta > 1.2 {
            Self::High
        } else if beta > 0.8 {
            Self::Medium
        } else if beta > 0.3 {
            Self::Low
        } else if beta > -0.3 {
            Self::Independent
        } else {
            Self::Inverse
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolatilityComparison {
    #[serde(rename = "stock far more volatile")]
    FarMoreVolatile,
    #[serde(rename = "stock moderately more volatile")]
    ModeratelyMoreVolatile,
    #[serde(rename = "comparable")]
    Comparable,
    #[serde(rename = "stock less volatile")]
    LessVolatile,
}

impl VolatilityComparison {
    pub fn classify(ratio: f64) -> Self {
        if ratio > 1.5 {
            Self::FarMoreVolatile
        } else if ratio > 1.1 {
            Self::ModeratelyMoreVolatile
        } else if ratio > 0.9 {
            Self::Comparable
        } else {
            Self::LessVolatile
        }
    }
}

/// Volatility of both normalized series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volatility {
    pub stock: f64,
    pub crypto: f64,
    pub ratio: f64,
}

pub struct MarketAnalyzer;

impl MarketAnalyzer {
    /// Population covariance over population variance of the crypto series.
    /// Zero when the crypto series has no variance.
    pub fn beta(stock: &[f64], crypto: &[f64]) -> f64 {
        if stock.len() != crypto.len() || crypto.is_empty() {
            return 0.0;
        }
        let variance = crypto.iter().population_variance();
        if !has_variance(variance) {
            return 0.0;
        }
        let covariance = stock.iter().population_covariance(crypto.iter());
        let beta = covariance / variance;
        if beta.is_finite() { beta } else { 0.0 }
    }

    /// Population standard deviation, 0 for an empty series.
    pub fn population_std_dev(series: &[f64]) -> f64 {
        if series.is_empty() {
            return 0.0;
        }
        let std_dev = series.iter().population_std_dev();
        if std_dev.is_finite() { std_dev } else { 0.0 }
    }

    pub fn volatility(stock: &[f64], crypto: &[f64]) -> Volatility {
        let stock_vol = Self::population_std_dev(stock);
        let crypto_vol = Self::population_std_dev(crypto);
        let ratio = if has_variance(crypto_vol * crypto_vol) {
            stock_vol / crypto_vol
        } else {
            0.0
        };
        Volatility {
            stock: stock_vol,
            crypto: crypto_vol,
            ratio,
        }
    }

    /// Week-over-week moves where one asset moved sharply and the other
    /// moved the opposite way.
    pub fn decoupling_events(
        stock: &[f64],
        crypto: &[f64],
        dates: &[NaiveDate],
        thresholds: DecouplingThresholds,
    ) -> Vec<DivergenceEvent> {
        let n = stock.len().min(crypto.len()).min(dates.len());
        (1..n)
            .filter_map(|i| {
                let stock_change = stock[i] - stock[i - 1];
                let crypto_change = crypto[i] - crypto[i - 1];
                if !Self::is_decoupled(stock_change, crypto_change, thresholds) {
                    return None;
                }
                let kind = if stock_change.abs() > crypto_change.abs() {
                    DivergenceKind::Stock
                } else {
                    DivergenceKind::Crypto
                };
                Some(DivergenceEvent {
                    date: dates[i],
                    stock_change,
                    crypto_change,
                    kind,
                })
            })
            .collect()
    }

    fn is_decoupled(stock_change: f64, crypto_change: f64, t: DecouplingThresholds) -> bool {
        (stock_change > t.major && crypto_change < -t.minor)
            || (stock_change < -t.major && crypto_change > t.minor)
            || (crypto_change > t.major && stock_change < -t.minor)
            || (crypto_change < -t.major && stock_change > t.minor)
    }

    /// Events per week-over-week delta.
    pub fn decoupling_frequency(events: usize, points: usize) -> f64 {
        if points < 2 {
            return 0.0;
        }
        events as f64 / (points - 1) as f64
    }
}
