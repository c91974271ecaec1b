use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::statistics::Statistics;
use std::fmt;

/// Window size of the rolling correlation.
pub const ROLLING_WINDOW: usize = 3;
/// Lags examined by the lag analysis, in report order.
pub const LAGS: [i32; 5] = [-2, -1, 0, 1, 2];
/// Population variances at or below this are treated as zero.
pub const VARIANCE_FLOOR: f64 = 1e-12;

const SIGNIFICANCE_LEVEL: f64 = 0.05;
const TREND_THRESHOLD: f64 = 0.1;
const LAG_RELEVANCE: f64 = 0.3;

/// Whether a population variance is large enough to divide by.
pub fn has_variance(population_variance: f64) -> bool {
    population_variance.is_finite() && population_variance > VARIANCE_FLOOR
}

/// Pearson correlation coefficient between two slices.
/// Returns None if slices have different lengths, fewer than two points, or
/// either side has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let n = x.len() as f64;
    let mean_x = x.iter().mean();
    let mean_y = y.iter().mean();
    let numerator: f64 = x
        .iter()
        .zip(y.iter())
        .map(|(xi, yi)| (xi - mean_x) * (yi - mean_y))
        .sum();
    let denominator_x: f64 = x.iter().map(|xi| (xi - mean_x).powi(2)).sum();
    let denominator_y: f64 = y.iter().map(|yi| (yi - mean_y).powi(2)).sum();
    if !(has_variance(denominator_x / n) && has_variance(denominator_y / n)) {
        return None;
    }
    let r = numerator / (denominator_x * denominator_y).sqrt();
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Pearson correlation with undefined results mapped to 0.
pub fn pearson_or_zero(x: &[f64], y: &[f64]) -> f64 {
    pearson(x, y).unwrap_or(0.0)
}

/// Two-sided p-value of `r` under the null hypothesis of no correlation,
/// using Student's t with `n - 2` degrees of freedom.
pub fn p_value(r: f64, n: usize) -> f64 {
    if n < 3 || !r.is_finite() {
        return 1.0;
    }
    let r = r.clamp(-1.0, 1.0);
    let residual = 1.0 - r * r;
    if residual <= 0.0 {
        return 0.0;
    }
    let df = (n - 2) as f64;
    let t = r * (df / residual).sqrt();
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => (2.0 * (1.0 - dist.cdf(t.abs()))).clamp(0.0, 1.0),
        Err(_) => 1.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrelationStrength {
    #[serde(rename = "strong")]
    Strong,
    #[serde(rename = "moderate")]
    Moderate,
    #[serde(rename = "weak")]
    Weak,
    #[serde(rename = "negligible")]
    Negligible,
}

impl CorrelationStrength {
    pub fn classify(r: f64) -> Self {
        let abs = r.abs();
        if abs >= 0.7 {
            Self::Strong
        } else if abs >= 0.5 {
            Self::Moderate
        } else if abs >= 0.3 {
            Self::Weak
        } else {
            Self::Negligible
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Significance {
    #[serde(rename = "significant")]
    Significant,
    #[serde(rename = "not significant")]
    NotSignificant,
}

impl Significance {
    pub fn classify(p_value: f64) -> Self {
        if p_value < SIGNIFICANCE_LEVEL {
            Self::Significant
        } else {
            Self::NotSignificant
        }
    }
}

/// Correlation over each window of `ROLLING_WINDOW` consecutive points.
/// Yields `len - 2` values; zero-variance windows give 0.
pub fn rolling_correlation(stock: &[f64], crypto: &[f64]) -> Vec<f64> {
    stock
        .windows(ROLLING_WINDOW)
        .zip(crypto.windows(ROLLING_WINDOW))
        .map(|(s, c)| pearson_or_zero(s, c))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrelationTrend {
    #[serde(rename = "strengthening")]
    Strengthening,
    #[serde(rename = "weakening")]
    Weakening,
    #[serde(rename = "stable")]
    Stable,
    #[serde(rename = "insufficient data")]
    InsufficientData,
}

impl CorrelationTrend {
    /// Compares the mean of the last two rolling values with the first two.
    pub fn classify(rolling: &[f64]) -> Self {
        if rolling.len() < 2 {
            return Self::InsufficientData;
        }
        let early = (rolling[0] + rolling[1]) / 2.0;
        let recent = (rolling[rolling.len() - 2] + rolling[rolling.len() - 1]) / 2.0;
        let delta = recent - early;
        if delta > TREND_THRESHOLD {
            Self::Strengthening
        } else if delta < -TREND_THRESHOLD {
            Self::Weakening
        } else {
            Self::Stable
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LagCorrelation {
    pub lag_weeks: i32,
    pub correlation: f64,
}

/// Correlation at `lag` weeks. Positive lags pair each stock value with the
/// crypto value `lag` weeks earlier (stock lags crypto); negative lags pair
/// each crypto value with the stock value `|lag|` weeks earlier.
/// Lag 0 reuses the full-series coefficient.
pub fn lag_correlation(stock: &[f64], crypto: &[f64], lag: i32, full: f64) -> f64 {
    let n = stock.len().min(crypto.len());
    let shift = lag.unsigned_abs() as usize;
    if lag == 0 {
        return full;
    }
    if shift >= n || n - shift < 2 {
        return 0.0;
    }
    let (s, c) = if lag > 0 {
        (&stock[shift..n], &crypto[..n - shift])
    } else {
        (&stock[..n - shift], &crypto[shift..n])
    };
    pearson_or_zero(s, c)
}

/// Correlations for every lag in `LAGS`.
pub fn lag_correlations(stock: &[f64], crypto: &[f64], full: f64) -> Vec<LagCorrelation> {
    LAGS.iter()
        .map(|&lag_weeks| LagCorrelation {
            lag_weeks,
            correlation: lag_correlation(stock, crypto, lag_weeks, full),
        })
        .collect()
}

/// Entry with the largest absolute correlation; the earliest lag wins ties.
pub fn best_lag(lags: &[LagCorrelation]) -> Option<LagCorrelation> {
    lags.iter().copied().fold(None, |best, candidate| match best {
        Some(current) if candidate.correlation.abs() <= current.correlation.abs() => Some(current),
        _ => Some(candidate),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LagRelationship {
    NoRelationship,
    Synchronous,
    StockLagsCrypto(u32),
    CryptoLagsStock(u32),
}

impl LagRelationship {
    pub fn classify(best: &LagCorrelation) -> Self {
        if best.correlation.abs() < LAG_RELEVANCE {
            Self::NoRelationship
        } else if best.lag_weeks == 0 {
            Self::Synchronous
        } else if best.lag_weeks > 0 {
            Self::StockLagsCrypto(best.lag_weeks.unsigned_abs())
        } else {
            Self::CryptoLagsStock(best.lag_weeks.unsigned_abs())
        }
    }
}

impl fmt::Display for LagRelationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRelationship => write!(f, "no clear lag relationship"),
            Self::Synchronous => write!(f, "synchronous response"),
            Self::StockLagsCrypto(weeks) => write!(f, "stock lags crypto by {} weeks", weeks),
            Self::CryptoLagsStock(weeks) => write!(f, "crypto lags stock by {} weeks", weeks),
        }
    }
}
