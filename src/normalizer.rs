use crate::model::{BaselineDataset, NormalizedSeries, SeriesError};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Minimum number of weeks a ticker needs before it can be analyzed.
pub const MIN_DATA_POINTS: usize = 3;

/// Builds the percentage-change series of `ticker` relative to the first week
/// in which it appears. A base price so small that the series (or its
/// variance) overflows is rejected like a non-positive one.
pub fn extract_series(
    dataset: &BaselineDataset,
    ticker: &str,
) -> Result<NormalizedSeries, SeriesError> {
    let observations: Vec<_> = dataset.observations(ticker).collect();
    let points = observations.len();

    if points < MIN_DATA_POINTS {
        return Err(SeriesError::InsufficientData { points });
    }

    let (_, base) = observations[0];
    for price in [base.stock_price, base.coin_price] {
        if !(price.is_finite() && price > 0.0) {
            return Err(SeriesError::InvalidBasePrice { price, points });
        }
    }

    let mut series = NormalizedSeries {
        ticker: ticker.to_string(),
        stock_pct_change: Vec::with_capacity(points),
        crypto_pct_change: Vec::with_capacity(points),
        dates: Vec::with_capacity(points),
    };

    for (index, (date, company)) in observations.into_iter().enumerate() {
        if index == 0 {
            series.stock_pct_change.push(0.0);
            series.crypto_pct_change.push(0.0);
        } else {
            series
                .stock_pct_change
                .push(pct_change(company.stock_price, base.stock_price));
            series
                .crypto_pct_change
                .push(pct_change(company.coin_price, base.coin_price));
        }
        series.dates.push(date);
    }

    for (values, price) in [
        (&series.stock_pct_change, base.stock_price),
        (&series.crypto_pct_change, base.coin_price),
    ] {
        if !is_representable(values) {
            return Err(SeriesError::InvalidBasePrice { price, points });
        }
    }

    Ok(series)
}

fn pct_change(price: f64, base: f64) -> f64 {
    (price - base) / base * 100.0
}

fn is_representable(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite()) && values.iter().population_variance().is_finite()
}

/// Raw ticker → display ticker table (e.g. a company that changed symbol).
/// Applied only when results are keyed for output.
#[derive(Debug, Clone, Default)]
pub struct TickerAliases {
    aliases: BTreeMap<String, String>,
}

impl TickerAliases {
    pub fn new(aliases: BTreeMap<String, String>) -> Self {
        Self { aliases }
    }

    pub fn display_name<'a>(&'a self, ticker: &'a str) -> &'a str {
        self.aliases
            .get(ticker)
            .map(String::as_str)
            .unwrap_or(ticker)
    }
}

impl FromIterator<(String, String)> for TickerAliases {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
