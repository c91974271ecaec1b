// Core structs: BaselineDataset, WeekRecord, CompanyWeek, NormalizedSeries
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use thiserror::Error;

/// Weekly snapshots supplied by the ingestion scripts, in chronological order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BaselineDataset {
    #[serde(default)]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub baseline_time: Option<String>,
    /// Week entries in the order they appear in the source document.
    #[serde(rename = "data", deserialize_with = "crate::parser::deserialize_weeks")]
    pub weeks: Vec<WeekEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekEntry {
    pub key: String,
    pub record: WeekRecord,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeekRecord {
    #[serde(default)]
    pub week_start: Option<String>,
    pub baseline_date: NaiveDate,
    #[serde(default)]
    pub companies: BTreeMap<String, CompanyWeek>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CompanyWeek {
    #[serde(default)]
    pub company_name: String,
    pub stock_price: f64,
    #[serde(default)]
    pub coin: String,
    pub coin_price: f64,
    #[serde(default)]
    pub coin_id: String,
}

impl BaselineDataset {
    pub fn new(weeks: Vec<WeekEntry>) -> Self {
        Self {
            weeks,
            ..Self::default()
        }
    }

    /// Every ticker seen in any week, sorted.
    pub fn tickers(&self) -> BTreeSet<String> {
        self.weeks
            .iter()
            .flat_map(|week| week.record.companies.keys().cloned())
            .collect()
    }

    /// Iterates the weeks in which `ticker` has a record.
    pub fn observations<'a>(
        &'a self,
        ticker: &'a str,
    ) -> impl Iterator<Item = (NaiveDate, &'a CompanyWeek)> + 'a {
        self.weeks.iter().filter_map(move |week| {
            week.record
                .companies
                .get(ticker)
                .map(|company| (week.record.baseline_date, company))
        })
    }
}

/// Percentage change of both prices relative to the ticker's own first week.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSeries {
    pub ticker: String,
    pub stock_pct_change: Vec<f64>,
    pub crypto_pct_change: Vec<f64>,
    pub dates: Vec<NaiveDate>,
}

impl NormalizedSeries {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn period(&self) -> String {
        match (self.dates.first(), self.dates.last()) {
            (Some(first), Some(last)) => format!("{} to {}", first, last),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("no baseline dataset found (tried: {0})")]
    NotFound(String),
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse baseline dataset: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("baseline dataset contains no weeks")]
    Empty,
}

/// Per-ticker failures. These never abort the batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("insufficient data points")]
    InsufficientData { points: usize },
    #[error("invalid base price")]
    InvalidBasePrice { price: f64, points: usize },
}

impl SeriesError {
    pub fn points(&self) -> usize {
        match self {
            SeriesError::InsufficientData { points }
            | SeriesError::InvalidBasePrice { points, .. } => *points,
        }
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write report {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
