use crate::analyzer::correlation::{
    self, CorrelationStrength, CorrelationTrend, LagCorrelation, LagRelationship, Significance,
};
use crate::analyzer::insight::{InsightInputs, generate_insight};
use crate::analyzer::market_indicators::{
    BetaSensitivity, DecouplingThresholds, DivergenceEvent, MarketAnalyzer, RiskLevel, Volatility,
    VolatilityComparison,
};
use crate::analyzer::report::{
    BetaSummary, CorrelationAnalysis, CorrelationReport, DecouplingAnalysis, DecouplingEvent,
    FailedAnalysis, LagAnalysis, PearsonSummary, RollingSummary, TickerOutcome,
    VolatilityAnalysis,
};
use crate::analyzer::summary::market_summary;
use crate::model::{BaselineDataset, NormalizedSeries};
use crate::normalizer::{TickerAliases, extract_series};
use crate::utils::{finite_or_zero, round2, round4, round_to};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use tracing::{info, warn};

/// Report key of the market summary.
pub const SUMMARY_KEY: &str = "summary";
const RESERVED_SUFFIX: &str = "_ticker";
const RAW_SUFFIX: &str = "_raw";

/// Trait defining the interface for a stock/coin pair analyzer.
pub trait Analyzer {
    /// Analyzes one raw ticker. Failures are returned inline, never raised.
    fn analyze_ticker(&self, dataset: &BaselineDataset, ticker: &str) -> TickerOutcome;
    /// Analyzes every ticker in the dataset and aggregates the market summary.
    fn analyze_all(&self, dataset: &BaselineDataset, aliases: &TickerAliases) -> CorrelationReport;
}

/// Implementation of the pair analyzer.
pub struct PairAnalyzer {
    thresholds: DecouplingThresholds,
}

impl PairAnalyzer {
    pub fn new() -> Self {
        Self {
            thresholds: DecouplingThresholds::default(),
        }
    }

    pub fn with_thresholds(thresholds: DecouplingThresholds) -> Self {
        Self { thresholds }
    }

    /// Builds the rounded report record for an already extracted series.
    pub fn analyze_series(&self, series: &NormalizedSeries) -> CorrelationAnalysis {
        let metrics = PairMetrics::compute(series, self.thresholds);
        build_analysis(series, &metrics)
    }
}

impl Default for PairAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for PairAnalyzer {
    fn analyze_ticker(&self, dataset: &BaselineDataset, ticker: &str) -> TickerOutcome {
        match extract_series(dataset, ticker) {
            Ok(series) => TickerOutcome::Analyzed(Box::new(self.analyze_series(&series))),
            Err(e) => {
                warn!("⚠️ Skipping {}: {} ({} points)", ticker, e, e.points());
                TickerOutcome::Failed(FailedAnalysis {
                    ticker: ticker.to_string(),
                    error: e.to_string(),
                    data_points: e.points(),
                })
            }
        }
    }

    fn analyze_all(&self, dataset: &BaselineDataset, aliases: &TickerAliases) -> CorrelationReport {
        let mut tickers: BTreeMap<String, TickerOutcome> = BTreeMap::new();
        // display ticker -> raw ticker currently holding that entry
        let mut holders: BTreeMap<String, String> = BTreeMap::new();

        for raw_ticker in dataset.tickers() {
            let display_ticker = report_key(aliases.display_name(&raw_ticker));
            info!("🔍 Analyzing {} (raw key {})...", display_ticker, raw_ticker);

            let mut outcome = self.analyze_ticker(dataset, &raw_ticker);
            outcome.set_ticker(&display_ticker);

            let superseded = match tickers.entry(display_ticker.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(outcome);
                    holders.insert(display_ticker.clone(), raw_ticker);
                    None
                }
                Entry::Occupied(mut slot) => {
                    let holder = holders.get(&display_ticker).cloned().unwrap_or_default();
                    warn!(
                        "⚠️ {} and {} share display name {}",
                        raw_ticker, holder, display_ticker
                    );
                    if outcome.data_points() > slot.get().data_points() {
                        let previous = slot.insert(outcome);
                        holders.insert(display_ticker.clone(), raw_ticker.clone());
                        Some((holder, previous, raw_ticker))
                    } else {
                        Some((raw_ticker, outcome, holder))
                    }
                }
            };

            if let Some((loser_raw, loser, winner_raw)) = superseded {
                let key = collision_key(&tickers, &loser_raw, &display_ticker);
                let failed = FailedAnalysis {
                    ticker: key.clone(),
                    error: format!(
                        "alias collision: {} reported from {}",
                        display_ticker, winner_raw
                    ),
                    data_points: loser.data_points(),
                };
                tickers.insert(key, TickerOutcome::Failed(failed));
            }
        }

        let analyzed: Vec<&CorrelationAnalysis> =
            tickers.values().filter_map(TickerOutcome::analysis).collect();
        info!(
            "Analyzed {} of {} tickers",
            analyzed.len(),
            tickers.len()
        );
        let summary = market_summary(&analyzed);

        CorrelationReport { tickers, summary }
    }
}

/// Ticker entries share the report object with `summary`, so a ticker of that
/// name is renamed.
fn report_key(display_ticker: &str) -> String {
    if display_ticker == SUMMARY_KEY {
        let renamed = format!("{}{}", display_ticker, RESERVED_SUFFIX);
        warn!("⚠️ Ticker {} is reserved, reported as {}", display_ticker, renamed);
        renamed
    } else {
        display_ticker.to_string()
    }
}

/// Key for the entry that lost an alias collision: its raw ticker when free.
fn collision_key(
    tickers: &BTreeMap<String, TickerOutcome>,
    loser_raw: &str,
    display_ticker: &str,
) -> String {
    let raw = report_key(loser_raw);
    if raw != display_ticker && !tickers.contains_key(&raw) {
        raw
    } else {
        format!("{}{}", raw, RAW_SUFFIX)
    }
}

/// Unrounded statistics for one normalized series pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PairMetrics {
    pub correlation: f64,
    pub p_value: f64,
    pub rolling: Vec<f64>,
    pub lags: Vec<LagCorrelation>,
    pub best_lag: LagCorrelation,
    pub beta: f64,
    pub volatility: Volatility,
    pub events: Vec<DivergenceEvent>,
    pub decoupling_frequency: f64,
    pub risk_level: RiskLevel,
}

impl PairMetrics {
    pub fn compute(series: &NormalizedSeries, thresholds: DecouplingThresholds) -> Self {
        let stock = &series.stock_pct_change;
        let crypto = &series.crypto_pct_change;

        let correlation = correlation::pearson_or_zero(stock, crypto);
        let p_value = correlation::p_value(correlation, series.len());
        let rolling = correlation::rolling_correlation(stock, crypto);
        let lags = correlation::lag_correlations(stock, crypto, correlation);
        let best_lag = correlation::best_lag(&lags).unwrap_or(LagCorrelation {
            lag_weeks: 0,
            correlation,
        });

        let beta = MarketAnalyzer::beta(stock, crypto);
        let volatility = MarketAnalyzer::volatility(stock, crypto);
        let events = MarketAnalyzer::decoupling_events(stock, crypto, &series.dates, thresholds);
        let decoupling_frequency = MarketAnalyzer::decoupling_frequency(events.len(), series.len());

        Self {
            correlation,
            p_value,
            rolling,
            lags,
            best_lag,
            beta,
            volatility,
            events,
            decoupling_frequency,
            risk_level: RiskLevel::from_frequency(decoupling_frequency),
        }
    }
}

fn build_analysis(series: &NormalizedSeries, m: &PairMetrics) -> CorrelationAnalysis {
    let rolling_average = if m.rolling.is_empty() {
        0.0
    } else {
        m.rolling.iter().mean()
    };

    let round_lag = |lag: &LagCorrelation| LagCorrelation {
        lag_weeks: lag.lag_weeks,
        correlation: round4(finite_or_zero(lag.correlation)),
    };

    CorrelationAnalysis {
        ticker: series.ticker.clone(),
        analysis_period: series.period(),
        data_points: series.len(),
        pearson_correlation: PearsonSummary {
            value: round4(m.correlation),
            p_value: round_to(m.p_value, 6),
            significance: Significance::classify(m.p_value),
            strength: CorrelationStrength::classify(m.correlation),
        },
        rolling_correlation: RollingSummary {
            values: m.rolling.iter().map(|&r| round4(r)).collect(),
            average: round4(rolling_average),
            trend: CorrelationTrend::classify(&m.rolling),
        },
        lag_analysis: LagAnalysis {
            correlations: m.lags.iter().map(round_lag).collect(),
            best_lag: round_lag(&m.best_lag),
            interpretation: LagRelationship::classify(&m.best_lag).to_string(),
        },
        beta_coefficient: BetaSummary {
            value: round4(m.beta),
            interpretation: BetaSensitivity::classify(m.beta),
        },
        volatility_analysis: VolatilityAnalysis {
            stock_volatility: round2(m.volatility.stock),
            crypto_volatility: round2(m.volatility.crypto),
            ratio: round4(m.volatility.ratio),
            interpretation: VolatilityComparison::classify(m.volatility.ratio),
        },
        decoupling_analysis: DecouplingAnalysis {
            total_events: m.events.len(),
            frequency: round4(m.decoupling_frequency),
            events: m
                .events
                .iter()
                .map(|e| DecouplingEvent {
                    date: e.date,
                    stock_change: round2(e.stock_change),
                    crypto_change: round2(e.crypto_change),
                    kind: e.kind,
                })
                .collect(),
            risk_level: m.risk_level,
        },
        investment_insight: generate_insight(&InsightInputs {
            correlation: m.correlation,
            beta: m.beta,
            risk_level: m.risk_level,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::report::SummaryOutcome;
    use crate::model::{CompanyWeek, WeekEntry, WeekRecord};
    use chrono::NaiveDate;

    fn series(stock: &[f64], crypto: &[f64]) -> NormalizedSeries {
        let start = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        NormalizedSeries {
            ticker: "TEST".into(),
            stock_pct_change: stock.to_vec(),
            crypto_pct_change: crypto.to_vec(),
            dates: (0..stock.len())
                .map(|i| start + chrono::Duration::weeks(i as i64))
                .collect(),
        }
    }

    /// Dataset of `weeks` weeks where each ticker lists its (stock, coin)
    /// price for the weeks it is present, `None` where it is absent.
    fn dataset(weeks: usize, tickers: &[(&str, Vec<Option<(f64, f64)>>)]) -> BaselineDataset {
        let start = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let entries = (0..weeks)
            .map(|w| {
                let companies = tickers
                    .iter()
                    .filter_map(|(ticker, prices)| {
                        prices.get(w).copied().flatten().map(|(stock, coin)| {
                            (
                                ticker.to_string(),
                                CompanyWeek {
                                    company_name: ticker.to_string(),
                                    stock_price: stock,
                                    coin: "BTC".into(),
                                    coin_price: coin,
                                    coin_id: "bitcoin".into(),
                                },
                            )
                        })
                    })
                    .collect();
                WeekEntry {
                    key: format!("2025-W{:02}", w + 1),
                    record: WeekRecord {
                        week_start: None,
                        baseline_date: start + chrono::Duration::weeks(w as i64),
                        companies,
                    },
                }
            })
            .collect();
        BaselineDataset::new(entries)
    }

    fn full(prices: &[(f64, f64)]) -> Vec<Option<(f64, f64)>> {
        prices.iter().copied().map(Some).collect()
    }

    #[test]
    fn perfectly_aligned_pair() {
        let analysis =
            PairAnalyzer::new().analyze_series(&series(&[0.0, 5.0, 10.0], &[0.0, 5.0, 10.0]));
        assert_eq!(analysis.pearson_correlation.value, 1.0);
        assert_eq!(analysis.pearson_correlation.strength, CorrelationStrength::Strong);
        assert_eq!(analysis.beta_coefficient.value, 1.0);
        assert_eq!(analysis.volatility_analysis.ratio, 1.0);
        assert_eq!(analysis.decoupling_analysis.total_events, 0);
        assert_eq!(analysis.decoupling_analysis.risk_level, RiskLevel::VeryLow);
        assert_eq!(analysis.rolling_correlation.values.len(), 1);
        assert_eq!(
            analysis.rolling_correlation.trend,
            CorrelationTrend::InsufficientData
        );
    }

    #[test]
    fn perfectly_inverse_pair() {
        let analysis =
            PairAnalyzer::new().analyze_series(&series(&[0.0, 3.0, -3.0], &[0.0, -3.0, 3.0]));
        assert_eq!(analysis.pearson_correlation.value, -1.0);
        assert_eq!(analysis.beta_coefficient.value, -1.0);
        assert_eq!(analysis.beta_coefficient.interpretation, BetaSensitivity::Inverse);
        assert!(analysis.decoupling_analysis.total_events >= 1);
        assert_eq!(analysis.decoupling_analysis.frequency, 1.0);
        assert_eq!(analysis.decoupling_analysis.risk_level, RiskLevel::High);
        assert!(analysis.investment_insight.contains("monitor"));
    }

    #[test]
    fn flat_crypto_produces_no_nan() {
        let analysis = PairAnalyzer::new().analyze_series(&series(
            &[0.0, 4.0, -2.0, 6.0, 1.0],
            &[0.0, 0.0, 0.0, 0.0, 0.0],
        ));
        assert_eq!(analysis.beta_coefficient.value, 0.0);
        assert_eq!(analysis.pearson_correlation.value, 0.0);
        assert_eq!(analysis.volatility_analysis.ratio, 0.0);

        let json = serde_json::to_string(&analysis).unwrap();
        assert!(!json.contains("NaN"));
        assert!(!json.contains("null"));
        assert!(analysis.rolling_correlation.values.iter().all(|v| v.is_finite()));
        assert!(analysis.lag_analysis.correlations.iter().all(|l| l.correlation == 0.0));
    }

    #[test]
    fn lag_zero_entry_equals_pearson() {
        let analysis = PairAnalyzer::new().analyze_series(&series(
            &[0.0, 2.0, 5.0, 3.0, 8.0, 6.0],
            &[0.0, 1.0, 6.0, 2.0, 9.0, 4.0],
        ));
        let lag_zero = analysis
            .lag_analysis
            .correlations
            .iter()
            .find(|l| l.lag_weeks == 0)
            .unwrap();
        assert_eq!(lag_zero.correlation, analysis.pearson_correlation.value);
        assert_eq!(analysis.rolling_correlation.values.len(), 4);
    }

    #[test]
    fn sparse_ticker_is_reported_but_not_summarized() {
        let mut sparse = vec![None; 10];
        sparse[3] = Some((10.0, 1.0));
        sparse[7] = Some((12.0, 1.1));

        let ds = dataset(
            10,
            &[
                (
                    "COIN",
                    full(&[
                        (100.0, 50.0),
                        (110.0, 55.0),
                        (120.0, 58.0),
                        (115.0, 57.0),
                        (130.0, 66.0),
                        (125.0, 60.0),
                        (140.0, 70.0),
                        (150.0, 74.0),
                        (145.0, 73.0),
                        (160.0, 80.0),
                    ]),
                ),
                (
                    "MSTR",
                    full(&[
                        (300.0, 50.0),
                        (290.0, 55.0),
                        (330.0, 58.0),
                        (310.0, 57.0),
                        (300.0, 66.0),
                        (350.0, 60.0),
                        (340.0, 70.0),
                        (320.0, 74.0),
                        (360.0, 73.0),
                        (355.0, 80.0),
                    ]),
                ),
                ("TINY", sparse),
            ],
        );

        let report = PairAnalyzer::new().analyze_all(&ds, &TickerAliases::default());
        assert_eq!(report.tickers.len(), 3);

        match &report.tickers["TINY"] {
            TickerOutcome::Failed(failed) => {
                assert_eq!(failed.error, "insufficient data points");
                assert_eq!(failed.data_points, 2);
            }
            other => panic!("expected failure, got {:?}", other),
        }

        let pearson = |ticker: &str| {
            report.tickers[ticker]
                .analysis()
                .unwrap()
                .pearson_correlation
                .value
        };
        let expected_average = (pearson("COIN") + pearson("MSTR")) / 2.0;
        match &report.summary {
            SummaryOutcome::Ready(summary) => {
                assert!((summary.market_correlation.average - expected_average).abs() < 1e-4);
                assert_ne!(summary.market_stability.most_stable, "TINY");
                assert_ne!(summary.market_stability.most_volatile, "TINY");
            }
            other => panic!("expected summary, got {:?}", other),
        }
    }

    #[test]
    fn every_series_starts_at_zero() {
        let ds = dataset(
            4,
            &[
                (
                    "RIOT",
                    vec![None, Some((12.0, 100.0)), Some((13.0, 110.0)), Some((11.0, 90.0))],
                ),
            ],
        );
        let series = extract_series(&ds, "RIOT").unwrap();
        assert_eq!(series.stock_pct_change[0], 0.0);
        assert_eq!(series.crypto_pct_change[0], 0.0);
        let outcome = PairAnalyzer::new().analyze_ticker(&ds, "RIOT");
        assert_eq!(
            outcome.analysis().unwrap().analysis_period,
            "2025-01-13 to 2025-01-27"
        );
    }

    #[test]
    fn aliases_rename_output_only() {
        let prices = full(&[(10.0, 1.0), (11.0, 1.2), (9.0, 0.9), (12.0, 1.3)]);
        let ds = dataset(4, &[("VAPE", prices.clone())]);
        let aliases: TickerAliases =
            [("VAPE".to_string(), "BNC".to_string())].into_iter().collect();

        let analyzer = PairAnalyzer::new();
        let report = analyzer.analyze_all(&ds, &aliases);
        assert!(report.tickers.contains_key("BNC"));
        assert!(!report.tickers.contains_key("VAPE"));

        let renamed = report.tickers["BNC"].analysis().unwrap();
        assert_eq!(renamed.ticker, "BNC");

        let raw = analyzer.analyze_ticker(&ds, "VAPE");
        let raw = raw.analysis().unwrap();
        assert_eq!(raw.pearson_correlation, renamed.pearson_correlation);
        assert_eq!(raw.beta_coefficient, renamed.beta_coefficient);
    }

    #[test]
    fn alias_collision_keeps_longer_history() {
        let ds = dataset(
            6,
            &[
                ("BNC", vec![None, None, None, None, Some((5.0, 1.0)), Some((6.0, 1.1))]),
                (
                    "VAPE",
                    vec![
                        Some((10.0, 1.0)),
                        Some((11.0, 1.2)),
                        Some((9.0, 0.9)),
                        Some((12.0, 1.3)),
                        None,
                        None,
                    ],
                ),
            ],
        );
        let aliases: TickerAliases =
            [("VAPE".to_string(), "BNC".to_string())].into_iter().collect();
        let report = PairAnalyzer::new().analyze_all(&ds, &aliases);

        assert_eq!(report.tickers.len(), 2);
        assert_eq!(report.tickers["BNC"].data_points(), 4);
        assert!(report.tickers["BNC"].analysis().is_some());

        match &report.tickers["BNC_raw"] {
            TickerOutcome::Failed(failed) => {
                assert_eq!(failed.ticker, "BNC_raw");
                assert_eq!(failed.data_points, 2);
                assert_eq!(failed.error, "alias collision: BNC reported from VAPE");
            }
            other => panic!("expected collision entry, got {:?}", other),
        }
    }

    #[test]
    fn alias_collision_loser_keeps_raw_name() {
        let long = full(&[(10.0, 1.0), (11.0, 1.2), (9.0, 0.9), (12.0, 1.3), (13.0, 1.1)]);
        let short = vec![Some((5.0, 1.0)), Some((6.0, 1.1)), Some((7.0, 1.3)), None, None];
        let ds = dataset(5, &[("BNC", long), ("VAPE", short)]);
        let aliases: TickerAliases =
            [("VAPE".to_string(), "BNC".to_string())].into_iter().collect();

        let report = PairAnalyzer::new().analyze_all(&ds, &aliases);
        assert_eq!(report.tickers["BNC"].data_points(), 5);
        assert_eq!(report.tickers["VAPE"].data_points(), 3);
        assert!(report.tickers["VAPE"].analysis().is_none());
        assert_eq!(report.analyzed().count(), 1);
    }

    #[test]
    fn ticker_named_summary_does_not_shadow_the_summary() {
        let prices = full(&[(10.0, 1.0), (11.0, 1.2), (9.0, 0.9), (12.0, 1.3)]);
        let ds = dataset(4, &[(SUMMARY_KEY, prices.clone()), ("COIN", prices)]);
        let report = PairAnalyzer::new().analyze_all(&ds, &TickerAliases::default());

        assert!(report.tickers.contains_key("summary_ticker"));
        assert!(!report.tickers.contains_key(SUMMARY_KEY));

        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(json.matches("\"summary\":").count(), 1);
        let parsed: CorrelationReport = serde_json::from_str(&json).unwrap();
        assert!(matches!(parsed.summary, SummaryOutcome::Ready(_)));
        assert_eq!(parsed.tickers.len(), 2);
    }

    #[test]
    fn overflowing_series_is_rejected() {
        let ds = dataset(
            4,
            &[
                ("TINY", full(&[(1e-300, 1.0), (5.0, 1.1), (9.0, 1.2), (7.0, 1.0)])),
                ("COIN", full(&[(100.0, 50.0), (110.0, 55.0), (120.0, 58.0), (115.0, 57.0)])),
            ],
        );
        let report = PairAnalyzer::new().analyze_all(&ds, &TickerAliases::default());

        match &report.tickers["TINY"] {
            TickerOutcome::Failed(failed) => assert_eq!(failed.error, "invalid base price"),
            other => panic!("expected failure, got {:?}", other),
        }
        let SummaryOutcome::Ready(summary) = &report.summary else {
            panic!("expected summary");
        };
        assert_eq!(summary.market_stability.most_stable, "COIN");
    }

    #[test]
    fn no_valid_tickers_yields_summary_error() {
        let ds = dataset(2, &[("MSTR", full(&[(1.0, 1.0), (2.0, 2.0)]))]);
        let report = PairAnalyzer::new().analyze_all(&ds, &TickerAliases::default());
        assert_eq!(
            report.summary,
            SummaryOutcome::Unavailable {
                error: "no valid analysis results".into()
            }
        );
        assert_eq!(report.failed().count(), 1);
    }

    #[test]
    fn custom_thresholds_flag_smaller_moves() {
        let s = series(&[0.0, 1.5, 0.0, 1.5], &[0.0, -1.5, 0.0, -1.5]);
        let strict = PairAnalyzer::new().analyze_series(&s);
        let loose = PairAnalyzer::with_thresholds(DecouplingThresholds {
            major: 1.0,
            minor: 0.5,
        })
        .analyze_series(&s);
        assert_eq!(strict.decoupling_analysis.total_events, 0);
        assert_eq!(loose.decoupling_analysis.total_events, 3);
        assert_eq!(loose.decoupling_analysis.risk_level, RiskLevel::High);
    }

    #[test]
    fn same_dataset_same_report() {
        let ds = dataset(
            5,
            &[
                (
                    "COIN",
                    full(&[
                        (100.0, 50.0),
                        (104.0, 48.0),
                        (99.0, 55.0),
                        (120.0, 52.0),
                        (118.0, 60.0),
                    ]),
                ),
                (
                    "TSLA",
                    full(&[
                        (200.0, 50.0),
                        (210.0, 48.0),
                        (190.0, 55.0),
                        (205.0, 52.0),
                        (230.0, 60.0),
                    ]),
                ),
            ],
        );
        let analyzer = PairAnalyzer::new();
        let aliases = TickerAliases::default();
        let first = serde_json::to_string(&analyzer.analyze_all(&ds, &aliases)).unwrap();
        let second = serde_json::to_string(&analyzer.analyze_all(&ds, &aliases)).unwrap();
        assert_eq!(first, second);
    }
}
