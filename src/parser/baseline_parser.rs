// Baseline dataset JSON parsing
use crate::model::{BaselineDataset, DatasetError, WeekEntry, WeekRecord};
use serde::Deserializer;
use serde::de::{MapAccess, Visitor};
use std::fmt;
use tracing::warn;

pub trait Parser {
    fn parse(&self, raw: &[u8]) -> Result<BaselineDataset, DatasetError>;
}

pub struct BaselineParser;

impl BaselineParser {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BaselineParser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for BaselineParser {
    fn parse(&self, raw: &[u8]) -> Result<BaselineDataset, DatasetError> {
        let dataset: BaselineDataset = serde_json::from_slice(raw)?;

        if dataset.weeks.is_empty() {
            return Err(DatasetError::Empty);
        }

        for week in &dataset.weeks {
            for (ticker, company) in &week.record.companies {
                if company.stock_price <= 0.0 || company.coin_price <= 0.0 {
                    warn!("⚠️ Non-positive price for {} in week {}", ticker, week.key);
                }
            }
        }

        Ok(dataset)
    }
}

/// Reads the `data` object into a list, keeping the document's key order.
pub fn deserialize_weeks<'de, D>(deserializer: D) -> Result<Vec<WeekEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_map(OrderedWeeksVisitor)
}

struct OrderedWeeksVisitor;

impl<'de> Visitor<'de> for OrderedWeeksVisitor {
    type Value = Vec<WeekEntry>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map from week key to week record")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut weeks = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, record)) = map.next_entry::<String, WeekRecord>()? {
            weeks.push(WeekEntry { key, record });
        }
        Ok(weeks)
    }
}
