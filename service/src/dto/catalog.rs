use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;

use super::live_golf::lenient_money;

/// Envelope of every list route of the catalog provider.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PageMeta {
    #[serde(default)]
    pub next_cursor: Option<Value>,
}

impl<T> Page<T> {
    pub fn next_cursor(&self) -> Option<String> {
        match self.meta.as_ref()?.next_cursor.as_ref()? {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogTournament {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub season: Option<i32>,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl CatalogTournament {
    pub fn start(&self) -> Option<NaiveDate> {
        date_prefix(&self.start_date)
    }

    /// Falls back to the start date for one-day listings.
    pub fn end(&self) -> Option<NaiveDate> {
        self.end_date
            .as_deref()
            .and_then(date_prefix)
            .or_else(|| self.start())
    }
}

fn date_prefix(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogPlayer {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogResult {
    #[serde(default)]
    pub player: Option<CatalogPlayer>,
    #[serde(default, deserialize_with = "lenient_money")]
    pub earnings: Option<i64>,
    #[serde(default)]
    pub position_numeric: Option<i32>,
}
