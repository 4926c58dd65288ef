use chrono::NaiveDate;
use log::debug;
use serde::Deserialize;
use serde_json::Value;

const SCHEDULE_LIST_KEYS: [&str; 3] = ["schedule", "tournaments", "data"];
const SCHEDULE_NAME_KEYS: [&str; 4] = ["tournament", "name", "tournName", "eventName"];
const SCHEDULE_ID_KEYS: [&str; 3] = ["tournId", "tournamentId", "id"];
const SCHEDULE_START_KEYS: [&str; 4] = ["startDate", "start_date", "start", "startDateUtc"];
const LEADERBOARD_LIST_KEYS: [&str; 2] = ["leaderboardRows", "leaderboard"];
const EARNINGS_LIST_KEYS: [&str; 2] = ["leaderboard", "earnings"];

/// One event of the live provider's season schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleEntry {
    pub id: Option<String>,
    pub name: Option<String>,
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "tied_position")]
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EarningsRow {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_money")]
    pub earnings: Option<i64>,
}

fn full_name(first: &Option<String>, last: &Option<String>) -> String {
    format!(
        "{} {}",
        first.as_deref().unwrap_or_default(),
        last.as_deref().unwrap_or_default()
    )
    .trim()
    .to_string()
}

impl LeaderboardRow {
    pub fn player_name(&self) -> String {
        full_name(&self.first_name, &self.last_name)
    }
}

impl EarningsRow {
    pub fn player_name(&self) -> String {
        full_name(&self.first_name, &self.last_name)
    }
}

/// Returns the first candidate key holding a present, non-empty value.
fn first_key<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| item.get(*k))
        .find(|v| match v {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        })
}

fn first_list<'a>(payload: &'a Value, keys: &[&str]) -> &'a [Value] {
    if let Value::Array(items) = payload {
        return items;
    }
    keys.iter()
        .filter_map(|k| payload.get(*k))
        .find_map(|v| v.as_array().filter(|a| !a.is_empty()))
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Strings and numbers become strings, `{"$numberInt": "7"}` is unwrapped.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => map
            .get("$numberInt")
            .or_else(|| map.get("$numberLong"))
            .and_then(scalar_text),
        _ => None,
    }
}

fn schedule_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => s.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
        Value::Object(map) => {
            let inner = map.get("$date")?;
            match inner {
                Value::String(_) => schedule_date(inner),
                _ => {
                    let millis: i64 = scalar_text(inner)?.parse().ok()?;
                    chrono::DateTime::from_timestamp_millis(millis).map(|d| d.date_naive())
                }
            }
        }
        _ => None,
    }
}

pub fn parse_schedule(payload: &Value) -> Vec<ScheduleEntry> {
    first_list(payload, &SCHEDULE_LIST_KEYS)
        .iter()
        .map(|item| ScheduleEntry {
            id: first_key(item, &SCHEDULE_ID_KEYS).and_then(scalar_text),
            name: first_key(item, &SCHEDULE_NAME_KEYS)
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string()),
            start_date: first_key(item, &SCHEDULE_START_KEYS).and_then(schedule_date),
        })
        .collect()
}

fn parse_rows<T: serde::de::DeserializeOwned>(payload: &Value, keys: &[&str]) -> Vec<T> {
    first_list(payload, keys)
        .iter()
        .filter_map(|row| match serde_json::from_value(row.clone()) {
            Ok(row) => Some(row),
            Err(e) => {
                debug!("Skipping unreadable upstream row {}: {}", row, e);
                None
            }
        })
        .collect()
}

pub fn parse_leaderboard(payload: &Value) -> Vec<LeaderboardRow> {
    parse_rows(payload, &LEADERBOARD_LIST_KEYS)
}

pub fn parse_earnings(payload: &Value) -> Vec<EarningsRow> {
    parse_rows(payload, &EARNINGS_LIST_KEYS)
}

/// `"T3"` and `"3"` and `3` are all third place; `"CUT"` or `"WD"` is unplaced.
pub fn parse_position(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    let digits = raw
        .strip_prefix('T')
        .or_else(|| raw.strip_prefix('t'))
        .unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// `$1,234,567.50` rounds to 1234568.
pub fn parse_money(raw: &str) -> Option<i64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    let value: f64 = cleaned.parse().ok()?;
    value.is_finite().then(|| value.round() as i64)
}

mod serde_things {
    use serde::de::{MapAccess, Visitor};
    use serde::{de, Deserializer};
    use std::fmt;

    pub(crate) fn tied_position<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TiedPositionVisitor;

        impl<'de> Visitor<'de> for TiedPositionVisitor {
            type Value = Option<i32>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a position number or a string like \"T3\"")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(value.try_into().ok())
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(value.try_into().ok())
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(super::parse_position(value))
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(None)
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut position = None;
                while let Some((_, value)) = map.next_entry::<String, String>()? {
                    position = position.or(super::parse_position(&value));
                }
                Ok(position)
            }
        }

        deserializer.deserialize_any(TiedPositionVisitor)
    }

    pub(crate) fn lenient_money<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MoneyVisitor;

        impl<'de> Visitor<'de> for MoneyVisitor {
            type Value = Option<i64>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an amount of money as a number or a string")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Some(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(value.try_into().ok())
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(value.is_finite().then(|| value.round() as i64))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(super::parse_money(value))
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(None)
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut amount = None;
                while let Some((_, value)) = map.next_entry::<String, String>()? {
                    amount = amount.or(super::parse_money(&value));
                }
                Ok(amount)
            }
        }

        deserializer.deserialize_any(MoneyVisitor)
    }
}

pub(crate) use serde_things::lenient_money;
use serde_things::tied_position;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tie_marker_is_stripped() {
        assert_eq!(parse_position("T3"), Some(3));
        assert_eq!(parse_position("3"), Some(3));
        assert_eq!(parse_position("CUT"), None);
        assert_eq!(parse_position("T"), None);
        assert_eq!(parse_position("WD"), None);
    }

    #[test]
    fn leaderboard_positions_in_every_shape() {
        let payload = json!({
            "leaderboardRows": [
                {"firstName": "Jake", "lastName": "Knapp", "position": "3"},
                {"firstName": "Si Woo", "lastName": "Kim", "position": "T12"},
                {"firstName": "Rory", "lastName": "McIlroy", "position": 1},
                {"firstName": "Max", "lastName": "Homa", "position": "CUT"},
                {"firstName": "Adam", "lastName": "Scott", "position": {"$numberInt": "4"}},
                {"firstName": "Tony", "lastName": "Finau", "position": null},
            ]
        });
        let rows = parse_leaderboard(&payload);
        let positions: Vec<_> = rows.iter().map(|r| (r.player_name(), r.position)).collect();
        assert_eq!(
            positions,
            vec![
                ("Jake Knapp".to_string(), Some(3)),
                ("Si Woo Kim".to_string(), Some(12)),
                ("Rory McIlroy".to_string(), Some(1)),
                ("Max Homa".to_string(), None),
                ("Adam Scott".to_string(), Some(4)),
                ("Tony Finau".to_string(), None),
            ]
        );
    }

    #[test]
    fn earnings_accept_numbers_and_strings() {
        let payload = json!({
            "leaderboard": [
                {"firstName": "Jake", "lastName": "Knapp", "earnings": 400987},
                {"firstName": "Nick", "lastName": "Dunlap", "earnings": 1234.6},
                {"firstName": "Sam", "lastName": "Burns", "earnings": "$1,500,000"},
                {"firstName": "Ben", "lastName": "Griffin"},
            ]
        });
        let rows = parse_earnings(&payload);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].earnings, Some(400987));
        assert_eq!(rows[1].earnings, Some(1235));
        assert_eq!(rows[2].earnings, Some(1_500_000));
        assert_eq!(rows[3].earnings, None);
    }

    #[test]
    fn schedule_reads_every_key_spelling() {
        let payload = json!({
            "tournaments": [
                {"tournName": "The Genesis Invitational", "tournamentId": "007", "startDateUtc": "2026-02-19T12:00:00Z"},
                {"eventName": "RBC Heritage", "id": 12, "start": "2026-04-16"},
                {"name": "", "tournament": "Masters Tournament", "tournId": "014",
                 "startDate": {"$date": {"$numberLong": "1775692800000"}}},
                {"tournId": "099"},
            ]
        });
        let entries = parse_schedule(&payload);
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].name.as_deref(), Some("The Genesis Invitational"));
        assert_eq!(entries[0].id.as_deref(), Some("007"));
        assert_eq!(entries[0].start_date, NaiveDate::from_ymd_opt(2026, 2, 19));
        assert_eq!(entries[1].id.as_deref(), Some("12"));
        assert_eq!(entries[1].start_date, NaiveDate::from_ymd_opt(2026, 4, 16));
        assert_eq!(entries[2].name.as_deref(), Some("Masters Tournament"));
        assert_eq!(entries[2].start_date, NaiveDate::from_ymd_opt(2026, 4, 9));
        assert_eq!(entries[3].name, None);
    }

    #[test]
    fn schedule_list_falls_through_empty_keys() {
        let payload = json!({"schedule": [], "data": [{"name": "Sony Open in Hawaii", "id": "006"}]});
        let entries = parse_schedule(&payload);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id.as_deref(), Some("006"));
    }
}
