mod mutation;
mod query;

pub mod catalog;
pub mod live_golf;

use chrono::NaiveDate;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::{self, JsonSchema};

fn default_true() -> bool {
    true
}

/// A pick made by the signed-in participant for themselves.
#[derive(Deserialize, JsonSchema, Debug, Clone)]
pub struct PickSubmission {
    pub tournament_id: i32,
    pub golfer_id: i32,
    pub second_golfer_id: Option<i32>,
    #[serde(default)]
    pub use_double_pick: bool,
}

/// A pick entered by an administrator on behalf of any participant, ignoring the lock.
#[derive(Deserialize, JsonSchema, Debug, Clone)]
pub struct AdminPickSubmission {
    pub user_id: i32,
    pub tournament_id: i32,
    pub golfer_id: i32,
    pub second_golfer_id: Option<i32>,
    #[serde(default)]
    pub use_double_pick: bool,
    #[serde(default = "default_true")]
    pub replace_existing: bool,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Eq)]
pub struct PickReceipt {
    pub user_id: i32,
    pub tournament_id: i32,
    pub golfer_ids: Vec<i32>,
    pub double_pick_spent: bool,
}

#[derive(Deserialize, JsonSchema, Debug)]
pub struct DeletePicksInput {
    /// Defaults to the signed-in user.
    pub user_id: Option<i32>,
    pub tournament_id: i32,
}

#[derive(Deserialize, JsonSchema, Debug, Clone)]
pub struct LoginInput {
    pub name: String,
    pub pin: String,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Eq)]
pub struct StandingRow {
    pub user: String,
    pub total: i64,
    pub wins: u32,
    pub top5: u32,
    pub top10: u32,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Eq)]
pub struct UserPicks {
    pub user: String,
    pub pick_count: usize,
    /// `None` while the picks are still hidden from the viewer.
    pub golfers: Option<Vec<String>>,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone)]
pub struct TournamentPicks {
    pub tournament_id: i32,
    pub tournament: String,
    pub revealed: bool,
    pub entries: Vec<UserPicks>,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncCounts {
    pub updated: u32,
    pub skipped: u32,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    pub updated: u32,
    pub skipped: u32,
    /// The event id and year of the attempt that produced the report.
    pub event_id: Option<String>,
    pub year: Option<i32>,
}

#[derive(Deserialize, JsonSchema, Debug)]
pub struct ResolveInput {
    pub tournament_id: i32,
    pub event_id: Option<String>,
    pub year: Option<i32>,
}

#[derive(Deserialize, JsonSchema, Debug)]
pub struct LiveGolfIdInput {
    pub tournament_id: i32,
    pub live_golf_id: String,
}

#[derive(Deserialize, JsonSchema, Debug, Clone)]
pub struct ResultInput {
    pub tournament_id: i32,
    pub golfer_id: i32,
    pub purse: i64,
    pub position: Option<i32>,
}

#[derive(Deserialize, JsonSchema, Debug, Clone)]
pub struct TournamentInput {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub is_major: bool,
    #[serde(default)]
    pub is_signature: bool,
    pub season: i32,
    pub purse: Option<i64>,
}

#[derive(Deserialize, JsonSchema, Debug)]
pub struct ClipboardInput {
    pub tournament_id: i32,
    pub text: String,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: u32,
    pub unknown_golfers: Vec<String>,
    /// One-based line numbers.
    pub unparsed_lines: Vec<usize>,
}

#[derive(Deserialize, JsonSchema, Debug)]
pub struct RosterInput {
    pub text: String,
    #[serde(default)]
    pub deactivate_missing: bool,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterReport {
    pub inserted: u32,
    pub updated: u32,
    pub reactivated: u32,
    pub deactivated: u32,
    pub unparsed_lines: Vec<usize>,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone)]
pub struct GolferInfo {
    pub id: i32,
    pub name: String,
    pub fedex_rank: Option<i32>,
    pub active: bool,
    pub used: bool,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone)]
pub struct TournamentInfo {
    pub id: i32,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_major: bool,
    pub is_signature: bool,
    pub purse: Option<i64>,
    pub live_golf_id: Option<String>,
    pub locked: bool,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone)]
pub struct Me {
    pub id: i32,
    pub name: String,
    pub is_admin: bool,
    pub double_pick_used: bool,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogReport {
    pub inserted: u32,
    pub updated: u32,
    pub skipped: u32,
}
