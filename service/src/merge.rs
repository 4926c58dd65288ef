//! Joins the leaderboard and earnings feeds into one result row per tournament and golfer.

use std::collections::{BTreeMap, HashMap, HashSet};

use entity::prelude::*;
use entity::{golfer, tournament_result};
use log::{info, warn};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::TransactionTrait;

use crate::dto::live_golf::{EarningsRow, LeaderboardRow};
use crate::dto::{MergeReport, SyncCounts};
use crate::error::{db_error, GatewayError, GenericError};
use crate::gateway::LiveGolfFeed;
use crate::normalize::normalize_person;
use crate::resolver::{resolve_live_golf_id, set_live_golf_id};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedResult {
    pub golfer_id: i32,
    pub purse: i64,
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergePlan {
    pub rows: Vec<PlannedResult>,
    pub skipped: u32,
    /// Earnings were empty, so only positions are written and recorded purses are kept.
    pub positions_only: bool,
}

/// Works out which rows to write. `golfers` maps normalized names of active golfers to ids.
pub fn plan_merge(
    leaderboard: &[LeaderboardRow],
    earnings: &[EarningsRow],
    golfers: &HashMap<String, i32>,
) -> MergePlan {
    let positions: BTreeMap<String, Option<i32>> = leaderboard
        .iter()
        .map(|row| (normalize_person(&row.player_name()), row.position))
        .filter(|(name, _)| !name.is_empty())
        .collect();
    let money: BTreeMap<String, i64> = earnings
        .iter()
        .filter_map(|row| Some((normalize_person(&row.player_name()), row.earnings?)))
        .filter(|(name, _)| !name.is_empty())
        .collect();

    let mut plan = MergePlan::default();
    if !money.is_empty() {
        for (name, purse) in money {
            match golfers.get(&name) {
                Some(&golfer_id) => plan.rows.push(PlannedResult {
                    golfer_id,
                    purse,
                    position: positions.get(&name).copied().flatten(),
                }),
                None => {
                    warn!("No active golfer named {}, skipping", name);
                    plan.skipped += 1;
                }
            }
        }
    } else if !positions.is_empty() {
        plan.positions_only = true;
        for (name, position) in positions {
            match golfers.get(&name) {
                Some(&golfer_id) => plan.rows.push(PlannedResult {
                    golfer_id,
                    purse: 0,
                    position,
                }),
                None => {
                    warn!("No active golfer named {}, skipping", name);
                    plan.skipped += 1;
                }
            }
        }
    }
    plan
}

pub async fn active_golfer_lookup(
    db: &impl ConnectionTrait,
) -> Result<HashMap<String, i32>, GenericError> {
    let golfers = Golfer::find()
        .filter(golfer::Column::Active.eq(true))
        .all(db)
        .await
        .map_err(db_error("Unable to load golfers"))?;
    Ok(golfers
        .into_iter()
        .map(|g| (normalize_person(&g.name), g.id))
        .collect())
}

/// Writes the plan in one transaction. A rerun with the same plan leaves the same rows.
pub async fn apply_plan<C>(
    db: &C,
    tournament_id: i32,
    plan: &MergePlan,
) -> Result<SyncCounts, GenericError>
where
    C: ConnectionTrait + TransactionTrait,
{
    let update_columns = if plan.positions_only {
        vec![tournament_result::Column::Position]
    } else {
        vec![
            tournament_result::Column::Purse,
            tournament_result::Column::Position,
        ]
    };

    let txn = db
        .begin()
        .await
        .map_err(db_error("Unable to begin txn"))?;
    for row in &plan.rows {
        TournamentResult::insert(tournament_result::ActiveModel {
            id: NotSet,
            tournament_id: Set(tournament_id),
            golfer_id: Set(row.golfer_id),
            purse: Set(row.purse),
            position: Set(row.position),
        })
        .on_conflict(
            OnConflict::columns([
                tournament_result::Column::TournamentId,
                tournament_result::Column::GolferId,
            ])
            .update_columns(update_columns.clone())
            .to_owned(),
        )
        .exec_without_returning(&txn)
        .await
        .map_err(db_error("Unable to store result"))?;
    }
    txn.commit()
        .await
        .map_err(db_error("Unable to commit txn"))?;

    Ok(SyncCounts {
        updated: plan.rows.len() as u32,
        skipped: plan.skipped,
    })
}

/// Fetches both feeds for one event and year and merges them into `tournament_id`.
pub async fn merge_results<C>(
    db: &C,
    feed: &dyn LiveGolfFeed,
    event_id: &str,
    year: i32,
    tournament_id: i32,
) -> Result<SyncCounts, GenericError>
where
    C: ConnectionTrait + TransactionTrait,
{
    let leaderboard = feed.leaderboard(event_id, year).await?;
    let earnings = match feed.earnings(event_id, year).await {
        Ok(rows) => rows,
        Err(e @ GatewayError::Status { .. }) => {
            warn!("Earnings for {} ({}) unavailable: {}", event_id, year, e);
            Vec::new()
        }
        Err(e) => return Err(e.into()),
    };

    let golfers = active_golfer_lookup(db).await?;
    let plan = plan_merge(&leaderboard, &earnings, &golfers);
    let counts = apply_plan(db, tournament_id, &plan).await?;
    info!(
        "Merged event {} ({}) into tournament {}: {} updated, {} skipped",
        event_id, year, tournament_id, counts.updated, counts.skipped
    );
    Ok(counts)
}

/// Tries the given id for `year` and `year - 1`, then a freshly resolved id for its year and
/// the one before. Stops at the first attempt that updates anything. Fails only when every
/// attempt failed outright; an event without published results is a zero, not an error.
pub async fn merge_with_autoresolve<C>(
    db: &C,
    feed: &dyn LiveGolfFeed,
    event_id: Option<&str>,
    year: i32,
    tournament_id: i32,
) -> Result<MergeReport, GenericError>
where
    C: ConnectionTrait + TransactionTrait,
{
    let mut attempts: Vec<(String, i32)> = Vec::new();
    if let Some(id) = event_id.map(str::trim).filter(|id| !id.is_empty()) {
        attempts.push((id.to_string(), year));
        attempts.push((id.to_string(), year - 1));
    }

    let mut tried = HashSet::new();
    let mut failures = 0;
    let mut last_error = None;
    let mut last_counts = SyncCounts::default();
    let mut resolved = false;
    let mut index = 0;

    loop {
        if index == attempts.len() {
            if resolved {
                break;
            }
            resolved = true;
            if let Some(resolution) = resolve_live_golf_id(db, feed, tournament_id, year).await? {
                attempts.push((resolution.event_id.clone(), resolution.year));
                attempts.push((resolution.event_id, resolution.year - 1));
            }
            continue;
        }
        let (id, attempt_year) = attempts[index].clone();
        index += 1;
        if !tried.insert((id.clone(), attempt_year)) {
            continue;
        }

        match merge_results(db, feed, &id, attempt_year, tournament_id).await {
            Ok(counts) if counts.updated > 0 => {
                set_live_golf_id(db, tournament_id, &id).await?;
                return Ok(MergeReport {
                    updated: counts.updated,
                    skipped: counts.skipped,
                    event_id: Some(id),
                    year: Some(attempt_year),
                });
            }
            Ok(counts) => last_counts = counts,
            Err(e @ GenericError::Configuration(_)) => return Err(e),
            Err(e) => {
                warn!("Merge attempt {} ({}) failed: {:?}", id, attempt_year, e);
                failures += 1;
                last_error = Some(e);
            }
        }
    }

    match last_error {
        Some(e) if failures == tried.len() => Err(e),
        _ => Ok(MergeReport {
            updated: 0,
            skipped: last_counts.skipped,
            event_id: None,
            year: None,
        }),
    }
}
