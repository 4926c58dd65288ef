use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use entity::prelude::*;
use entity::tournament;
use log::{debug, info, warn};
use rocket::serde::Serialize;
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::ActiveValue::Set;
use sea_orm::{IntoActiveModel, TransactionTrait};

use crate::dto::live_golf::ScheduleEntry;
use crate::dto::SyncCounts;
use crate::error::{db_error, GenericError};
use crate::gateway::LiveGolfFeed;
use crate::normalize::normalize_tournament;

pub const ACCEPT_THRESHOLD: f64 = 0.6;
pub const SAME_START_BONUS: f64 = 0.25;

/// Upstream identifier found for an internal tournament.
#[derive(Serialize, JsonSchema, Debug, Clone, PartialEq)]
pub struct Resolution {
    pub event_id: String,
    pub year: i32,
    pub score: f64,
}

/// Edit-distance ratio of two comparison keys, gated on them sharing a word.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let left: HashSet<&str> = a.split_whitespace().collect();
    if !b.split_whitespace().any(|t| left.contains(t)) {
        return 0.0;
    }
    strsim::normalized_levenshtein(a, b)
}

/// Highest scoring schedule entry for one year, if it clears the threshold and has an id.
pub fn best_schedule_match<'a>(
    target_name: &str,
    target_start: Option<NaiveDate>,
    entries: &'a [ScheduleEntry],
) -> Option<(&'a ScheduleEntry, f64)> {
    let target = normalize_tournament(target_name);
    let mut best: Option<(&ScheduleEntry, f64)> = None;
    for entry in entries {
        let Some(name) = entry.name.as_deref() else {
            continue;
        };
        let mut score = similarity(&target, &normalize_tournament(name));
        if target_start.is_some() && entry.start_date == target_start {
            score += SAME_START_BONUS;
        }
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((entry, score));
        }
    }
    best.filter(|(entry, score)| *score >= ACCEPT_THRESHOLD && entry.id.is_some())
}

async fn find_tournament(
    db: &impl ConnectionTrait,
    tournament_id: i32,
) -> Result<tournament::Model, GenericError> {
    Tournament::find_by_id(tournament_id)
        .one(db)
        .await
        .map_err(db_error("Unable to load tournament"))?
        .ok_or(GenericError::NotFound("Tournament not found"))
}

/// Looks the tournament up in the upstream schedule of `year`, then of the year before.
///
/// A schedule that cannot be fetched counts as "not found" for that year. Only a missing
/// credential is reported as an error.
pub async fn resolve_live_golf_id(
    db: &impl ConnectionTrait,
    feed: &dyn LiveGolfFeed,
    tournament_id: i32,
    year: i32,
) -> Result<Option<Resolution>, GenericError> {
    let tournament = find_tournament(db, tournament_id).await?;

    for candidate_year in [year, year - 1] {
        let entries = match feed.schedule(candidate_year).await {
            Ok(entries) => entries,
            Err(e) if e.is_configuration() => return Err(e.into()),
            Err(e) => {
                warn!("Schedule for {} unavailable: {}", candidate_year, e);
                continue;
            }
        };
        if let Some((entry, score)) =
            best_schedule_match(&tournament.name, Some(tournament.start_date), &entries)
        {
            if let Some(event_id) = entry.id.clone() {
                info!(
                    "Resolved {} to event {} ({}) with score {:.2}",
                    tournament.name, event_id, candidate_year, score
                );
                return Ok(Some(Resolution {
                    event_id,
                    year: candidate_year,
                    score,
                }));
            }
        }
        debug!("No schedule entry for {} in {}", tournament.name, candidate_year);
    }
    Ok(None)
}

/// Resolves and remembers the identifier on the tournament row.
pub async fn resolve_and_store(
    db: &impl ConnectionTrait,
    feed: &dyn LiveGolfFeed,
    tournament_id: i32,
    year: i32,
) -> Result<Option<Resolution>, GenericError> {
    let resolution = resolve_live_golf_id(db, feed, tournament_id, year).await?;
    if let Some(resolution) = &resolution {
        set_live_golf_id(db, tournament_id, &resolution.event_id).await?;
    }
    Ok(resolution)
}

/// Manual assignment, the fallback when fuzzy resolution gives up.
pub async fn set_live_golf_id(
    db: &impl ConnectionTrait,
    tournament_id: i32,
    event_id: &str,
) -> Result<(), GenericError> {
    let mut active = find_tournament(db, tournament_id).await?.into_active_model();
    active.live_golf_id = Set(Some(event_id.trim().to_string()));
    active.update(db).await.map_err(db_error("Unable to store event id"))?;
    Ok(())
}

/// Assigns identifiers to every tournament of `season` from one schedule fetch.
///
/// Only literal matches count: normalized name plus start date, then normalized name alone.
/// A name alone that fits more than one internal tournament is skipped.
pub async fn sync_live_golf_ids<C>(
    db: &C,
    feed: &dyn LiveGolfFeed,
    season: i32,
) -> Result<SyncCounts, GenericError>
where
    C: ConnectionTrait + TransactionTrait,
{
    let entries = feed.schedule(season).await?;

    let tournaments = Tournament::find()
        .filter(tournament::Column::Season.eq(season))
        .all(db)
        .await
        .map_err(db_error("Unable to load tournaments"))?;

    let mut by_name_date: HashMap<(String, NaiveDate), Vec<i32>> = HashMap::new();
    let mut by_name: HashMap<String, Vec<i32>> = HashMap::new();
    for t in &tournaments {
        let key = normalize_tournament(&t.name);
        by_name_date
            .entry((key.clone(), t.start_date))
            .or_default()
            .push(t.id);
        by_name.entry(key).or_default().push(t.id);
    }

    let mut counts = SyncCounts::default();
    let mut assignments = Vec::new();
    for entry in &entries {
        let (Some(name), Some(event_id)) = (entry.name.as_deref(), entry.id.as_deref()) else {
            counts.skipped += 1;
            continue;
        };
        let key = normalize_tournament(name);
        let dated = entry
            .start_date
            .and_then(|start| by_name_date.get(&(key.clone(), start)));
        let target = match (dated, by_name.get(&key)) {
            (Some(ids), _) if ids.len() == 1 => Some(ids[0]),
            (_, Some(ids)) if ids.len() == 1 => Some(ids[0]),
            (_, Some(ids)) => {
                warn!("{} matches {} tournaments by name alone, skipping", name, ids.len());
                None
            }
            _ => None,
        };
        match target {
            Some(id) => assignments.push((id, event_id.to_string())),
            None => counts.skipped += 1,
        }
    }

    let txn = db.begin().await.map_err(db_error("Unable to begin txn"))?;
    for (id, event_id) in assignments {
        Tournament::update_many()
            .col_expr(tournament::Column::LiveGolfId, Expr::value(Some(event_id)))
            .filter(tournament::Column::Id.eq(id))
            .exec(&txn)
            .await
            .map_err(db_error("Unable to store event id"))?;
        counts.updated += 1;
    }
    txn.commit()
        .await
        .map_err(db_error("Unable to commit txn"))?;

    info!(
        "Event id sync for {}: {} updated, {} skipped",
        season, counts.updated, counts.skipped
    );
    Ok(counts)
}
