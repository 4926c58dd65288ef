use std::collections::HashMap;

use bcrypt::verify;
use chrono::{DateTime, Utc};
use entity::prelude::*;
use entity::*;
use itertools::Itertools;
use sea_orm::entity::prelude::*;
use sea_orm::QueryOrder;

use crate::dto::{GolferInfo, Me, StandingRow, TournamentInfo, TournamentPicks, UserPicks};
use crate::error::{GenericError, db_error};
use crate::ledger::{is_locked, used_golfers};

pub async fn user_by_id(db: &impl ConnectionTrait, id: i32) -> Result<user::Model, GenericError> {
    User::find_by_id(id)
        .one(db)
        .await
        .map_err(db_error("Unable to load user"))?
        .ok_or(GenericError::NotFound("User not found"))
}

pub async fn user_by_name(
    db: &impl ConnectionTrait,
    name: &str,
) -> Result<Option<user::Model>, GenericError> {
    User::find()
        .filter(user::Column::Name.eq(name.trim()))
        .one(db)
        .await
        .map_err(db_error("Unable to load user"))
}

/// Checks a PIN against the stored hash. A user without a hash never authenticates here.
pub fn pin_matches(user: &user::Model, pin: &str) -> bool {
    user.pin_hash
        .as_deref()
        .map(|hash| verify(pin, hash).unwrap_or(false))
        .unwrap_or(false)
}

pub async fn tournament_by_live_golf_id(
    db: &impl ConnectionTrait,
    event_id: &str,
) -> Result<Option<tournament::Model>, GenericError> {
    Tournament::find()
        .filter(tournament::Column::LiveGolfId.eq(event_id.trim()))
        .order_by_desc(tournament::Column::Season)
        .one(db)
        .await
        .map_err(db_error("Unable to load tournament"))
}

impl From<&user::Model> for Me {
    fn from(u: &user::Model) -> Self {
        Me {
            id: u.id,
            name: u.name.clone(),
            is_admin: u.is_admin,
            double_pick_used: u.double_pick_used,
        }
    }
}

pub async fn list_tournaments(
    db: &impl ConnectionTrait,
    season: i32,
    now: DateTime<Utc>,
) -> Result<Vec<TournamentInfo>, GenericError> {
    Ok(Tournament::find()
        .filter(tournament::Column::Season.eq(season))
        .order_by_asc(tournament::Column::StartDate)
        .all(db)
        .await
        .map_err(db_error("Unable to load tournaments"))?
        .into_iter()
        .map(|t| TournamentInfo {
            locked: is_locked(&t, now),
            id: t.id,
            name: t.name,
            start_date: t.start_date,
            end_date: t.end_date,
            is_major: t.is_major,
            is_signature: t.is_signature,
            purse: t.purse,
            live_golf_id: t.live_golf_id,
        })
        .collect())
}

/// The roster, flagging the golfers `user_id` has already used.
pub async fn list_golfers(
    db: &impl ConnectionTrait,
    user_id: Option<i32>,
) -> Result<Vec<GolferInfo>, GenericError> {
    let used = match user_id {
        Some(id) => used_golfers(db, id).await?,
        None => Default::default(),
    };
    Ok(Golfer::find()
        .order_by_asc(golfer::Column::Name)
        .all(db)
        .await
        .map_err(db_error("Unable to load golfers"))?
        .into_iter()
        .map(|g| GolferInfo {
            used: used.contains(&g.id),
            id: g.id,
            name: g.name,
            fedex_rank: g.fedex_rank,
            active: g.active,
        })
        .collect())
}

/// Winnings, wins, top-5 and top-10 finishes per user, richest first.
pub async fn standings(db: &impl ConnectionTrait) -> Result<Vec<StandingRow>, GenericError> {
    let users = User::find()
        .all(db)
        .await
        .map_err(db_error("Unable to load users"))?;
    let picks = Pick::find()
        .all(db)
        .await
        .map_err(db_error("Unable to load picks"))?;
    let results: HashMap<(i32, i32), tournament_result::Model> = TournamentResult::find()
        .all(db)
        .await
        .map_err(db_error("Unable to load results"))?
        .into_iter()
        .map(|r| ((r.tournament_id, r.golfer_id), r))
        .collect();

    let picks_by_user = picks.into_iter().into_group_map_by(|p| p.user_id);

    Ok(users
        .into_iter()
        .map(|u| {
            let mut row = StandingRow {
                user: u.name,
                total: 0,
                wins: 0,
                top5: 0,
                top10: 0,
            };
            let scored = picks_by_user
                .get(&u.id)
                .into_iter()
                .flatten()
                .filter_map(|p| results.get(&(p.tournament_id, p.golfer_id)));
            for result in scored {
                row.total += result.purse;
                match result.position {
                    Some(1) => {
                        row.wins += 1;
                        row.top5 += 1;
                        row.top10 += 1;
                    }
                    Some(p) if (2..=5).contains(&p) => {
                        row.top5 += 1;
                        row.top10 += 1;
                    }
                    Some(p) if (6..=10).contains(&p) => row.top10 += 1,
                    _ => {}
                }
            }
            row
        })
        .sorted_by(|a, b| b.total.cmp(&a.total).then_with(|| a.user.cmp(&b.user)))
        .collect())
}

/// Everyone's picks for one tournament. Before the reveal only administrators and the
/// owner see golfer names.
pub async fn tournament_picks(
    db: &impl ConnectionTrait,
    tournament_id: i32,
    viewer: Option<&user::Model>,
    now: DateTime<Utc>,
) -> Result<TournamentPicks, GenericError> {
    let tournament = Tournament::find_by_id(tournament_id)
        .one(db)
        .await
        .map_err(db_error("Unable to load tournament"))?
        .ok_or(GenericError::NotFound("Tournament not found"))?;
    let revealed = is_locked(&tournament, now);

    let picks = Pick::find()
        .filter(pick::Column::TournamentId.eq(tournament_id))
        .order_by_asc(pick::Column::CreatedAt)
        .all(db)
        .await
        .map_err(db_error("Unable to load picks"))?;
    let users: HashMap<i32, String> = User::find()
        .all(db)
        .await
        .map_err(db_error("Unable to load users"))?
        .into_iter()
        .map(|u| (u.id, u.name))
        .collect();
    let golfers: HashMap<i32, String> = Golfer::find()
        .filter(golfer::Column::Id.is_in(picks.iter().map(|p| p.golfer_id).unique()))
        .all(db)
        .await
        .map_err(db_error("Unable to load golfers"))?
        .into_iter()
        .map(|g| (g.id, g.name))
        .collect();

    let entries = picks
        .into_iter()
        .into_group_map_by(|p| p.user_id)
        .into_iter()
        .map(|(user_id, picks)| {
            let visible = revealed
                || viewer.is_some_and(|v| v.is_admin || v.id == user_id);
            UserPicks {
                user: users.get(&user_id).cloned().unwrap_or_default(),
                pick_count: picks.len(),
                golfers: visible.then(|| {
                    picks
                        .iter()
                        .filter_map(|p| golfers.get(&p.golfer_id).cloned())
                        .collect()
                }),
            }
        })
        .sorted_by(|a, b| a.user.cmp(&b.user))
        .collect();

    Ok(TournamentPicks {
        tournament_id,
        tournament: tournament.name,
        revealed,
        entries,
    })
}
