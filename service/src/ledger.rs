//! Pick eligibility: one golfer per user per season, two picks for majors, one season-long
//! double pick, and the 07:00 Eastern reveal lock.
//!
//! The unique index on `(user_id, golfer_id)` is what actually keeps a golfer from being
//! claimed twice, and the conditional update in [`spend_double_pick`] is what keeps the
//! token from being spent twice. The checks below only give the user a readable reason
//! first.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::America::New_York;
use entity::prelude::*;
use entity::{golfer, pick, tournament, user};
use log::info;
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::Expr;
use sea_orm::{DatabaseTransaction, SqlErr, TransactionTrait};

use crate::dto::{AdminPickSubmission, PickReceipt, PickSubmission};
use crate::error::{db_error, GenericError, PickError};

const REVEAL_HOUR: u32 = 7;

/// 07:00 America/New_York on the start date, as a UTC instant.
pub fn reveal_instant(start_date: NaiveDate) -> DateTime<Utc> {
    let reveal = start_date.and_time(NaiveTime::from_hms_opt(REVEAL_HOUR, 0, 0).unwrap_or(NaiveTime::MIN));
    New_York
        .from_local_datetime(&reveal)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&reveal))
}

pub fn is_locked(tournament: &tournament::Model, now: DateTime<Utc>) -> bool {
    now >= reveal_instant(tournament.start_date)
}

/// Who is submitting. Administrators skip the lock and may keep existing picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Owner,
    Admin { replace_existing: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickRequest {
    pub user_id: i32,
    pub tournament_id: i32,
    pub golfer_id: i32,
    pub second_golfer_id: Option<i32>,
    pub spend_double_pick: bool,
    pub actor: Actor,
}

impl PickSubmission {
    pub fn for_owner(self, user_id: i32) -> PickRequest {
        PickRequest {
            user_id,
            tournament_id: self.tournament_id,
            golfer_id: self.golfer_id,
            second_golfer_id: self.second_golfer_id,
            spend_double_pick: self.use_double_pick,
            actor: Actor::Owner,
        }
    }
}

impl From<AdminPickSubmission> for PickRequest {
    fn from(input: AdminPickSubmission) -> Self {
        PickRequest {
            user_id: input.user_id,
            tournament_id: input.tournament_id,
            golfer_id: input.golfer_id,
            second_golfer_id: input.second_golfer_id,
            spend_double_pick: input.use_double_pick,
            actor: Actor::Admin {
                replace_existing: input.replace_existing,
            },
        }
    }
}

async fn load_user(db: &impl ConnectionTrait, user_id: i32) -> Result<user::Model, GenericError> {
    User::find_by_id(user_id)
        .one(db)
        .await
        .map_err(db_error("Unable to load user"))?
        .ok_or(GenericError::NotFound("User not found"))
}

async fn load_tournament(
    db: &impl ConnectionTrait,
    tournament_id: i32,
) -> Result<tournament::Model, GenericError> {
    Tournament::find_by_id(tournament_id)
        .one(db)
        .await
        .map_err(db_error("Unable to load tournament"))?
        .ok_or(GenericError::NotFound("Tournament not found"))
}

async fn ensure_pickable(db: &impl ConnectionTrait, golfer_id: i32) -> Result<(), GenericError> {
    let golfer = Golfer::find_by_id(golfer_id)
        .one(db)
        .await
        .map_err(db_error("Unable to load golfer"))?;
    match golfer {
        Some(g) if g.active => Ok(()),
        Some(_) => Err(PickError::UnknownGolfer("Golfer is not on the active roster").into()),
        None => Err(PickError::UnknownGolfer("Golfer not found").into()),
    }
}

/// Golfer ids the user already holds anywhere in the season.
pub async fn used_golfers(
    db: &impl ConnectionTrait,
    user_id: i32,
) -> Result<HashSet<i32>, GenericError> {
    Ok(Pick::find()
        .filter(pick::Column::UserId.eq(user_id))
        .all(db)
        .await
        .map_err(db_error("Unable to load picks"))?
        .into_iter()
        .map(|p| p.golfer_id)
        .collect())
}

/// Validates and records a pick. Either every row and the token flip land, or nothing does.
pub async fn submit_pick<C>(
    db: &C,
    request: PickRequest,
    now: DateTime<Utc>,
) -> Result<PickReceipt, GenericError>
where
    C: ConnectionTrait + TransactionTrait,
{
    let tournament = load_tournament(db, request.tournament_id).await?;
    if request.actor == Actor::Owner && is_locked(&tournament, now) {
        return Err(PickError::Locked("Picks for this tournament are locked").into());
    }
    load_user(db, request.user_id).await?;

    let txn = db
        .begin()
        .await
        .map_err(db_error("Unable to begin txn"))?;
    match record_pick(&txn, &request, &tournament, now).await {
        Ok(receipt) => {
            txn.commit()
                .await
                .map_err(|e| unique_violation_or(e, "Unable to commit txn"))?;
            info!(
                "User {} picked {:?} for {}",
                request.user_id, receipt.golfer_ids, tournament.name
            );
            Ok(receipt)
        }
        Err(e) => {
            txn.rollback()
                .await
                .map_err(db_error("Unable to roll back txn"))?;
            Err(e)
        }
    }
}

async fn record_pick(
    txn: &DatabaseTransaction,
    request: &PickRequest,
    tournament: &tournament::Model,
    now: DateTime<Utc>,
) -> Result<PickReceipt, GenericError> {
    let replace = match request.actor {
        Actor::Owner => true,
        Actor::Admin { replace_existing } => replace_existing,
    };
    if replace {
        delete_rows(txn, request.user_id, tournament.id).await?;
    }

    let user = load_user(txn, request.user_id).await?;
    let used = used_golfers(txn, user.id).await?;

    if used.contains(&request.golfer_id) {
        return Err(PickError::GolferAlreadyUsed("Golfer already used this season").into());
    }
    if let Some(second) = request.second_golfer_id {
        if used.contains(&second) {
            return Err(
                PickError::SecondGolferAlreadyUsed("Second golfer already used this season").into(),
            );
        }
        if second == request.golfer_id {
            return Err(PickError::SameGolferTwice("Pick two different golfers").into());
        }
        if !tournament.is_major && request.spend_double_pick && user.double_pick_used {
            return Err(
                PickError::DoublePickExhausted("Double pick already used this season").into(),
            );
        }
        if !tournament.is_major && !request.spend_double_pick {
            return Err(PickError::SecondPickNeedsDoublePick(
                "A second golfer needs the double pick outside majors",
            )
            .into());
        }
    } else if tournament.is_major {
        return Err(PickError::MajorNeedsTwoGolfers("Majors take two golfers").into());
    }

    let golfer_ids: Vec<i32> = std::iter::once(request.golfer_id)
        .chain(request.second_golfer_id)
        .collect();
    // Roster state comes after the season rules.
    for golfer_id in &golfer_ids {
        ensure_pickable(txn, *golfer_id).await?;
    }
    for golfer_id in &golfer_ids {
        Pick::insert(pick::ActiveModel {
            id: NotSet,
            user_id: Set(user.id),
            tournament_id: Set(tournament.id),
            golfer_id: Set(*golfer_id),
            created_at: Set(now),
        })
        .exec_without_returning(txn)
        .await
        .map_err(|e| unique_violation_or(e, "Unable to store pick"))?;
    }

    let double_pick_spent =
        !tournament.is_major && request.second_golfer_id.is_some() && request.spend_double_pick;
    if double_pick_spent {
        spend_double_pick(txn, user.id).await?;
    }

    Ok(PickReceipt {
        user_id: request.user_id,
        tournament_id: tournament.id,
        golfer_ids,
        double_pick_spent,
    })
}

/// Flips the season token, but only from unspent to spent. Already spent is a rejection.
pub async fn spend_double_pick(db: &impl ConnectionTrait, user_id: i32) -> Result<(), GenericError> {
    let flipped = User::update_many()
        .col_expr(user::Column::DoublePickUsed, Expr::value(true))
        .filter(user::Column::Id.eq(user_id))
        .filter(user::Column::DoublePickUsed.eq(false))
        .exec(db)
        .await
        .map_err(db_error("Unable to spend double pick"))?;
    if flipped.rows_affected != 1 {
        return Err(PickError::DoublePickExhausted("Double pick already used this season").into());
    }
    Ok(())
}

/// A concurrent claim on the same golfer loses on the unique index.
fn unique_violation_or(e: DbErr, context: &'static str) -> GenericError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            PickError::GolferAlreadyUsed("Golfer already used this season").into()
        }
        _ => db_error(context)(e),
    }
}

async fn delete_rows(
    db: &impl ConnectionTrait,
    user_id: i32,
    tournament_id: i32,
) -> Result<u64, GenericError> {
    Ok(Pick::delete_many()
        .filter(pick::Column::UserId.eq(user_id))
        .filter(pick::Column::TournamentId.eq(tournament_id))
        .exec(db)
        .await
        .map_err(db_error("Unable to delete picks"))?
        .rows_affected)
}

/// Removes every pick `user_id` holds for one tournament. Owners may only do this before
/// the lock, administrators any time. A spent double pick stays spent.
pub async fn delete_picks(
    db: &impl ConnectionTrait,
    actor: &user::Model,
    user_id: i32,
    tournament_id: i32,
    now: DateTime<Utc>,
) -> Result<u64, GenericError> {
    let tournament = load_tournament(db, tournament_id).await?;
    if !actor.is_admin {
        if actor.id != user_id {
            return Err(PickError::NotPermitted("Only your own picks can be removed").into());
        }
        if is_locked(&tournament, now) {
            return Err(PickError::Locked("Picks for this tournament are locked").into());
        }
    }
    let removed = delete_rows(db, user_id, tournament_id).await?;
    info!(
        "{} removed {} picks of user {} for {}",
        actor.name, removed, user_id, tournament.name
    );
    Ok(removed)
}

/// Golfers still available to a user, for pick forms.
pub async fn available_golfers(
    db: &impl ConnectionTrait,
    user_id: i32,
) -> Result<Vec<golfer::Model>, GenericError> {
    let used = used_golfers(db, user_id).await?;
    Ok(Golfer::find()
        .filter(golfer::Column::Active.eq(true))
        .all(db)
        .await
        .map_err(db_error("Unable to load golfers"))?
        .into_iter()
        .filter(|g| !used.contains(&g.id))
        .collect())
}
