use std::collections::{HashMap, HashSet};

use bcrypt::{hash, DEFAULT_COST};
use entity::prelude::*;
use entity::*;
use log::{error, info};
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{IntoActiveModel, TransactionTrait};

use crate::dto::RosterReport;
use crate::error::{AuthError, GenericError, db_error};
use crate::normalize::normalize_person;
use crate::query::{pin_matches, user_by_name};

/// Creates the pool participants that do not exist yet and flags the administrator.
pub async fn ensure_members(
    db: &impl ConnectionTrait,
    members: &[String],
    admin: Option<&str>,
) -> Result<u32, GenericError> {
    let mut created = 0;
    for name in members.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        if user_by_name(db, name).await?.is_none() {
            User::insert(user::ActiveModel {
                id: NotSet,
                name: Set(name.to_string()),
                double_pick_used: Set(false),
                pin_hash: Set(None),
                is_admin: Set(Some(name) == admin),
            })
            .exec_without_returning(db)
            .await
            .map_err(db_error("Unable to create user"))?;
            created += 1;
        }
    }
    if let Some(admin) = admin {
        if let Some(user) = user_by_name(db, admin).await? {
            if !user.is_admin {
                let mut active = user.into_active_model();
                active.is_admin = Set(true);
                active.update(db).await.map_err(db_error("Unable to flag admin"))?;
            }
        }
    }
    if created > 0 {
        info!("Created {} pool members", created);
    }
    Ok(created)
}

pub fn valid_pin(pin: &str) -> bool {
    (4..=6).contains(&pin.len()) && pin.bytes().all(|b| b.is_ascii_digit())
}

/// Signs a participant in. The first sign-in stores the PIN, later ones must match it.
/// Returns whether a new PIN was stored.
pub async fn sign_in(
    db: &impl ConnectionTrait,
    name: &str,
    pin: &str,
) -> Result<(user::Model, bool), GenericError> {
    let pin = pin.trim();
    if !valid_pin(pin) {
        return Err(AuthError::MalformedPin("PIN must be 4 to 6 digits").into());
    }
    let user = user_by_name(db, name)
        .await?
        .ok_or(AuthError::Invalid("Unknown participant"))?;

    if user.pin_hash.is_none() {
        let hashed = hash(pin, DEFAULT_COST).map_err(|e| {
            error!("Error while hashing PIN: {:#?}", e);
            GenericError::UnknownError("Unable to store PIN")
        })?;
        let mut active = user.into_active_model();
        active.pin_hash = Set(Some(hashed));
        let user = active.update(db).await.map_err(db_error("Unable to store PIN"))?;
        info!("{} set their PIN", user.name);
        return Ok((user, true));
    }

    if pin_matches(&user, pin) {
        Ok((user, false))
    } else {
        Err(AuthError::WrongPin("Wrong PIN").into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterLine {
    pub name: String,
    pub fedex_rank: Option<i32>,
    pub fedex_points: Option<i32>,
}

/// `name[, rank[, points]]`, or the same fields tab separated.
pub fn parse_roster_line(line: &str) -> Option<RosterLine> {
    fn number(field: Option<&str>) -> Result<Option<i32>, ()> {
        match field.filter(|f| !f.is_empty()) {
            None => Ok(None),
            Some(f) => f.replace(',', "").parse().map(Some).map_err(|_| ()),
        }
    }

    let separator = if line.contains('\t') { '\t' } else { ',' };
    let fields: Vec<&str> = line.split(separator).map(str::trim).collect();
    if fields.len() > 3 {
        return None;
    }
    let name = fields.first().filter(|n| !n.is_empty())?.to_string();
    Some(RosterLine {
        name,
        fedex_rank: number(fields.get(1).copied()).ok()?,
        fedex_points: number(fields.get(2).copied()).ok()?,
    })
}

/// Inserts, updates and reactivates golfers from a pasted roster. With `deactivate_missing`,
/// active golfers absent from the paste are deactivated, never deleted.
pub async fn import_roster<C>(
    db: &C,
    text: &str,
    deactivate_missing: bool,
) -> Result<RosterReport, GenericError>
where
    C: ConnectionTrait + TransactionTrait,
{
    let mut report = RosterReport::default();
    let mut lines = Vec::new();
    for (number, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_roster_line(line) {
            Some(parsed) => lines.push(parsed),
            None => report.unparsed_lines.push(number + 1),
        }
    }

    let txn = db.begin().await.map_err(db_error("Unable to begin txn"))?;
    let mut existing: HashMap<String, golfer::Model> = Golfer::find()
        .all(&txn)
        .await
        .map_err(db_error("Unable to load golfers"))?
        .into_iter()
        .map(|g| (normalize_person(&g.name), g))
        .collect();

    let mut seen = HashSet::new();
    let mut seen_names = HashSet::new();
    for line in lines {
        let key = normalize_person(&line.name);
        if !seen_names.insert(key.clone()) {
            continue;
        }
        match existing.remove(&key) {
            Some(golfer) => {
                seen.insert(golfer.id);
                if golfer.active {
                    report.updated += 1;
                } else {
                    report.reactivated += 1;
                }
                let mut active = golfer.into_active_model();
                active.active = Set(true);
                if line.fedex_rank.is_some() {
                    active.fedex_rank = Set(line.fedex_rank);
                }
                if line.fedex_points.is_some() {
                    active.fedex_points = Set(line.fedex_points);
                }
                active.update(&txn).await.map_err(db_error("Unable to update golfer"))?;
            }
            None => {
                let inserted = Golfer::insert(golfer::ActiveModel {
                    id: NotSet,
                    name: Set(line.name.clone()),
                    fedex_rank: Set(line.fedex_rank),
                    fedex_points: Set(line.fedex_points),
                    active: Set(true),
                    catalog_id: Set(None),
                    live_golf_id: Set(None),
                })
                .exec(&txn)
                .await
                .map_err(db_error("Unable to insert golfer"))?;
                seen.insert(inserted.last_insert_id);
                report.inserted += 1;
            }
        }
    }

    if deactivate_missing {
        for golfer in existing.into_values().filter(|g| g.active && !seen.contains(&g.id)) {
            let mut active = golfer.into_active_model();
            active.active = Set(false);
            active.update(&txn).await.map_err(db_error("Unable to deactivate golfer"))?;
            report.deactivated += 1;
        }
    }
    txn.commit().await.map_err(db_error("Unable to commit txn"))?;

    info!(
        "Roster import: {} inserted, {} updated, {} reactivated, {} deactivated, {} unparsed",
        report.inserted,
        report.updated,
        report.reactivated,
        report.deactivated,
        report.unparsed_lines.len()
    );
    Ok(report)
}
