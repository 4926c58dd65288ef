//! Keeps the local database, the optional remote spreadsheet and the picks snapshot in step.
//!
//! The local database is always written first and stays the source of truth. Mirroring
//! to the remote store happens afterwards and its failures are only logged.

mod cache;
mod sheets;
mod snapshot;

pub use cache::{RemoteCache, RECORDS_LIFESPAN_SECS, SESSION_LIFESPAN_SECS};
pub use sheets::SheetsStore;
pub use snapshot::{PickRecord, PicksSnapshot};

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use entity::prelude::*;
use entity::{golfer, pick, tournament, tournament_result, user};
use itertools::Itertools;
use log::{debug, error, info, warn};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{PaginatorTrait, QueryOrder, TransactionTrait};
use serde::Serialize;

use crate::config::Settings;
use crate::dto::live_golf::{parse_money, parse_position};
use crate::error::{RemoteError, SyncError};

/// A remote row keyed by its header.
pub type Record = HashMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteTable {
    Picks,
    Results,
    Users,
}

impl RemoteTable {
    pub fn tab(self) -> &'static str {
        match self {
            RemoteTable::Picks => "picks",
            RemoteTable::Results => "results",
            RemoteTable::Users => "users",
        }
    }

    pub fn header(self) -> &'static [&'static str] {
        match self {
            RemoteTable::Picks => &["user", "tournament", "golfer", "created_at"],
            RemoteTable::Results => &["tournament", "golfer", "purse", "position", "updated_at"],
            RemoteTable::Users => &["name", "pin_hash", "is_admin", "double_pick_used", "updated_at"],
        }
    }
}

/// An authenticated handle on the remote store and the tabs it currently has.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteSession {
    pub tables: HashSet<String>,
}

impl RemoteSession {
    pub fn has(&self, table: RemoteTable) -> bool {
        self.tables.contains(table.tab())
    }
}

#[rocket::async_trait]
pub trait RemoteStore: Send + Sync {
    async fn connect(&self) -> Result<RemoteSession, RemoteError>;

    /// Rows below the header. A missing tab reads as empty.
    async fn read_table(
        &self,
        session: &RemoteSession,
        table: RemoteTable,
    ) -> Result<Vec<Record>, RemoteError>;

    /// Clears the tab and writes the header followed by `rows`, creating the tab when
    /// needed. Returns whether the tab had to be created.
    async fn write_table(
        &self,
        session: &RemoteSession,
        table: RemoteTable,
        rows: Vec<Vec<String>>,
    ) -> Result<bool, RemoteError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PersistOutcome {
    Mirrored,
    Snapshot,
    /// Nothing to do without a remote store.
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HydrateReport {
    pub users: u32,
    pub picks: u32,
    pub results: u32,
    pub picks_from_snapshot: u32,
    pub users_pushed: bool,
}

pub struct Synchronizer {
    remote: Option<Arc<dyn RemoteStore>>,
    cache: RemoteCache,
    snapshot: PicksSnapshot,
}

impl Synchronizer {
    pub fn new(remote: Option<Arc<dyn RemoteStore>>, snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            remote,
            cache: RemoteCache::default(),
            snapshot: PicksSnapshot::new(snapshot_path),
        }
    }

    /// Uses the spreadsheet when it is configured. A store that cannot be built is
    /// logged and treated as absent.
    pub fn from_settings(settings: &Settings) -> Self {
        let remote = settings.sheets.clone().and_then(|sheets| {
            match SheetsStore::new(sheets) {
                Ok(store) => Some(Arc::new(store) as Arc<dyn RemoteStore>),
                Err(e) => {
                    error!("Unable to build the remote store client: {}", e);
                    None
                }
            }
        });
        if remote.is_none() {
            info!(
                "No remote store, picks are kept in {}",
                settings.snapshot_path.display()
            );
        }
        Self::new(remote, settings.snapshot_path.clone())
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub fn cache(&self) -> &RemoteCache {
        &self.cache
    }

    async fn session(&self, remote: &dyn RemoteStore) -> Result<RemoteSession, RemoteError> {
        if let Some(session) = self.cache.session() {
            return Ok(session);
        }
        let session = remote.connect().await?;
        self.cache.store_session(session.clone());
        Ok(session)
    }

    /// Rows of `table`, served from the cache while it is fresh.
    pub async fn remote_records(&self, table: RemoteTable) -> Result<Vec<Record>, RemoteError> {
        let remote = self.remote.as_deref().ok_or(RemoteError::NotConfigured)?;
        if let Some(rows) = self.cache.records(table) {
            debug!("Serving remote {} from cache", table.tab());
            return Ok(rows);
        }
        let session = self.session(remote).await?;
        let rows = remote.read_table(&session, table).await?;
        self.cache.store_records(table, rows.clone());
        Ok(rows)
    }

    async fn mirror(&self, table: RemoteTable, rows: Vec<Vec<String>>) -> Result<(), RemoteError> {
        let remote = self.remote.as_deref().ok_or(RemoteError::NotConfigured)?;
        let session = self.session(remote).await?;
        let written = remote.write_table(&session, table, rows).await;
        self.cache.invalidate(table);
        if written? {
            self.cache.forget_session();
        }
        Ok(())
    }

    /// Mirrors every pick after a pick mutation. Without a remote store the snapshot file
    /// is rewritten instead.
    pub async fn persist_picks(&self, db: &impl ConnectionTrait) -> PersistOutcome {
        let picks = match pick_records(db).await {
            Ok(picks) => picks,
            Err(e) => {
                error!("Unable to read picks for persisting: {}", e);
                return PersistOutcome::Failed;
            }
        };
        if self.remote.is_none() {
            return match self.snapshot.write(&picks).await {
                Ok(()) => PersistOutcome::Snapshot,
                Err(e) => {
                    error!(
                        "Unable to write picks snapshot {}: {}",
                        self.snapshot.path().display(),
                        e
                    );
                    PersistOutcome::Failed
                }
            };
        }
        let rows = picks
            .into_iter()
            .map(|p| vec![p.user, p.tournament, p.golfer, p.created_at])
            .collect();
        self.mirror_or_log(RemoteTable::Picks, rows).await
    }

    pub async fn persist_results(&self, db: &impl ConnectionTrait) -> PersistOutcome {
        if self.remote.is_none() {
            return PersistOutcome::Skipped;
        }
        match result_rows(db).await {
            Ok(rows) => self.mirror_or_log(RemoteTable::Results, rows).await,
            Err(e) => {
                error!("Unable to read results for persisting: {}", e);
                PersistOutcome::Failed
            }
        }
    }

    pub async fn persist_users(&self, db: &impl ConnectionTrait) -> PersistOutcome {
        if self.remote.is_none() {
            return PersistOutcome::Skipped;
        }
        match user_rows(db).await {
            Ok(rows) => self.mirror_or_log(RemoteTable::Users, rows).await,
            Err(e) => {
                error!("Unable to read users for persisting: {}", e);
                PersistOutcome::Failed
            }
        }
    }

    async fn mirror_or_log(&self, table: RemoteTable, rows: Vec<Vec<String>>) -> PersistOutcome {
        let count = rows.len();
        match self.mirror(table, rows).await {
            Ok(()) => {
                info!("Mirrored {} {} rows to the remote store", count, table.tab());
                PersistOutcome::Mirrored
            }
            Err(e) => {
                warn!("Remote {} mirror failed: {}", table.tab(), e);
                PersistOutcome::Failed
            }
        }
    }

    /// Startup pull. Users and results from a configured remote replace the local rows,
    /// picks only fill an empty local table. Remote failures are logged and skipped.
    pub async fn hydrate<C>(&self, db: &C) -> Result<HydrateReport, SyncError>
    where
        C: ConnectionTrait + TransactionTrait,
    {
        let mut report = HydrateReport::default();

        if self.remote.is_some() {
            match self.remote_records(RemoteTable::Users).await {
                Ok(rows) if rows.is_empty() => {
                    report.users_pushed =
                        self.persist_users(db).await == PersistOutcome::Mirrored;
                }
                Ok(rows) => report.users = hydrate_users(db, &rows).await?,
                Err(e) => warn!("Skipping user hydration: {}", e),
            }

            match self.remote_records(RemoteTable::Results).await {
                Ok(rows) => report.results = hydrate_results(db, &rows).await?,
                Err(e) => warn!("Skipping result hydration: {}", e),
            }
        }

        let local_picks = Pick::find().count(db).await?;
        if local_picks == 0 && self.remote.is_some() {
            match self.remote_records(RemoteTable::Picks).await {
                Ok(rows) => report.picks = restore_picks(db, &records_to_picks(&rows), true).await?,
                Err(e) => warn!("Skipping pick hydration: {}", e),
            }
        }
        if local_picks == 0 && report.picks == 0 {
            match self.snapshot.read().await {
                Ok(Some(picks)) => {
                    report.picks_from_snapshot = restore_picks(db, &picks, false).await?;
                }
                Ok(None) => {}
                Err(e) => warn!(
                    "Ignoring unreadable snapshot {}: {}",
                    self.snapshot.path().display(),
                    e
                ),
            }
        }

        info!("Hydration finished: {:?}", report);
        Ok(report)
    }
}

fn flag(raw: &str) -> bool {
    matches!(raw.trim(), "1" | "true" | "True" | "TRUE")
}

fn flag_cell(value: bool) -> String {
    (if value { "1" } else { "0" }).to_string()
}

fn parse_created_at(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|d| d.and_utc())
        })
        .unwrap_or_else(|_| Utc::now())
}

fn records_to_picks(rows: &[Record]) -> Vec<PickRecord> {
    let cell = |row: &Record, key: &str| row.get(key).cloned().unwrap_or_default();
    rows.iter()
        .map(|row| PickRecord {
            user: cell(row, "user"),
            tournament: cell(row, "tournament"),
            golfer: cell(row, "golfer"),
            created_at: cell(row, "created_at"),
        })
        .collect()
}

/// Tournament names are unique per season. The latest season wins a name clash.
async fn tournament_ids(db: &impl ConnectionTrait) -> Result<HashMap<String, i32>, DbErr> {
    Ok(Tournament::find()
        .order_by_asc(tournament::Column::Season)
        .all(db)
        .await?
        .into_iter()
        .map(|t| (t.name, t.id))
        .collect())
}

async fn golfer_ids(db: &impl ConnectionTrait) -> Result<HashMap<String, i32>, DbErr> {
    Ok(Golfer::find()
        .all(db)
        .await?
        .into_iter()
        .map(|g| (g.name, g.id))
        .collect())
}

async fn user_ids(db: &impl ConnectionTrait) -> Result<HashMap<String, i32>, DbErr> {
    Ok(User::find()
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.name, u.id))
        .collect())
}

/// Every pick by name, oldest first.
pub async fn pick_records(db: &impl ConnectionTrait) -> Result<Vec<PickRecord>, DbErr> {
    let users: HashMap<i32, String> = user_ids(db)
        .await?
        .into_iter()
        .map(|(name, id)| (id, name))
        .collect();
    let tournaments: HashMap<i32, String> = Tournament::find()
        .all(db)
        .await?
        .into_iter()
        .map(|t| (t.id, t.name))
        .collect();
    let golfers: HashMap<i32, String> = golfer_ids(db)
        .await?
        .into_iter()
        .map(|(name, id)| (id, name))
        .collect();

    Ok(Pick::find()
        .order_by_asc(pick::Column::CreatedAt)
        .order_by_asc(pick::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|p| {
            Some(PickRecord {
                user: users.get(&p.user_id)?.clone(),
                tournament: tournaments.get(&p.tournament_id)?.clone(),
                golfer: golfers.get(&p.golfer_id)?.clone(),
                created_at: p.created_at.to_rfc3339(),
            })
        })
        .collect())
}

async fn result_rows(db: &impl ConnectionTrait) -> Result<Vec<Vec<String>>, DbErr> {
    let tournaments: HashMap<i32, tournament::Model> = Tournament::find()
        .all(db)
        .await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();
    let golfers: HashMap<i32, String> = golfer_ids(db)
        .await?
        .into_iter()
        .map(|(name, id)| (id, name))
        .collect();
    let now = Utc::now().to_rfc3339();

    Ok(TournamentResult::find()
        .all(db)
        .await?
        .into_iter()
        .filter_map(|r| {
            let tournament = tournaments.get(&r.tournament_id)?;
            let golfer = golfers.get(&r.golfer_id)?;
            Some((tournament.start_date, tournament.name.clone(), golfer.clone(), r))
        })
        .sorted_by(|a, b| (a.0, &a.2).cmp(&(b.0, &b.2)))
        .map(|(_, tournament, golfer, r)| {
            vec![
                tournament,
                golfer,
                r.purse.to_string(),
                r.position.map(|p| p.to_string()).unwrap_or_default(),
                now.clone(),
            ]
        })
        .collect())
}

async fn user_rows(db: &impl ConnectionTrait) -> Result<Vec<Vec<String>>, DbErr> {
    let now = Utc::now().to_rfc3339();
    Ok(User::find()
        .order_by_asc(user::Column::Name)
        .all(db)
        .await?
        .into_iter()
        .map(|u| {
            vec![
                u.name,
                u.pin_hash.unwrap_or_default(),
                flag_cell(u.is_admin),
                flag_cell(u.double_pick_used),
                now.clone(),
            ]
        })
        .collect())
}

/// Remote users overwrite the local flags. A blank remote hash keeps the local one.
async fn hydrate_users<C>(db: &C, rows: &[Record]) -> Result<u32, SyncError>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;
    let existing: HashMap<String, user::Model> = User::find()
        .all(&txn)
        .await?
        .into_iter()
        .map(|u| (u.name.clone(), u))
        .collect();

    let mut restored = 0;
    for row in rows {
        let name = row.get("name").map(|n| n.trim()).unwrap_or_default();
        if name.is_empty() {
            continue;
        }
        let pin_hash = row
            .get("pin_hash")
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty());
        let is_admin = row.get("is_admin").is_some_and(|v| flag(v));
        let double_pick_used = row.get("double_pick_used").is_some_and(|v| flag(v));

        match existing.get(name) {
            Some(local) => {
                let mut active: user::ActiveModel = local.clone().into();
                active.is_admin = Set(is_admin);
                active.double_pick_used = Set(double_pick_used);
                if pin_hash.is_some() {
                    active.pin_hash = Set(pin_hash);
                }
                active.update(&txn).await?;
            }
            None => {
                user::ActiveModel {
                    id: NotSet,
                    name: Set(name.to_string()),
                    double_pick_used: Set(double_pick_used),
                    pin_hash: Set(pin_hash),
                    is_admin: Set(is_admin),
                }
                .insert(&txn)
                .await?;
            }
        }
        restored += 1;
    }
    txn.commit().await?;
    Ok(restored)
}

/// Replaces every local result with the remote ones. Rows naming an unknown tournament
/// or golfer are dropped, and nothing changes when no row survives.
async fn hydrate_results<C>(db: &C, rows: &[Record]) -> Result<u32, SyncError>
where
    C: ConnectionTrait + TransactionTrait,
{
    if rows.is_empty() {
        return Ok(0);
    }
    let tournaments = tournament_ids(db).await?;
    let golfers = golfer_ids(db).await?;

    let pending: Vec<tournament_result::ActiveModel> = rows
        .iter()
        .filter_map(|row| {
            let tournament_id = *tournaments.get(row.get("tournament")?)?;
            let golfer_id = *golfers.get(row.get("golfer")?)?;
            let purse = row.get("purse").and_then(|p| parse_money(p)).unwrap_or(0);
            let position = row.get("position").and_then(|p| parse_position(p));
            Some((tournament_id, golfer_id, purse, position))
        })
        .unique_by(|(tournament_id, golfer_id, _, _)| (*tournament_id, *golfer_id))
        .map(|(tournament_id, golfer_id, purse, position)| tournament_result::ActiveModel {
            id: NotSet,
            tournament_id: Set(tournament_id),
            golfer_id: Set(golfer_id),
            purse: Set(purse),
            position: Set(position),
        })
        .collect();
    if pending.is_empty() {
        warn!("Remote results matched no local tournament or golfer, keeping local rows");
        return Ok(0);
    }

    let restored = pending.len() as u32;
    let txn = db.begin().await?;
    TournamentResult::delete_many().exec(&txn).await?;
    TournamentResult::insert_many(pending)
        .exec_without_returning(&txn)
        .await?;
    txn.commit().await?;
    Ok(restored)
}

/// Inserts picks by name. Remote picks may introduce golfers the roster does not know
/// yet, snapshot picks may not.
async fn restore_picks<C>(
    db: &C,
    picks: &[PickRecord],
    create_golfers: bool,
) -> Result<u32, SyncError>
where
    C: ConnectionTrait + TransactionTrait,
{
    if picks.is_empty() {
        return Ok(0);
    }
    let txn = db.begin().await?;
    let users = user_ids(&txn).await?;
    let tournaments = tournament_ids(&txn).await?;
    let mut golfers = golfer_ids(&txn).await?;

    let mut restored = 0;
    for record in picks {
        let golfer_name = record.golfer.trim();
        if create_golfers && !golfer_name.is_empty() && !golfers.contains_key(golfer_name) {
            let created = golfer::ActiveModel {
                id: NotSet,
                name: Set(golfer_name.to_string()),
                fedex_rank: Set(None),
                fedex_points: Set(None),
                active: Set(true),
                catalog_id: Set(None),
                live_golf_id: Set(None),
            }
            .insert(&txn)
            .await?;
            info!("Added golfer {} from a remote pick", created.name);
            golfers.insert(created.name, created.id);
        }
        let (Some(&user_id), Some(&tournament_id), Some(&golfer_id)) = (
            users.get(record.user.trim()),
            tournaments.get(record.tournament.trim()),
            golfers.get(golfer_name),
        ) else {
            debug!("Skipping pick {:?}, unknown names", record);
            continue;
        };
        let inserted = Pick::insert(pick::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            tournament_id: Set(tournament_id),
            golfer_id: Set(golfer_id),
            created_at: Set(parse_created_at(&record.created_at)),
        })
        .on_conflict(
            OnConflict::columns([pick::Column::UserId, pick::Column::GolferId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;
        restored += inserted as u32;
    }
    txn.commit().await?;
    Ok(restored)
}
