use chrono::Utc;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use sea_orm::DatabaseConnection;

use service::config::Settings;
use service::dto::{
    AdminPickSubmission, CatalogReport, ClipboardInput, DeletePicksInput, ImportReport,
    LiveGolfIdInput, MergeReport, PickReceipt, PickSubmission, ResolveInput, ResultInput,
    RosterInput, RosterReport, SyncCounts, TournamentInput,
};
use service::error::GenericError;
use service::ledger::{self, PickRequest};
use service::resolver::{self, Resolution};
use service::sync::Synchronizer;
use service::{catalog_sync, clipboard, merge};

use crate::authenticate::{AdminAuthentication, UserAuthentication};
use crate::Providers;

async fn persist_pick_change(
    db: &DatabaseConnection,
    synchronizer: &Synchronizer,
    receipt: &PickReceipt,
) {
    synchronizer.persist_picks(db).await;
    if receipt.double_pick_spent {
        synchronizer.persist_users(db).await;
    }
}

/// # Submit a pick
///
/// Replaces the signed-in participant's picks for the tournament. A second golfer is
/// required for majors and spends the double pick elsewhere.
///
/// # Errors
///
/// Each rejection has its own variant of `PickError`, checked in a fixed order.
#[openapi(tag = "Picks")]
#[post("/picks", format = "json", data = "<pick>")]
pub(crate) async fn submit_pick(
    user: UserAuthentication,
    pick: Json<PickSubmission>,
    db: &State<DatabaseConnection>,
    synchronizer: &State<Synchronizer>,
) -> Result<Json<PickReceipt>, GenericError> {
    let request = pick.into_inner().for_owner(user.user().id);
    let receipt = ledger::submit_pick(db.inner(), request, Utc::now()).await?;
    persist_pick_change(db.inner(), synchronizer.inner(), &receipt).await;
    Ok(Json(receipt))
}

/// # Submit a pick for someone else
///
/// Administrator only. Ignores the reveal lock.
#[openapi(tag = "Picks")]
#[post("/admin/picks", format = "json", data = "<pick>")]
pub(crate) async fn admin_pick(
    _admin: AdminAuthentication,
    pick: Json<AdminPickSubmission>,
    db: &State<DatabaseConnection>,
    synchronizer: &State<Synchronizer>,
) -> Result<Json<PickReceipt>, GenericError> {
    let request = PickRequest::from(pick.into_inner());
    let receipt = ledger::submit_pick(db.inner(), request, Utc::now()).await?;
    persist_pick_change(db.inner(), synchronizer.inner(), &receipt).await;
    Ok(Json(receipt))
}

/// # Remove picks
///
/// Removes every pick of one participant for one tournament. Omitting `user_id` means
/// the caller. A spent double pick is not given back.
#[openapi(tag = "Picks")]
#[delete("/picks", format = "json", data = "<input>")]
pub(crate) async fn delete_picks(
    user: UserAuthentication,
    input: Json<DeletePicksInput>,
    db: &State<DatabaseConnection>,
    synchronizer: &State<Synchronizer>,
) -> Result<Json<u64>, GenericError> {
    let input = input.into_inner();
    let actor = user.user();
    let removed = ledger::delete_picks(
        db.inner(),
        actor,
        input.user_id.unwrap_or(actor.id),
        input.tournament_id,
        Utc::now(),
    )
    .await?;
    if removed > 0 {
        synchronizer.persist_picks(db.inner()).await;
    }
    Ok(Json(removed))
}

#[openapi(tag = "Results")]
#[put("/results", format = "json", data = "<result>")]
pub(crate) async fn upsert_result(
    _admin: AdminAuthentication,
    result: Json<ResultInput>,
    db: &State<DatabaseConnection>,
    synchronizer: &State<Synchronizer>,
) -> Result<&'static str, GenericError> {
    result.into_inner().upsert(db.inner()).await?;
    synchronizer.persist_results(db.inner()).await;
    Ok("Result saved")
}

/// # Import pasted results
///
/// Accepts lines such as `T3 Jake Knapp $400,987` copied from a leaderboard page.
#[openapi(tag = "Results")]
#[post("/results/clipboard", format = "json", data = "<input>")]
pub(crate) async fn import_clipboard(
    _admin: AdminAuthentication,
    input: Json<ClipboardInput>,
    db: &State<DatabaseConnection>,
    synchronizer: &State<Synchronizer>,
) -> Result<Json<ImportReport>, GenericError> {
    let input = input.into_inner();
    let report = clipboard::import_clipboard(db.inner(), input.tournament_id, &input.text).await?;
    if report.imported > 0 {
        synchronizer.persist_results(db.inner()).await;
    }
    Ok(Json(report))
}

/// # Pull results from the live feed
///
/// Uses the stored event id when none is given and falls back to resolving one by name.
#[openapi(tag = "Results")]
#[post("/results/sync", format = "json", data = "<input>")]
pub(crate) async fn sync_results(
    _admin: AdminAuthentication,
    input: Json<ResolveInput>,
    db: &State<DatabaseConnection>,
    settings: &State<Settings>,
    providers: &State<Providers>,
    synchronizer: &State<Synchronizer>,
) -> Result<Json<MergeReport>, GenericError> {
    let input = input.into_inner();
    let report = merge::merge_with_autoresolve(
        db.inner(),
        providers.live_golf.as_ref(),
        input.event_id.as_deref(),
        input.year.unwrap_or(settings.season),
        input.tournament_id,
    )
    .await?;
    synchronizer.persist_results(db.inner()).await;
    Ok(Json(report))
}

#[openapi(tag = "Golfers")]
#[post("/golfers/roster", format = "json", data = "<input>")]
pub(crate) async fn import_roster(
    _admin: AdminAuthentication,
    input: Json<RosterInput>,
    db: &State<DatabaseConnection>,
) -> Result<Json<RosterReport>, GenericError> {
    let input = input.into_inner();
    Ok(Json(
        service::import_roster(db.inner(), &input.text, input.deactivate_missing).await?,
    ))
}

/// # Create or update a tournament
///
/// Matched on name and season.
///
/// # Returns
///
/// The tournament id.
#[openapi(tag = "Tournaments")]
#[put("/tournaments", format = "json", data = "<tournament>")]
pub(crate) async fn upsert_tournament(
    _admin: AdminAuthentication,
    tournament: Json<TournamentInput>,
    db: &State<DatabaseConnection>,
) -> Result<Json<i32>, GenericError> {
    Ok(Json(tournament.into_inner().upsert(db.inner()).await?))
}

/// # Find the live feed id of a tournament
///
/// Searches the feed's schedule for the year, then the year before, and stores the match.
#[openapi(tag = "Tournaments")]
#[post("/tournaments/resolve", format = "json", data = "<input>")]
pub(crate) async fn resolve_tournament(
    _admin: AdminAuthentication,
    input: Json<ResolveInput>,
    db: &State<DatabaseConnection>,
    settings: &State<Settings>,
    providers: &State<Providers>,
) -> Result<Json<Option<Resolution>>, GenericError> {
    let input = input.into_inner();
    let resolution = resolver::resolve_and_store(
        db.inner(),
        providers.live_golf.as_ref(),
        input.tournament_id,
        input.year.unwrap_or(settings.season),
    )
    .await?;
    Ok(Json(resolution))
}

#[openapi(tag = "Tournaments")]
#[post("/tournaments/resolve-all")]
pub(crate) async fn resolve_all_tournaments(
    _admin: AdminAuthentication,
    db: &State<DatabaseConnection>,
    settings: &State<Settings>,
    providers: &State<Providers>,
) -> Result<Json<SyncCounts>, GenericError> {
    Ok(Json(
        resolver::sync_live_golf_ids(db.inner(), providers.live_golf.as_ref(), settings.season)
            .await?,
    ))
}

#[openapi(tag = "Tournaments")]
#[put("/tournaments/live-golf-id", format = "json", data = "<input>")]
pub(crate) async fn set_live_golf_id(
    _admin: AdminAuthentication,
    input: Json<LiveGolfIdInput>,
    db: &State<DatabaseConnection>,
) -> Result<&'static str, GenericError> {
    let input = input.into_inner();
    resolver::set_live_golf_id(db.inner(), input.tournament_id, &input.live_golf_id).await?;
    Ok("Live feed id saved")
}

#[openapi(tag = "Catalog")]
#[post("/catalog/tournaments")]
pub(crate) async fn sync_catalog_tournaments(
    _admin: AdminAuthentication,
    db: &State<DatabaseConnection>,
    settings: &State<Settings>,
    providers: &State<Providers>,
) -> Result<Json<CatalogReport>, GenericError> {
    Ok(Json(
        catalog_sync::sync_catalog_tournaments(
            db.inner(),
            providers.catalog.as_ref(),
            settings.season,
        )
        .await?,
    ))
}

#[openapi(tag = "Catalog")]
#[post("/catalog/results")]
pub(crate) async fn sync_catalog_results(
    _admin: AdminAuthentication,
    db: &State<DatabaseConnection>,
    settings: &State<Settings>,
    providers: &State<Providers>,
    synchronizer: &State<Synchronizer>,
) -> Result<Json<CatalogReport>, GenericError> {
    let report = catalog_sync::sync_catalog_results(
        db.inner(),
        providers.catalog.as_ref(),
        settings.season,
    )
    .await?;
    synchronizer.persist_results(db.inner()).await;
    Ok(Json(report))
}
