use log::{info, warn};
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::okapi::schemars::{self, JsonSchema};
use rocket_okapi::openapi;
use sea_orm::DatabaseConnection;

use service::config::Settings;
use service::dto::MergeReport;
use service::error::{AuthError, GenericError};
use service::sync::Synchronizer;

use crate::Providers;

/// Query parameters of a scheduled results sync.
#[derive(FromForm, JsonSchema, Debug)]
pub struct SyncTrigger {
    token: Option<String>,
    #[field(name = "tournId")]
    #[schemars(rename = "tournId")]
    tourn_id: Option<String>,
    year: Option<i32>,
}

/// # Scheduled results sync
///
/// Called by an external scheduler with the shared `SYNC_TOKEN`, the live feed event id
/// and the year. Runs the same resolving results sync as the admin route.
///
/// # Errors
///
/// - 503 when no `SYNC_TOKEN` is configured
///
/// - 401 when the token is missing or does not match. Nothing is synced.
///
/// - 400 when `tournId` or `year` is missing
///
/// - 404 when no tournament carries the event id
#[openapi(tag = "Results")]
#[get("/sync?<trigger..>")]
pub(crate) async fn scheduled_sync(
    trigger: SyncTrigger,
    db: &State<DatabaseConnection>,
    settings: &State<Settings>,
    providers: &State<Providers>,
    synchronizer: &State<Synchronizer>,
) -> Result<Json<MergeReport>, GenericError> {
    let Some(expected) = settings.sync_token.as_deref() else {
        return Err(GenericError::Configuration("SYNC_TOKEN is not configured"));
    };
    if trigger.token.as_deref() != Some(expected) {
        warn!("Scheduled sync refused, bad token");
        return Err(AuthError::Missing("Missing or wrong sync token").into());
    }
    let (Some(event_id), Some(year)) = (trigger.tourn_id.as_deref(), trigger.year) else {
        return Err(GenericError::BadRequest(
            "Missing tournId or year for scheduled sync",
        ));
    };

    let tournament = service::tournament_by_live_golf_id(db.inner(), event_id)
        .await?
        .ok_or(GenericError::NotFound(
            "Scheduled sync failed, no tournament has this tournId",
        ))?;
    info!("Running scheduled sync of {} ({} {})", tournament.name, event_id, year);

    let report = service::merge::merge_with_autoresolve(
        db.inner(),
        providers.live_golf.as_ref(),
        Some(event_id),
        year,
        tournament.id,
    )
    .await?;
    synchronizer.persist_results(db.inner()).await;
    info!(
        "Scheduled sync stored {} results, skipped {} names",
        report.updated, report.skipped
    );
    Ok(Json(report))
}
