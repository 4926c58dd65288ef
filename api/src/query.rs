use chrono::Utc;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use sea_orm::DatabaseConnection;

use service::config::Settings;
use service::dto::{GolferInfo, StandingRow, TournamentInfo, TournamentPicks};
use service::error::GenericError;

use crate::authenticate::UserAuthentication;

/// # Season standings
///
/// Total purse won by each participant's picks, best first.
#[openapi(tag = "Standings")]
#[get("/standings")]
pub(crate) async fn standings(
    db: &State<DatabaseConnection>,
) -> Result<Json<Vec<StandingRow>>, GenericError> {
    Ok(Json(service::standings(db.inner()).await?))
}

#[openapi(tag = "Tournaments")]
#[get("/tournaments")]
pub(crate) async fn tournaments(
    db: &State<DatabaseConnection>,
    settings: &State<Settings>,
) -> Result<Json<Vec<TournamentInfo>>, GenericError> {
    Ok(Json(
        service::list_tournaments(db.inner(), settings.season, Utc::now()).await?,
    ))
}

/// # Golfers
///
/// When signed in, golfers already used by the caller are flagged.
#[openapi(tag = "Golfers")]
#[get("/golfers")]
pub(crate) async fn golfers(
    db: &State<DatabaseConnection>,
    user: Option<UserAuthentication>,
) -> Result<Json<Vec<GolferInfo>>, GenericError> {
    let user_id = user.map(|u| u.user().id);
    Ok(Json(service::list_golfers(db.inner(), user_id).await?))
}

/// # Picks for one tournament
///
/// Other participants' golfers stay hidden until the reveal time.
#[openapi(tag = "Picks")]
#[get("/tournaments/<id>/picks")]
pub(crate) async fn tournament_picks(
    db: &State<DatabaseConnection>,
    user: Option<UserAuthentication>,
    id: i32,
) -> Result<Json<TournamentPicks>, GenericError> {
    let viewer = user.as_ref().map(|u| u.user());
    Ok(Json(
        service::tournament_picks(db.inner(), id, viewer, Utc::now()).await?,
    ))
}
