//! Thin clients for the two upstream golf data providers.
//!
//! Nothing in here knows about the pool's tables. The traits are the seam the resolver
//! and the merge engine are written against, so both can run on canned payloads.

mod catalog;
mod live_golf;

pub use catalog::CatalogClient;
pub use live_golf::LiveGolfClient;

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use log::warn;

use crate::dto::catalog::{CatalogResult, CatalogTournament};
use crate::dto::live_golf::{EarningsRow, LeaderboardRow, ScheduleEntry};
use crate::error::GatewayError;

/// Applied to every upstream call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Live leaderboard, earnings and schedule provider.
#[rocket::async_trait]
pub trait LiveGolfFeed: Send + Sync {
    async fn schedule(&self, year: i32) -> Result<Vec<ScheduleEntry>, GatewayError>;

    async fn leaderboard(
        &self,
        event_id: &str,
        year: i32,
    ) -> Result<Vec<LeaderboardRow>, GatewayError>;

    async fn earnings(&self, event_id: &str, year: i32) -> Result<Vec<EarningsRow>, GatewayError>;
}

/// Paginated tournament and result catalog provider.
#[rocket::async_trait]
pub trait TournamentCatalog: Send + Sync {
    async fn tournaments(&self, season: i32) -> Result<Vec<CatalogTournament>, GatewayError>;

    async fn tournament_results(&self, catalog_id: i32)
        -> Result<Vec<CatalogResult>, GatewayError>;
}

/// One spelling of a route together with its query parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteAttempt {
    pub path: &'static str,
    pub query: Vec<(&'static str, String)>,
}

/// The same parameters under every historical spelling of a route.
pub fn spellings(paths: &[&'static str], query: Vec<(&'static str, String)>) -> Vec<RouteAttempt> {
    paths
        .iter()
        .map(|path| RouteAttempt {
            path: *path,
            query: query.clone(),
        })
        .collect()
}

/// Tries each attempt in order. Moves on only when the route answered 400 or 404,
/// any other failure ends the chain. The last error is returned when nothing answered.
pub async fn first_route_that_answers<T, F, Fut>(
    attempts: Vec<RouteAttempt>,
    mut call: F,
) -> Result<T, GatewayError>
where
    F: FnMut(RouteAttempt) -> Fut,
    Fut: Future<Output = Result<T, GatewayError>>,
{
    let mut last_error = None;
    for attempt in attempts {
        let path = attempt.path;
        match call(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if e.allows_route_fallback() => {
                warn!("Route {} is not available ({}), trying next spelling", path, e);
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_error.unwrap_or_else(|| GatewayError::Payload {
        resource: String::new(),
        message: "no route spelling to try".to_string(),
    }))
}

/// Follows continuation cursors until the provider stops returning one.
/// A cursor seen twice ends the loop instead of spinning forever.
pub async fn collect_pages<T, F, Fut>(mut fetch_page: F) -> Result<Vec<T>, GatewayError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<(Vec<T>, Option<String>), GatewayError>>,
{
    let mut items = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor = None;
    loop {
        let (page, next) = fetch_page(cursor.take()).await?;
        items.extend(page);
        match next {
            Some(next) if seen.insert(next.clone()) => cursor = Some(next),
            Some(next) => {
                warn!("Cursor {} was returned twice, stopping pagination", next);
                break;
            }
            None => break,
        }
    }
    Ok(items)
}

pub(crate) fn http_client() -> Result<reqwest::Client, GatewayError> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(GatewayError::Transport)
}

pub(crate) async fn read_json(
    resource: &str,
    response: reqwest::Response,
) -> Result<serde_json::Value, GatewayError> {
    let status = response.status();
    if !status.is_success() {
        return Err(GatewayError::Status {
            resource: resource.to_string(),
            status: status.as_u16(),
        });
    }
    response.json().await.map_err(|e| {
        if e.is_timeout() {
            GatewayError::Timeout(resource.to_string())
        } else {
            GatewayError::Payload {
                resource: resource.to_string(),
                message: e.to_string(),
            }
        }
    })
}
