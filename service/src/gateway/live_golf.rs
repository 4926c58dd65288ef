use log::info;
use serde_json::Value;

use super::{first_route_that_answers, http_client, read_json, spellings, LiveGolfFeed, RouteAttempt};
use crate::config::LiveGolfSettings;
use crate::dto::live_golf::{
    parse_earnings, parse_leaderboard, parse_schedule, EarningsRow, LeaderboardRow, ScheduleEntry,
};
use crate::error::GatewayError;

const ORG_PGA_TOUR: &str = "1";

/// Client for the live golf data provider, authenticated with a host and key header pair.
#[derive(Debug, Clone)]
pub struct LiveGolfClient {
    http: reqwest::Client,
    base_url: String,
    host: String,
    key: Option<String>,
}

impl LiveGolfClient {
    pub fn new(settings: &LiveGolfSettings) -> Result<Self, GatewayError> {
        Ok(Self {
            http: http_client()?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            host: settings.host.clone(),
            key: settings.key.clone(),
        })
    }

    async fn get_json(&self, attempt: RouteAttempt) -> Result<Value, GatewayError> {
        let key = self
            .key
            .as_deref()
            .ok_or(GatewayError::MissingCredential("LIVE_GOLF_KEY"))?;
        let response = self
            .http
            .get(format!("{}{}", self.base_url, attempt.path))
            .header("x-rapidapi-host", &self.host)
            .header("x-rapidapi-key", key)
            .query(&attempt.query)
            .send()
            .await?;
        read_json(attempt.path, response).await
    }

    fn event_query(event_id: &str, year: i32) -> Vec<(&'static str, String)> {
        vec![
            ("orgId", ORG_PGA_TOUR.to_string()),
            ("tournId", event_id.trim().to_string()),
            ("year", year.to_string()),
        ]
    }
}

#[rocket::async_trait]
impl LiveGolfFeed for LiveGolfClient {
    async fn schedule(&self, year: i32) -> Result<Vec<ScheduleEntry>, GatewayError> {
        let attempts = spellings(
            &["/schedules", "/schedule"],
            vec![("orgId", ORG_PGA_TOUR.to_string()), ("year", year.to_string())],
        );
        let payload = first_route_that_answers(attempts, |a| self.get_json(a)).await?;
        let entries = parse_schedule(&payload);
        info!("Fetched {} schedule entries for {}", entries.len(), year);
        Ok(entries)
    }

    async fn leaderboard(
        &self,
        event_id: &str,
        year: i32,
    ) -> Result<Vec<LeaderboardRow>, GatewayError> {
        let attempts = spellings(
            &["/leaderboards", "/leaderboard"],
            Self::event_query(event_id, year),
        );
        let payload = first_route_that_answers(attempts, |a| self.get_json(a)).await?;
        Ok(parse_leaderboard(&payload))
    }

    async fn earnings(&self, event_id: &str, year: i32) -> Result<Vec<EarningsRow>, GatewayError> {
        let attempts = spellings(&["/earnings", "/earning"], Self::event_query(event_id, year));
        let payload = first_route_that_answers(attempts, |a| self.get_json(a)).await?;
        Ok(parse_earnings(&payload))
    }
}
