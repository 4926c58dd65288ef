use serde::de::DeserializeOwned;

use super::{collect_pages, http_client, TournamentCatalog};
use crate::config::CatalogSettings;
use crate::dto::catalog::{CatalogResult, CatalogTournament, Page};
use crate::error::GatewayError;

const PER_PAGE: &str = "100";

/// Client for the cursor-paginated tournament catalog.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    key: Option<String>,
}

impl CatalogClient {
    pub fn new(settings: &CatalogSettings) -> Result<Self, GatewayError> {
        Ok(Self {
            http: http_client()?,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            key: settings.key.clone(),
        })
    }

    async fn page<T: DeserializeOwned>(
        &self,
        path: &'static str,
        filter: &(&'static str, String),
        cursor: Option<String>,
    ) -> Result<(Vec<T>, Option<String>), GatewayError> {
        let key = self
            .key
            .as_deref()
            .ok_or(GatewayError::MissingCredential("CATALOG_API_KEY"))?;
        let mut query = vec![(filter.0, filter.1.clone()), ("per_page", PER_PAGE.to_string())];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor));
        }
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .header("Authorization", key)
            .query(&query)
            .send()
            .await?;
        let payload = super::read_json(path, response).await?;
        let page: Page<T> = serde_json::from_value(payload).map_err(|e| GatewayError::Payload {
            resource: path.to_string(),
            message: e.to_string(),
        })?;
        let next = page.next_cursor();
        Ok((page.data, next))
    }
}

#[rocket::async_trait]
impl TournamentCatalog for CatalogClient {
    async fn tournaments(&self, season: i32) -> Result<Vec<CatalogTournament>, GatewayError> {
        let filter = ("season", season.to_string());
        collect_pages(|cursor| self.page("/tournaments", &filter, cursor)).await
    }

    async fn tournament_results(
        &self,
        catalog_id: i32,
    ) -> Result<Vec<CatalogResult>, GatewayError> {
        let filter = ("tournament_ids", catalog_id.to_string());
        collect_pages(|cursor| self.page("/tournament_results", &filter, cursor)).await
    }
}
