use std::collections::HashSet;

use log::{debug, info};
use reqwest::Client;
use serde_json::{json, Value};

use super::{Record, RemoteSession, RemoteStore, RemoteTable};
use crate::config::SheetsSettings;
use crate::error::RemoteError;
use crate::gateway::REQUEST_TIMEOUT;

/// Spreadsheet store on top of the Sheets v4 REST API. One tab per [`RemoteTable`].
pub struct SheetsStore {
    client: Client,
    settings: SheetsSettings,
}

impl SheetsStore {
    pub fn new(settings: SheetsSettings) -> Result<Self, RemoteError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, settings })
    }

    fn spreadsheet_url(&self) -> String {
        format!(
            "{}/{}",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.spreadsheet_id
        )
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, RemoteError> {
        let response = request
            .bearer_auth(&self.settings.access_token)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn add_tab(&self, table: RemoteTable) -> Result<(), RemoteError> {
        info!("Creating remote tab {}", table.tab());
        let body = json!({
            "requests": [{ "addSheet": { "properties": { "title": table.tab() } } }]
        });
        self.send(
            self.client
                .post(format!("{}:batchUpdate", self.spreadsheet_url()))
                .json(&body),
        )
        .await
        .map(|_| ())
    }
}

/// Tab titles listed in a spreadsheet metadata document.
pub fn tab_titles(metadata: &Value) -> HashSet<String> {
    metadata["sheets"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|s| s["properties"]["title"].as_str())
        .map(String::from)
        .collect()
}

/// Turns a `values` range into records keyed by the header row. Short rows are padded.
pub fn records_from_values(range: &Value) -> Vec<Record> {
    let mut rows = range["values"].as_array().into_iter().flatten().map(|row| {
        row.as_array()
            .into_iter()
            .flatten()
            .map(cell_text)
            .collect::<Vec<_>>()
    });
    let Some(header) = rows.next() else {
        return Vec::new();
    };
    rows.filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .map(|row| {
            header
                .iter()
                .enumerate()
                .map(|(i, key)| (key.clone(), row.get(i).cloned().unwrap_or_default()))
                .collect()
        })
        .collect()
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[rocket::async_trait]
impl RemoteStore for SheetsStore {
    async fn connect(&self) -> Result<RemoteSession, RemoteError> {
        let metadata = self
            .send(
                self.client
                    .get(self.spreadsheet_url())
                    .query(&[("fields", "sheets.properties.title")]),
            )
            .await?;
        let tables = tab_titles(&metadata);
        debug!("Remote spreadsheet has tabs {:?}", tables);
        Ok(RemoteSession { tables })
    }

    async fn read_table(
        &self,
        session: &RemoteSession,
        table: RemoteTable,
    ) -> Result<Vec<Record>, RemoteError> {
        if !session.has(table) {
            return Ok(Vec::new());
        }
        let range = self
            .send(
                self.client
                    .get(format!("{}/values/{}", self.spreadsheet_url(), table.tab())),
            )
            .await?;
        Ok(records_from_values(&range))
    }

    async fn write_table(
        &self,
        session: &RemoteSession,
        table: RemoteTable,
        rows: Vec<Vec<String>>,
    ) -> Result<bool, RemoteError> {
        let created = !session.has(table);
        if created {
            self.add_tab(table).await?;
        }
        let base = self.spreadsheet_url();
        self.send(
            self.client
                .post(format!("{base}/values/{}:clear", table.tab()))
                .json(&json!({})),
        )
        .await?;

        let mut values = vec![table.header().iter().map(|h| h.to_string()).collect()];
        values.extend(rows);
        self.send(
            self.client
                .put(format!("{base}/values/{}!A1", table.tab()))
                .query(&[("valueInputOption", "RAW")])
                .json(&json!({
                    "range": format!("{}!A1", table.tab()),
                    "majorDimension": "ROWS",
                    "values": values,
                })),
        )
        .await?;
        Ok(created)
    }
}
