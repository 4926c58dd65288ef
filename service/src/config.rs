use std::env;
use std::path::PathBuf;

pub const DEFAULT_LIVE_GOLF_HOST: &str = "live-golf-data.p.rapidapi.com";
pub const DEFAULT_CATALOG_BASE_URL: &str = "https://api.balldontlie.io/pga/v1";
pub const DEFAULT_SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";
pub const DEFAULT_SNAPSHOT_PATH: &str = "data/picks_backup.json";
pub const DEFAULT_SEASON: i32 = 2026;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),
    #[error("environment variable {var} has an invalid value {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Everything the pool reads from the environment, built once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub season: i32,
    pub members: Vec<String>,
    pub admin: Option<String>,
    pub live_golf: LiveGolfSettings,
    pub catalog: CatalogSettings,
    pub sheets: Option<SheetsSettings>,
    pub snapshot_path: PathBuf,
    pub sync_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LiveGolfSettings {
    pub key: Option<String>,
    pub host: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub key: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct SheetsSettings {
    pub spreadsheet_id: String,
    pub access_token: String,
    pub base_url: String,
}

fn non_empty(var: &'static str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();

        let database_url = non_empty("DATABASE_URL").ok_or(SettingsError::Missing("DATABASE_URL"))?;
        let season = match non_empty("POOL_SEASON") {
            Some(value) => value.parse().map_err(|_| SettingsError::Invalid {
                var: "POOL_SEASON",
                value,
            })?,
            None => DEFAULT_SEASON,
        };
        let members = non_empty("POOL_MEMBERS")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let host = non_empty("LIVE_GOLF_HOST").unwrap_or_else(|| DEFAULT_LIVE_GOLF_HOST.to_string());
        let live_golf = LiveGolfSettings {
            key: non_empty("LIVE_GOLF_KEY"),
            base_url: non_empty("LIVE_GOLF_BASE_URL").unwrap_or_else(|| format!("https://{host}")),
            host,
        };
        let catalog = CatalogSettings {
            key: non_empty("CATALOG_API_KEY"),
            base_url: non_empty("CATALOG_BASE_URL")
                .unwrap_or_else(|| DEFAULT_CATALOG_BASE_URL.to_string()),
        };
        let sheets = match (non_empty("SHEETS_ID"), non_empty("SHEETS_ACCESS_TOKEN")) {
            (Some(spreadsheet_id), Some(access_token)) => Some(SheetsSettings {
                spreadsheet_id,
                access_token,
                base_url: non_empty("SHEETS_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_SHEETS_BASE_URL.to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            season,
            members,
            admin: non_empty("POOL_ADMIN"),
            live_golf,
            catalog,
            sheets,
            snapshot_path: non_empty("PICKS_SNAPSHOT_PATH")
                .unwrap_or_else(|| DEFAULT_SNAPSHOT_PATH.to_string())
                .into(),
            sync_token: non_empty("SYNC_TOKEN"),
        })
    }

    /// Settings with every optional integration switched off.
    pub fn local(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            season: DEFAULT_SEASON,
            members: Vec::new(),
            admin: None,
            live_golf: LiveGolfSettings {
                key: None,
                host: DEFAULT_LIVE_GOLF_HOST.to_string(),
                base_url: format!("https://{DEFAULT_LIVE_GOLF_HOST}"),
            },
            catalog: CatalogSettings {
                key: None,
                base_url: DEFAULT_CATALOG_BASE_URL.to_string(),
            },
            sheets: None,
            snapshot_path: DEFAULT_SNAPSHOT_PATH.into(),
            sync_token: None,
        }
    }
}
