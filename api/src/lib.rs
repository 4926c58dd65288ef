mod authenticate;
mod mutation;
mod query;
mod sync;

use std::error::Error;
use std::sync::Arc;

use rocket_okapi::openapi_get_routes;

#[macro_use]
extern crate rocket;

use authenticate::*;
use log::error;
use migration::MigratorTrait;
use mutation::*;
use query::*;
use rocket::{Build, Rocket, Route};

use rocket_okapi::rapidoc::{make_rapidoc, GeneralConfig, HideShowConfig, RapiDocConfig};
use rocket_okapi::settings::UrlObject;
use rocket_okapi::swagger_ui::{make_swagger_ui, SwaggerUIConfig};
use sea_orm::DatabaseConnection;
use service::config::Settings;
use service::gateway::{CatalogClient, LiveGolfClient, LiveGolfFeed, TournamentCatalog};
use service::sync::Synchronizer;
use sync::*;

/// The two upstream data providers, shared by every route that pulls from them.
pub struct Providers {
    pub live_golf: Arc<dyn LiveGolfFeed>,
    pub catalog: Arc<dyn TournamentCatalog>,
}

impl Providers {
    pub fn from_settings(settings: &Settings) -> Result<Self, service::error::GatewayError> {
        Ok(Self {
            live_golf: Arc::new(LiveGolfClient::new(&settings.live_golf)?),
            catalog: Arc::new(CatalogClient::new(&settings.catalog)?),
        })
    }
}

#[catch(404)]
fn general_not_found() -> &'static str {
    "Api endpoint not found"
}

pub fn routes() -> Vec<Route> {
    openapi_get_routes![
        login,
        logout,
        me,
        submit_pick,
        admin_pick,
        delete_picks,
        upsert_result,
        import_clipboard,
        import_roster,
        upsert_tournament,
        resolve_tournament,
        resolve_all_tournaments,
        set_live_golf_id,
        sync_results,
        sync_catalog_tournaments,
        sync_catalog_results,
        standings,
        tournaments,
        golfers,
        tournament_picks,
        scheduled_sync,
    ]
}

/// Everything the routes read from rocket's managed state.
pub fn build_rocket(
    db: DatabaseConnection,
    settings: Settings,
    synchronizer: Synchronizer,
    providers: Providers,
) -> Rocket<Build> {
    rocket::build()
        .manage(db)
        .manage(settings)
        .manage(synchronizer)
        .manage(providers)
        .mount("/api", routes())
        .mount(
            "/api/swagger",
            make_swagger_ui(&SwaggerUIConfig {
                url: "../openapi.json".to_owned(),
                ..Default::default()
            }),
        )
        .mount(
            "/api/",
            make_rapidoc(&RapiDocConfig {
                general: GeneralConfig {
                    spec_urls: vec![UrlObject::new("General", "./openapi.json")],
                    ..Default::default()
                },
                hide_show: HideShowConfig {
                    allow_spec_url_load: false,
                    allow_spec_file_load: false,
                    ..Default::default()
                },
                ..Default::default()
            }),
        )
        .register("/api", catchers![general_not_found])
}

/// Connects, migrates, seeds the members and hydrates from the remote store before
/// handing back the configured rocket.
pub async fn launch() -> Result<Rocket<Build>, Box<dyn Error>> {
    let settings = Settings::from_env()?;

    let db = sea_orm::Database::connect(settings.database_url.as_str()).await?;
    migration::Migrator::up(&db, None).await?;

    service::ensure_members(&db, &settings.members, settings.admin.as_deref())
        .await
        .map_err(|e| format!("Unable to create pool members: {e:?}"))?;

    let synchronizer = Synchronizer::from_settings(&settings);
    if let Err(e) = synchronizer.hydrate(&db).await {
        error!("Startup hydration failed, continuing with local data: {}", e);
    }

    let providers = Providers::from_settings(&settings)?;
    Ok(build_rocket(db, settings, synchronizer, providers))
}
