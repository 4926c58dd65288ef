use std::collections::HashMap;

use entity::prelude::*;
use entity::{golfer, tournament, tournament_result};
use log::{info, warn};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::OnConflict;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{IntoActiveModel, TransactionTrait};

use crate::dto::CatalogReport;
use crate::error::{GenericError, db_error};
use crate::gateway::TournamentCatalog;
use crate::normalize::{normalize_person, normalize_tournament};

/// Pulls the season's schedule from the catalog. Known tournaments get their dates and
/// catalog id refreshed, unknown ones are inserted as regular events.
pub async fn sync_catalog_tournaments<C>(
    db: &C,
    catalog: &dyn TournamentCatalog,
    season: i32,
) -> Result<CatalogReport, GenericError>
where
    C: ConnectionTrait + TransactionTrait,
{
    let listed = catalog.tournaments(season).await?;

    let txn = db.begin().await.map_err(db_error("Unable to begin txn"))?;
    let mut existing: HashMap<String, tournament::Model> = Tournament::find()
        .filter(tournament::Column::Season.eq(season))
        .all(&txn)
        .await
        .map_err(db_error("Unable to load tournaments"))?
        .into_iter()
        .map(|t| (normalize_tournament(&t.name), t))
        .collect();

    let mut report = CatalogReport::default();
    for item in listed {
        let (Some(start), Some(end)) = (item.start(), item.end()) else {
            warn!("Catalog tournament {} has no usable dates", item.name);
            report.skipped += 1;
            continue;
        };
        match existing.remove(&normalize_tournament(&item.name)) {
            Some(known) => {
                let mut active = known.into_active_model();
                active.start_date = Set(start);
                active.end_date = Set(end);
                active.catalog_id = Set(Some(item.id));
                active
                    .update(&txn)
                    .await
                    .map_err(db_error("Unable to update tournament"))?;
                report.updated += 1;
            }
            None => {
                Tournament::insert(tournament::ActiveModel {
                    id: NotSet,
                    name: Set(item.name.trim().to_string()),
                    start_date: Set(start),
                    end_date: Set(end),
                    is_major: Set(false),
                    is_signature: Set(false),
                    season: Set(item.season.unwrap_or(season)),
                    purse: Set(None),
                    catalog_id: Set(Some(item.id)),
                    live_golf_id: Set(None),
                })
                .exec_without_returning(&txn)
                .await
                .map_err(db_error("Unable to insert tournament"))?;
                report.inserted += 1;
            }
        }
    }
    txn.commit().await.map_err(db_error("Unable to commit txn"))?;

    info!(
        "Catalog tournaments {}: {} inserted, {} updated, {} skipped",
        season, report.inserted, report.updated, report.skipped
    );
    Ok(report)
}

/// Pulls final results for every tournament of the season that has a catalog id. Players
/// seen for the first time are added to the roster.
pub async fn sync_catalog_results<C>(
    db: &C,
    catalog: &dyn TournamentCatalog,
    season: i32,
) -> Result<CatalogReport, GenericError>
where
    C: ConnectionTrait + TransactionTrait,
{
    let tournaments = Tournament::find()
        .filter(tournament::Column::Season.eq(season))
        .filter(tournament::Column::CatalogId.is_not_null())
        .all(db)
        .await
        .map_err(db_error("Unable to load tournaments"))?;

    let mut golfers: HashMap<String, golfer::Model> = Golfer::find()
        .all(db)
        .await
        .map_err(db_error("Unable to load golfers"))?
        .into_iter()
        .map(|g| (normalize_person(&g.name), g))
        .collect();

    let mut report = CatalogReport::default();
    for t in tournaments {
        let Some(catalog_id) = t.catalog_id else {
            continue;
        };
        let results = catalog.tournament_results(catalog_id).await?;

        let txn = db.begin().await.map_err(db_error("Unable to begin txn"))?;
        for result in results {
            let Some(player) = result.player else {
                report.skipped += 1;
                continue;
            };
            let Some(display) = player.display_name.filter(|n| !n.trim().is_empty()) else {
                report.skipped += 1;
                continue;
            };
            let key = normalize_person(&display);

            let golfer_id = match golfers.get(&key) {
                Some(known) if known.catalog_id.is_none() && player.id.is_some() => {
                    let mut active = known.clone().into_active_model();
                    active.catalog_id = Set(player.id);
                    let updated = active
                        .update(&txn)
                        .await
                        .map_err(db_error("Unable to update golfer"))?;
                    let id = updated.id;
                    golfers.insert(key, updated);
                    id
                }
                Some(known) => known.id,
                None => {
                    let inserted = golfer::ActiveModel {
                        id: NotSet,
                        name: Set(display.trim().to_string()),
                        fedex_rank: Set(None),
                        fedex_points: Set(None),
                        active: Set(true),
                        catalog_id: Set(player.id),
                        live_golf_id: Set(None),
                    }
                    .insert(&txn)
                    .await
                    .map_err(db_error("Unable to insert golfer"))?;
                    report.inserted += 1;
                    let id = inserted.id;
                    golfers.insert(key, inserted);
                    id
                }
            };

            TournamentResult::insert(tournament_result::ActiveModel {
                id: NotSet,
                tournament_id: Set(t.id),
                golfer_id: Set(golfer_id),
                purse: Set(result.earnings.unwrap_or(0)),
                position: Set(result.position_numeric),
            })
            .on_conflict(
                OnConflict::columns([
                    tournament_result::Column::TournamentId,
                    tournament_result::Column::GolferId,
                ])
                .update_columns([
                    tournament_result::Column::Purse,
                    tournament_result::Column::Position,
                ])
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await
            .map_err(db_error("Unable to store result"))?;
            report.updated += 1;
        }
        txn.commit().await.map_err(db_error("Unable to commit txn"))?;
    }

    info!(
        "Catalog results {}: {} rows, {} new golfers, {} skipped",
        season, report.updated, report.inserted, report.skipped
    );
    Ok(report)
}
