use entity::prelude::{Tournament, TournamentResult};
use entity::{tournament, tournament_result};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

use crate::error::{db_error, GenericError};

use super::*;

impl TournamentInput {
    /// Creates the tournament, or updates the one with the same name in the same season.
    pub async fn upsert(self, db: &impl ConnectionTrait) -> Result<i32, GenericError> {
        if self.end_date < self.start_date {
            return Err(GenericError::BadRequest("Tournament ends before it starts"));
        }
        let existing = Tournament::find()
            .filter(tournament::Column::Name.eq(self.name.trim()))
            .filter(tournament::Column::Season.eq(self.season))
            .one(db)
            .await
            .map_err(db_error("Unable to load tournament"))?;

        let mut active = self.into_active_model();
        let saved = match existing {
            Some(existing) => {
                active.id = sea_orm::ActiveValue::Unchanged(existing.id);
                Tournament::update(active).exec(db).await.map(|t| t.id)
            }
            None => Tournament::insert(active)
                .exec(db)
                .await
                .map(|r| r.last_insert_id),
        };
        saved.map_err(db_error("Unable to save tournament"))
    }
}

impl ResultInput {
    /// Manual correction of one result row, last writer wins.
    pub async fn upsert(&self, db: &impl ConnectionTrait) -> Result<(), GenericError> {
        if self.purse < 0 || self.position.is_some_and(|p| p < 1) {
            return Err(GenericError::BadRequest("Purse and position must be positive"));
        }
        TournamentResult::insert(self.active_result())
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
            .exec_without_returning(db)
            .await
            .map_err(|e| match e.sql_err() {
                Some(sea_orm::SqlErr::ForeignKeyConstraintViolation(_)) => {
                    GenericError::NotFound("Tournament or golfer not found")
                }
                _ => db_error("Unable to save result")(e),
            })?;
        Ok(())
    }
}
