use crate::macros::*;
use sea_orm_migration::prelude::*;

use crate::enums::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Pick::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Pick::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Pick::UserId).integer().not_null())
                    .col(ColumnDef::new(Pick::TournamentId).integer().not_null())
                    .col(ColumnDef::new(Pick::GolferId).integer().not_null())
                    .col(
                        ColumnDef::new(Pick::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Pick::Table, Pick::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Pick::Table, Pick::TournamentId)
                            .to(Tournament::Table, Tournament::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Pick::Table, Pick::GolferId)
                            .to(Golfer::Table, Golfer::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One golfer per user for the whole season.
        manager
            .create_index(
                Index::create()
                    .name("idx_picks_user_golfer")
                    .table(Pick::Table)
                    .col(Pick::UserId)
                    .col(Pick::GolferId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_picks_user_tournament")
                    .table(Pick::Table)
                    .col(Pick::UserId)
                    .col(Pick::TournamentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TournamentResult::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TournamentResult::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TournamentResult::TournamentId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TournamentResult::GolferId).integer().not_null())
                    .col(
                        ColumnDef::new(TournamentResult::Purse)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(TournamentResult::Position).integer())
                    .foreign_key(
                        ForeignKey::create()
                            .from(TournamentResult::Table, TournamentResult::TournamentId)
                            .to(Tournament::Table, Tournament::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TournamentResult::Table, TournamentResult::GolferId)
                            .to(Golfer::Table, Golfer::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_results_tournament_golfer")
                    .table(TournamentResult::Table)
                    .col(TournamentResult::TournamentId)
                    .col(TournamentResult::GolferId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_index!("idx_results_tournament_golfer", TournamentResult, manager);
        drop_table!(TournamentResult, manager);
        drop_index!("idx_picks_user_tournament", Pick, manager);
        drop_index!("idx_picks_user_golfer", Pick, manager);
        drop_table!(Pick, manager);
        Ok(())
    }
}
