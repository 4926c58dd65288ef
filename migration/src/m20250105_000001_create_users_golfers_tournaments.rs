use crate::macros::*;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

use crate::enums::*;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(User::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(User::Name).string().unique_key().not_null())
                    .col(
                        ColumnDef::new(User::DoublePickUsed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(User::PinHash).string())
                    .col(
                        ColumnDef::new(User::IsAdmin)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Golfer::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Golfer::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Golfer::Name).string().unique_key().not_null())
                    .col(ColumnDef::new(Golfer::FedexRank).integer())
                    .col(ColumnDef::new(Golfer::FedexPoints).integer())
                    .col(
                        ColumnDef::new(Golfer::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Golfer::CatalogId).integer())
                    .col(ColumnDef::new(Golfer::LiveGolfId).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tournament::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tournament::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tournament::Name).string().not_null())
                    .col(ColumnDef::new(Tournament::StartDate).date().not_null())
                    .col(ColumnDef::new(Tournament::EndDate).date().not_null())
                    .col(
                        ColumnDef::new(Tournament::IsMajor)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Tournament::IsSignature)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Tournament::Season).integer().not_null())
                    .col(ColumnDef::new(Tournament::Purse).big_integer())
                    .col(ColumnDef::new(Tournament::CatalogId).integer())
                    .col(ColumnDef::new(Tournament::LiveGolfId).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tournaments_name_season")
                    .table(Tournament::Table)
                    .col(Tournament::Name)
                    .col(Tournament::Season)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_index!("idx_tournaments_name_season", Tournament, manager);
        drop_table!(Tournament, manager);
        drop_table!(Golfer, manager);
        drop_table!(User, manager);
        Ok(())
    }
}
