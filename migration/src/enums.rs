use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
pub(crate) enum User {
    #[sea_orm(iden = "users")]
    Table,
    Id,
    Name,
    DoublePickUsed,
    PinHash,
    IsAdmin,
}

#[derive(DeriveIden)]
pub(crate) enum Golfer {
    #[sea_orm(iden = "golfers")]
    Table,
    Id,
    Name,
    FedexRank,
    FedexPoints,
    Active,
    CatalogId,
    LiveGolfId,
}

#[derive(DeriveIden)]
pub(crate) enum Tournament {
    #[sea_orm(iden = "tournaments")]
    Table,
    Id,
    Name,
    StartDate,
    EndDate,
    IsMajor,
    IsSignature,
    Season,
    Purse,
    CatalogId,
    LiveGolfId,
}

#[derive(DeriveIden)]
pub(crate) enum Pick {
    #[sea_orm(iden = "picks")]
    Table,
    Id,
    UserId,
    TournamentId,
    GolferId,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(crate) enum TournamentResult {
    #[sea_orm(iden = "tournament_results")]
    Table,
    Id,
    TournamentId,
    GolferId,
    Purse,
    Position,
}
