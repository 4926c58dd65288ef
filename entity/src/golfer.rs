use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "golfers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub fedex_rank: Option<i32>,
    pub fedex_points: Option<i32>,
    pub active: bool,
    /// Player id on the tournament catalog provider.
    pub catalog_id: Option<i32>,
    /// Player id on the live leaderboard provider.
    pub live_golf_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::pick::Entity")]
    Pick,
    #[sea_orm(has_many = "super::tournament_result::Entity")]
    TournamentResult,
}

impl Related<super::pick::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pick.def()
    }
}

impl Related<super::tournament_result::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TournamentResult.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
