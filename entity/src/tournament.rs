use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tournaments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub start_date: Date,
    pub end_date: Date,
    pub is_major: bool,
    pub is_signature: bool,
    pub season: i32,
    /// Unpublished for majors.
    pub purse: Option<i64>,
    pub catalog_id: Option<i32>,
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
