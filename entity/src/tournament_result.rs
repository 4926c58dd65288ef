use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tournament_results")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub tournament_id: i32,
    pub golfer_id: i32,
    pub purse: i64,
    /// `None` for players who missed the cut, withdrew or are otherwise unplaced.
    pub position: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tournament::Entity",
        from = "Column::TournamentId",
        to = "super::tournament::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Tournament,
    #[sea_orm(
        belongs_to = "super::golfer::Entity",
        from = "Column::GolferId",
        to = "super::golfer::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Golfer,
}

impl Related<super::tournament::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tournament.def()
    }
}

impl Related<super::golfer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Golfer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
