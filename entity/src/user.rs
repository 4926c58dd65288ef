use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub double_pick_used: bool,
    pub pin_hash: Option<String>,
    pub is_admin: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::pick::Entity")]
    Pick,
}

impl Related<super::pick::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pick.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
