pub use sea_orm;
pub use sea_orm_migration::prelude::*;
mod enums;
mod m20250105_000001_create_users_golfers_tournaments;
mod m20250105_000002_create_picks_and_results;
mod macros;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250105_000001_create_users_golfers_tournaments::Migration),
            Box::new(m20250105_000002_create_picks_and_results::Migration),
        ]
    }
}
