use sea_orm_migration::prelude::*;

mod m20250101_initial;
mod m20250102_add_users;
mod m20250110_add_response_cache;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_initial::Migration),
            Box::new(m20250102_add_users::Migration),
            Box::new(m20250110_add_response_cache::Migration),
        ]
    }
}
