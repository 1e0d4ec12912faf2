//! Database migrations.
//!
//! Schema for users, the category/tag taxonomy, posts with their join
//! tables and media, orders and messages, followed by the taxonomy seed.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_user_table;
mod m20250101_000002_create_taxonomy_tables;
mod m20250101_000003_create_post_tables;
mod m20250101_000004_create_order_tables;
mod m20250101_000005_seed_taxonomy;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_user_table::Migration),
            Box::new(m20250101_000002_create_taxonomy_tables::Migration),
            Box::new(m20250101_000003_create_post_tables::Migration),
            Box::new(m20250101_000004_create_order_tables::Migration),
            Box::new(m20250101_000005_seed_taxonomy::Migration),
        ]
    }
}
