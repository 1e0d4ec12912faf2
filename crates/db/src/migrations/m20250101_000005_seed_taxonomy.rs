//! Seed the category tree and tag reference data.
//!
//! Branch roots must stay at `root.1` (surfboard) and `root.2` (snowboard);
//! listing filters resolve the board type to these paths.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            r"
            INSERT INTO category (id, parent_id, value, label, path) VALUES
                (1, NULL, 'all', 'All', 'root'),
                (2, 1, 'surfboard', 'Surfboard', 'root.1'),
                (3, 1, 'snowboard', 'Snowboard', 'root.2'),
                (4, 2, 'longboard', 'Longboard', 'root.1.3'),
                (5, 2, 'shortboard', 'Shortboard', 'root.1.4'),
                (6, 3, 'freestyle', 'Freestyle', 'root.2.5'),
                (7, 3, 'powder', 'Powder', 'root.2.6')
            ON CONFLICT DO NOTHING
            ",
        )
        .await?;

        db.execute_unprepared(
            r"
            INSERT INTO tag (type, value, label) VALUES
                ('Skill Level', 'beginner', 'Beginner'),
                ('Skill Level', 'intermediate', 'Intermediate'),
                ('Skill Level', 'advanced', 'Advanced'),
                ('Surfboard Brand', 'firewire', 'Firewire'),
                ('Surfboard Brand', 'lost', 'Lost'),
                ('Snowboard Brand', 'burton', 'Burton'),
                ('Snowboard Brand', 'jones', 'Jones')
            ON CONFLICT DO NOTHING
            ",
        )
        .await?;

        // Explicit ids above leave the serial behind.
        db.execute_unprepared(
            "SELECT setval(pg_get_serial_sequence('category', 'id'), (SELECT MAX(id) FROM category))",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DELETE FROM tag").await?;
        db.execute_unprepared("DELETE FROM category").await?;
        Ok(())
    }
}
