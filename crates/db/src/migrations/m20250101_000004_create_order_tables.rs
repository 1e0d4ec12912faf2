//! Create order and message tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Order::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Order::Id).string_len(32).not_null().primary_key())
                    .col(ColumnDef::new(Order::PostId).string_len(32).not_null())
                    .col(ColumnDef::new(Order::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Order::PaymentId).string_len(128))
                    .col(
                        ColumnDef::new(Order::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Order::Quantity).integer().not_null())
                    .col(ColumnDef::new(Order::Total).double().not_null())
                    .col(ColumnDef::new(Order::StartDate).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Order::EndDate).timestamp_with_time_zone().not_null())
                    .col(
                        ColumnDef::new(Order::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Order::DeletedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_post")
                            .from(Order::Table, Order::PostId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_user")
                            .from(Order::Table, Order::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_order_user_id")
                    .table(Order::Table)
                    .col(Order::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Message::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Message::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Message::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Message::PostId).string_len(32))
                    .col(ColumnDef::new(Message::OrderId).string_len(32))
                    .col(ColumnDef::new(Message::Message).text().not_null())
                    .col(
                        ColumnDef::new(Message::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_message_user")
                            .from(Message::Table, Message::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_message_post")
                            .from(Message::Table, Message::PostId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_message_order")
                            .from(Message::Table, Message::OrderId)
                            .to(Order::Table, Order::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // A message hangs off a post or an order, never both.
        manager
            .get_connection()
            .execute_unprepared(
                r"
                ALTER TABLE message
                ADD CONSTRAINT chk_message_single_owner
                CHECK ((post_id IS NULL) <> (order_id IS NULL))
                ",
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_message_order_id")
                    .table(Message::Table)
                    .col(Message::OrderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_message_post_id")
                    .table(Message::Table)
                    .col(Message::PostId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Message::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Order::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Order {
    Table,
    Id,
    PostId,
    UserId,
    PaymentId,
    Status,
    Quantity,
    Total,
    StartDate,
    EndDate,
    CreatedAt,
    DeletedAt,
}

#[derive(Iden)]
enum Message {
    Table,
    Id,
    UserId,
    PostId,
    OrderId,
    Message,
    CreatedAt,
}

#[derive(Iden)]
enum Post {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
