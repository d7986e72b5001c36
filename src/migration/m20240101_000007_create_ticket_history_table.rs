use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum TicketHistory {
    Table,
    Id,
    TicketId,
    UserId,
    Action,
    OldValue,
    NewValue,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Tickets {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TicketHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TicketHistory::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TicketHistory::TicketId).integer().not_null())
                    .col(ColumnDef::new(TicketHistory::UserId).integer().not_null())
                    .col(
                        ColumnDef::new(TicketHistory::Action)
                            .string_len(30)
                            .not_null()
                            .check(
                                Expr::col(TicketHistory::Action)
                                    .is_in(["STATUS_CHANGE", "ASSIGNEE_CHANGE"]),
                            ),
                    )
                    .col(ColumnDef::new(TicketHistory::OldValue).text().null())
                    .col(ColumnDef::new(TicketHistory::NewValue).text().null())
                    .col(
                        ColumnDef::new(TicketHistory::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ticket_history_ticket_id")
                            .from(TicketHistory::Table, TicketHistory::TicketId)
                            .to(Tickets::Table, Tickets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ticket_history_user_id")
                            .from(TicketHistory::Table, TicketHistory::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ticket_history_ticket_created")
                    .table(TicketHistory::Table)
                    .col(TicketHistory::TicketId)
                    .col(TicketHistory::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TicketHistory::Table).to_owned())
            .await
    }
}
