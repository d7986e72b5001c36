use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum TicketNotes {
    Table,
    Id,
    TicketId,
    UserId,
    Note,
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
                    .table(TicketNotes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TicketNotes::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TicketNotes::TicketId).integer().not_null())
                    .col(ColumnDef::new(TicketNotes::UserId).integer().not_null())
                    .col(ColumnDef::new(TicketNotes::Note).text().not_null())
                    .col(
                        ColumnDef::new(TicketNotes::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ticket_notes_ticket_id")
                            .from(TicketNotes::Table, TicketNotes::TicketId)
                            .to(Tickets::Table, Tickets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ticket_notes_user_id")
                            .from(TicketNotes::Table, TicketNotes::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ticket_notes_ticket_created")
                    .table(TicketNotes::Table)
                    .col(TicketNotes::TicketId)
                    .col(TicketNotes::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TicketNotes::Table).to_owned())
            .await
    }
}
