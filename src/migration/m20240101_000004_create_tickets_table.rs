use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Tickets {
    Table,
    Id,
    CallerName,
    Department,
    Phone,
    Description,
    Priority,
    Status,
    AssigneeId,
    CreatedBy,
    CategoryId,
    SubcategoryId,
    ResolutionNote,
    CreatedAt,
    UpdatedAt,
    ClosedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum TicketCategories {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum TicketSubcategories {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tickets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tickets::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tickets::CallerName).string_len(255).not_null())
                    .col(ColumnDef::new(Tickets::Department).string_len(255).not_null())
                    .col(ColumnDef::new(Tickets::Phone).string_len(255).null())
                    .col(ColumnDef::new(Tickets::Description).text().not_null())
                    .col(
                        ColumnDef::new(Tickets::Priority)
                            .string_len(20)
                            .not_null()
                            .check(Expr::col(Tickets::Priority).is_in(["LOW", "MEDIUM", "HIGH"])),
                    )
                    .col(
                        ColumnDef::new(Tickets::Status)
                            .string_len(20)
                            .not_null()
                            .default("OPEN")
                            .check(
                                Expr::col(Tickets::Status).is_in(["OPEN", "IN_PROGRESS", "RESOLVED"]),
                            ),
                    )
                    .col(ColumnDef::new(Tickets::AssigneeId).integer().null())
                    .col(ColumnDef::new(Tickets::CreatedBy).integer().not_null())
                    .col(ColumnDef::new(Tickets::CategoryId).integer().null())
                    .col(ColumnDef::new(Tickets::SubcategoryId).integer().null())
                    .col(ColumnDef::new(Tickets::ResolutionNote).text().null())
                    .col(
                        ColumnDef::new(Tickets::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Tickets::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Tickets::ClosedAt).timestamp().null())
                    // Assignees and creators cannot be deleted while they own tickets.
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tickets_assignee_id")
                            .from(Tickets::Table, Tickets::AssigneeId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tickets_created_by")
                            .from(Tickets::Table, Tickets::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tickets_category_id")
                            .from(Tickets::Table, Tickets::CategoryId)
                            .to(TicketCategories::Table, TicketCategories::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tickets_subcategory_id")
                            .from(Tickets::Table, Tickets::SubcategoryId)
                            .to(TicketSubcategories::Table, TicketSubcategories::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tickets_status")
                    .table(Tickets::Table)
                    .col(Tickets::Status)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tickets_created_by")
                    .table(Tickets::Table)
                    .col(Tickets::CreatedBy)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tickets_assignee_id")
                    .table(Tickets::Table)
                    .col(Tickets::AssigneeId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tickets::Table).to_owned())
            .await
    }
}
