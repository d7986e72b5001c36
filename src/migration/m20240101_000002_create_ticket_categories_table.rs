use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum TicketCategories {
    Table,
    Id,
    Name,
    Description,
    SortOrder,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TicketSubcategories {
    Table,
    Id,
    CategoryId,
    Name,
    Description,
    SortOrder,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TicketCategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TicketCategories::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TicketCategories::Name)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(TicketCategories::Description).string_len(400).null())
                    .col(
                        ColumnDef::new(TicketCategories::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(TicketCategories::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(TicketCategories::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(TicketCategories::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TicketSubcategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TicketSubcategories::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TicketSubcategories::CategoryId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TicketSubcategories::Name).string_len(120).not_null())
                    .col(
                        ColumnDef::new(TicketSubcategories::Description)
                            .string_len(400)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(TicketSubcategories::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(TicketSubcategories::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(TicketSubcategories::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(TicketSubcategories::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ticket_subcategories_category_id")
                            .from(TicketSubcategories::Table, TicketSubcategories::CategoryId)
                            .to(TicketCategories::Table, TicketCategories::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ticket_subcategories_unique_name")
                    .table(TicketSubcategories::Table)
                    .col(TicketSubcategories::CategoryId)
                    .col(TicketSubcategories::Name)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TicketSubcategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TicketCategories::Table).to_owned())
            .await
    }
}
