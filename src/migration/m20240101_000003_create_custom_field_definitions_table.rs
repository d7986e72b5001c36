use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum TicketCustomFieldDefinitions {
    Table,
    Id,
    CategoryId,
    SubcategoryId,
    FieldKey,
    Label,
    FieldType,
    Required,
    Placeholder,
    OptionsJson,
    SortOrder,
    IsActive,
    CreatedAt,
    UpdatedAt,
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
                    .table(TicketCustomFieldDefinitions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TicketCustomFieldDefinitions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TicketCustomFieldDefinitions::CategoryId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TicketCustomFieldDefinitions::SubcategoryId)
                            .integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(TicketCustomFieldDefinitions::FieldKey)
                            .string_len(120)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TicketCustomFieldDefinitions::Label)
                            .string_len(120)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TicketCustomFieldDefinitions::FieldType)
                            .string_len(20)
                            .not_null()
                            .check(Expr::col(TicketCustomFieldDefinitions::FieldType).is_in([
                                "text", "number", "select", "date", "checkbox",
                            ])),
                    )
                    .col(
                        ColumnDef::new(TicketCustomFieldDefinitions::Required)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(TicketCustomFieldDefinitions::Placeholder)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(TicketCustomFieldDefinitions::OptionsJson)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(TicketCustomFieldDefinitions::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(TicketCustomFieldDefinitions::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(TicketCustomFieldDefinitions::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(TicketCustomFieldDefinitions::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_custom_field_definitions_category_id")
                            .from(
                                TicketCustomFieldDefinitions::Table,
                                TicketCustomFieldDefinitions::CategoryId,
                            )
                            .to(TicketCategories::Table, TicketCategories::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_custom_field_definitions_subcategory_id")
                            .from(
                                TicketCustomFieldDefinitions::Table,
                                TicketCustomFieldDefinitions::SubcategoryId,
                            )
                            .to(TicketSubcategories::Table, TicketSubcategories::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // NULL subcategory means category-wide; fold it to 0 so the key stays
        // unique across the whole category scope.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_custom_field_definitions_scope_key
                 ON ticket_custom_field_definitions (category_id, COALESCE(subcategory_id, 0), field_key)",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(TicketCustomFieldDefinitions::Table)
                    .to_owned(),
            )
            .await
    }
}
