use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum TicketCustomFieldValues {
    Table,
    Id,
    TicketId,
    FieldDefinitionId,
    ValueText,
    ValueJson,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Tickets {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum TicketCustomFieldDefinitions {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TicketCustomFieldValues::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TicketCustomFieldValues::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TicketCustomFieldValues::TicketId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TicketCustomFieldValues::FieldDefinitionId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TicketCustomFieldValues::ValueText)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TicketCustomFieldValues::ValueJson)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TicketCustomFieldValues::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_custom_field_values_ticket_id")
                            .from(
                                TicketCustomFieldValues::Table,
                                TicketCustomFieldValues::TicketId,
                            )
                            .to(Tickets::Table, Tickets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_custom_field_values_definition_id")
                            .from(
                                TicketCustomFieldValues::Table,
                                TicketCustomFieldValues::FieldDefinitionId,
                            )
                            .to(
                                TicketCustomFieldDefinitions::Table,
                                TicketCustomFieldDefinitions::Id,
                            )
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_custom_field_values_unique")
                    .table(TicketCustomFieldValues::Table)
                    .col(TicketCustomFieldValues::TicketId)
                    .col(TicketCustomFieldValues::FieldDefinitionId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(TicketCustomFieldValues::Table)
                    .to_owned(),
            )
            .await
    }
}
