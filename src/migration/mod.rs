use sea_orm_migration::prelude::*;

mod m20240101_000001_create_users_table;
mod m20240101_000002_create_ticket_categories_table;
mod m20240101_000003_create_custom_field_definitions_table;
mod m20240101_000004_create_tickets_table;
mod m20240101_000005_create_custom_field_values_table;
mod m20240101_000006_create_ticket_notes_table;
mod m20240101_000007_create_ticket_history_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users_table::Migration),
            Box::new(m20240101_000002_create_ticket_categories_table::Migration),
            Box::new(m20240101_000003_create_custom_field_definitions_table::Migration),
            Box::new(m20240101_000004_create_tickets_table::Migration),
            Box::new(m20240101_000005_create_custom_field_values_table::Migration),
            Box::new(m20240101_000006_create_ticket_notes_table::Migration),
            Box::new(m20240101_000007_create_ticket_history_table::Migration),
        ]
    }
}
