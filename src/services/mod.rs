pub mod auth;
pub mod bootstrap_admin;
pub mod custom_fields;
pub mod stats;
pub mod taxonomy;
pub mod ticket;
pub mod user;
