pub mod auth;
pub mod stats;
pub mod taxonomy;
pub mod tickets;
pub mod users;
