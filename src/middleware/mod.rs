pub mod auth;

pub use auth::{AllowedRoles, AuthUser};
