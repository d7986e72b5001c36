pub mod jwt;
pub mod password;
pub mod patch;

pub use jwt::encode_token;
pub use password::{hash_password, verify_password};
pub use patch::{double_option, trimmed, trimmed_option};
