use super::env_flag;

#[derive(Debug, Clone, Copy)]
pub struct AuthConfig {
    /// Whether `POST /auth/register` may create END_USER accounts.
    pub allow_self_registration: bool,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        Self {
            allow_self_registration: env_flag("ALLOW_SELF_REGISTRATION", true),
        }
    }
}
