use serde::{Deserialize, Serialize};

/// Bearer credential obtained from the OTP exchange.
///
/// Created at login and dropped at logout. Authenticated requests read it
/// from the client it was installed on; there is no ambient credential
/// lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    access_token: String,
}

impl Session {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.access_token
    }
}
