// ABOUTME: Front door token check: HMAC-SHA256 of the configured check data
// ABOUTME: Tokens travel as lowercase hex in the x-token header

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::parser::AgentConfig;

pub const TOKEN_HEADER: &str = "x-token";

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct TokenVerifier {
    secret: String,
    check_data: String,
}

impl TokenVerifier {
    pub fn new(secret: impl Into<String>, check_data: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            check_data: check_data.into(),
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(config.secret.clone(), config.check_data.clone())
    }

    /// Without a secret no token is ever accepted.
    pub fn is_configured(&self) -> bool {
        !self.secret.is_empty()
    }

    fn mac(&self) -> Option<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes()).ok()?;
        mac.update(self.check_data.as_bytes());
        Some(mac)
    }

    /// The token clients must present.
    pub fn issue(&self) -> Option<String> {
        if !self.is_configured() {
            return None;
        }
        self.mac()
            .map(|mac| hex::encode(mac.finalize().into_bytes()))
    }

    /// Constant-time comparison of a presented token.
    pub fn verify(&self, token: &str) -> bool {
        if !self.is_configured() {
            return false;
        }
        let Ok(provided) = hex::decode(token.trim()) else {
            return false;
        };
        match self.mac() {
            Some(mac) => mac.verify_slice(&provided).is_ok(),
            None => false,
        }
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("configured", &self.is_configured())
            .finish()
    }
}
