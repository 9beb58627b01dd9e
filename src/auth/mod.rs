//! Bearer-token verification seam.
//!
//! The chat core treats the authenticated principal as an opaque
//! equality-checkable value for session-ownership checks; this module
//! supplies it.

use crate::error::{CineRagError, Result};
use std::collections::HashMap;

/// An authenticated caller identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal(pub String);

impl Principal {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Trait for bearer-token verification.
pub trait Authenticator: Send + Sync {
    /// Verify a bearer token and return the principal it authenticates.
    fn verify(&self, token: &str) -> Result<Principal>;
}

/// Authenticator backed by a static token-to-username map from config.
pub struct StaticTokenAuthenticator {
    tokens: HashMap<String, String>,
}

impl StaticTokenAuthenticator {
    /// Create an authenticator from a token → username map.
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }
}

impl Authenticator for StaticTokenAuthenticator {
    fn verify(&self, token: &str) -> Result<Principal> {
        self.tokens
            .get(token)
            .map(|username| Principal(username.clone()))
            .ok_or_else(|| CineRagError::Auth("invalid bearer token".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_token_yields_principal() {
        let mut tokens = HashMap::new();
        tokens.insert("secret-token".to_string(), "alice".to_string());
        let auth = StaticTokenAuthenticator::new(tokens);

        let principal = auth.verify("secret-token").unwrap();
        assert_eq!(principal.as_str(), "alice");
    }

    #[test]
    fn test_unknown_token_is_auth_error() {
        let auth = StaticTokenAuthenticator::new(HashMap::new());
        let err = auth.verify("nope").unwrap_err();
        assert!(matches!(err, CineRagError::Auth(_)));
        assert_eq!(err.status_code(), 401);
    }
}
