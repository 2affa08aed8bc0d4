//! Bearer token verification.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::errors::ApiError;

/// Verifies a bearer token and returns the user id it was issued for.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify `token`.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The verified user id
    /// * `Err(ApiError)` - The token is invalid, expired or could not be checked
    async fn verify(&self, token: &str) -> Result<String, ApiError>;
}

/// Verifier backed by a fixed token to user id table.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, String>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, uid: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), uid.into());
        self
    }

    /// Parse `"token:uid,token:uid"`. Malformed entries are skipped.
    pub fn parse(table: &str) -> Self {
        table
            .split(',')
            .filter_map(|entry| entry.trim().split_once(':'))
            .filter(|(token, uid)| !token.is_empty() && !uid.is_empty())
            .fold(Self::new(), |verifier, (token, uid)| {
                verifier.with_token(token, uid)
            })
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<String, ApiError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| ApiError::auth("Unknown token"))
    }
}
