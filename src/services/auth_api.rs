//! Backend account endpoints.

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    /// Returns the session token for an existing account.
    async fn login(&self, credentials: &Credentials) -> Result<String>;

    /// Creates an account and returns its first session token.
    async fn register(&self, credentials: &Credentials) -> Result<String>;
}
