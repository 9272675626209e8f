//! Database backup, restore, export and import.

use anyhow::Result;
use serde_json::Value;

use crate::auth::DbScope;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreTarget {
    Latest,
    Backup(String),
}

#[async_trait::async_trait]
pub trait AdminApi: Send + Sync {
    async fn backup(&self) -> Result<Value>;

    async fn restore(&self, target: &RestoreTarget) -> Result<Value>;

    /// Raw JSON dump of the database (`Full`) or of the caller's records (`Own`).
    async fn export(&self, scope: DbScope) -> Result<Vec<u8>>;

    async fn import(&self, scope: DbScope, file_name: &str, contents: Vec<u8>) -> Result<Value>;
}
