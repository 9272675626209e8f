//! Typed failures the CLI branches on. Everything else travels as
//! [`anyhow::Error`].

use thiserror::Error;

use crate::auth::{DbAction, Role};

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("not logged in")]
    NotAuthenticated,

    #[error("role '{role}' may not {action}")]
    NotPermitted { role: Role, action: DbAction },

    #[error("please select a country")]
    MissingCountry,

    #[error("country details not found for '{0}'")]
    CountryNotFound(String),

    #[error("invalid session token")]
    InvalidToken,

    #[error("only .json files can be imported, got '{0}'")]
    UnsupportedImport(String),
}
