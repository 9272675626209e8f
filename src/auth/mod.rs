//! Sessions and role-based access to the database tools.
//!
//! [`Session`] wraps a backend-issued JWT and the claims decoded from it.
//! [`TokenStore`] persists the token between invocations.
//! [`authorize`] decides what a [`Role`] may do with a [`DbAction`].

mod claims;
mod store;

pub use claims::{Claims, Session, decode_claims};
pub use store::TokenStore;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GeoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    Guest,
}

impl Role {
    /// Unrecognised or missing roles get no privileges.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::to_ascii_lowercase).as_deref() {
            Some("admin") => Role::Admin,
            Some("user") => Role::User,
            _ => Role::Guest,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Guest => "guest",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbAction {
    Backup,
    Restore,
    Export,
    Import,
}

impl fmt::Display for DbAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DbAction::Backup => "backup",
            DbAction::Restore => "restore",
            DbAction::Export => "export",
            DbAction::Import => "import",
        })
    }
}

/// Which data an allowed action touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbScope {
    /// The whole database (`/admin/db/*`).
    Full,
    /// The caller's own records (`/user/db/*`).
    Own,
}

/// | action          | admin | user | guest |
/// |-----------------|-------|------|-------|
/// | backup, restore | full  | -    | -     |
/// | export, import  | full  | own  | -     |
pub fn authorize(role: Role, action: DbAction) -> Result<DbScope, GeoError> {
    match (role, action) {
        (Role::Admin, _) => Ok(DbScope::Full),
        (Role::User, DbAction::Export | DbAction::Import) => Ok(DbScope::Own),
        _ => Err(GeoError::NotPermitted { role, action }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [DbAction; 4] = [
        DbAction::Backup,
        DbAction::Restore,
        DbAction::Export,
        DbAction::Import,
    ];

    #[test]
    fn test_admin_gets_full_scope() {
        for action in ALL {
            assert_eq!(authorize(Role::Admin, action).unwrap(), DbScope::Full);
        }
    }

    #[test]
    fn test_user_limited_to_own_export_import() {
        assert_eq!(authorize(Role::User, DbAction::Export).unwrap(), DbScope::Own);
        assert_eq!(authorize(Role::User, DbAction::Import).unwrap(), DbScope::Own);
        assert!(authorize(Role::User, DbAction::Backup).is_err());
        assert!(authorize(Role::User, DbAction::Restore).is_err());
    }

    #[test]
    fn test_guest_denied_everything() {
        for action in ALL {
            let err = authorize(Role::Guest, action).unwrap_err();
            assert_eq!(err.to_string(), format!("role 'guest' may not {action}"));
        }
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse(Some("ADMIN")), Role::Admin);
        assert_eq!(Role::parse(Some("user")), Role::User);
        assert_eq!(Role::parse(Some("editor")), Role::Guest);
        assert_eq!(Role::parse(None), Role::Guest);
    }
}
