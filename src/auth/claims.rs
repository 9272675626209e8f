use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use super::Role;
use crate::error::GeoError;

/// Claims the backend puts in its session tokens. Unknown claims are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
}

/// Reads the payload segment of a JWT. The signature is not checked here;
/// the backend verifies every request it receives.
pub fn decode_claims(token: &str) -> Result<Claims, GeoError> {
    let payload = token.split('.').nth(1).ok_or(GeoError::InvalidToken)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| GeoError::InvalidToken)?;
    serde_json::from_slice(&bytes).map_err(|_| GeoError::InvalidToken)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub claims: Claims,
}

impl Session {
    pub fn from_token(token: &str) -> Result<Self, GeoError> {
        let token = token.trim();
        let claims = decode_claims(token)?;
        Ok(Self {
            token: token.to_string(),
            claims,
        })
    }

    pub fn role(&self) -> Role {
        Role::parse(self.claims.role.as_deref())
    }

    pub fn user_id(&self) -> Option<&str> {
        self.claims.user_id.as_deref()
    }

    /// Name, else the local part of the email, else a short user id.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.claims.name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        if let Some(local) = self
            .claims
            .email
            .as_deref()
            .and_then(|e| e.split('@').next())
            .filter(|l| !l.is_empty())
        {
            return local.to_string();
        }
        let id: Vec<char> = self.user_id().unwrap_or("").chars().collect();
        let tail: String = id[id.len().saturating_sub(6)..].iter().collect();
        format!("User-{tail}")
    }
}

#[cfg(test)]
pub(crate) fn make_token(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}
