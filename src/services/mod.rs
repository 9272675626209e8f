//! Provider abstractions. The `infra` module holds the HTTP implementations.

pub mod admin_api;
pub mod auth_api;
pub mod country_api;
pub mod records_api;
pub mod weather_api;

pub(crate) mod lenient {
    //! Saved snapshots come from older clients that wrote `"N/A"` where a
    //! number belongs; such values read as absent instead of failing the
    //! whole record list.

    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::String(s) if !s.is_empty() => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }
}
