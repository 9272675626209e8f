use crate::fetch::client::HttpClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};

/// An [`HttpClient`] wrapper that injects a credential as an HTTP header.
///
/// The backend expects its shared key in `x-api-key`. An invalid header is
/// rejected once, at construction, instead of on every request.
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    value: HeaderValue,
}

impl<C> ApiKey<C> {
    pub fn new(inner: C, header_name: &str, key: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes())
            .with_context(|| format!("invalid header name '{header_name}'"))?;
        let mut value = HeaderValue::from_str(key)
            .with_context(|| format!("invalid value for header '{header_name}'"))?;
        value.set_sensitive(true);
        Ok(Self {
            inner,
            header_name,
            value,
        })
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header_name.clone(), self.value.clone());
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::fake::CannedClient;
    use crate::fetch::fetch_bytes;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_key_header_is_added() {
        let canned = Arc::new(CannedClient::new().route("/records", 200, "[]"));
        let client = ApiKey::new(canned.clone(), "x-api-key", "s3cret").unwrap();
        fetch_bytes(&client, "http://x.test/records").await.unwrap();
        assert_eq!(canned.requests()[0].header("x-api-key"), Some("s3cret"));
    }

    #[test]
    fn test_invalid_header_value_rejected() {
        assert!(ApiKey::new(CannedClient::new(), "x-api-key", "bad\nkey").is_err());
        assert!(ApiKey::new(CannedClient::new(), "bad header", "key").is_err());
    }
}
