//! HTTP plumbing shared by every provider client.
//!
//! [`HttpClient`] is the transport seam; [`auth`] holds decorators that add
//! credentials to outgoing requests.

mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Request, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::GeoError;

/// Builds a request, attaching `body` as JSON when present.
pub fn build_request<B: Serialize + ?Sized>(
    method: Method,
    url: &str,
    body: Option<&B>,
) -> Result<Request> {
    let url = url
        .parse()
        .with_context(|| format!("invalid request url '{url}'"))?;
    let mut req = Request::new(method, url);
    if let Some(body) = body {
        let bytes = serde_json::to_vec(body)?;
        req.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        *req.body_mut() = Some(bytes.into());
    }
    Ok(req)
}

/// Sends `req` and turns any non-2xx answer into [`GeoError::Status`].
pub async fn execute_checked<C: HttpClient + ?Sized>(client: &C, req: Request) -> Result<Response> {
    let method = req.method().clone();
    let url = req.url().to_string();
    let resp = client.execute(req).await?;
    let status = resp.status();
    debug!(%method, %url, status = status.as_u16(), "HTTP response");

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(GeoError::Status {
            status: status.as_u16(),
            body,
        }
        .into());
    }
    Ok(resp)
}

pub async fn fetch_bytes<C: HttpClient + ?Sized>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = build_request::<()>(Method::GET, url, None)?;
    let resp = execute_checked(client, req).await?;
    Ok(resp.bytes().await?.to_vec())
}

/// GETs `url` and decodes the body as JSON.
pub async fn fetch_json<C, T>(client: &C, url: &str) -> Result<T>
where
    C: HttpClient + ?Sized,
    T: DeserializeOwned,
{
    let bytes = fetch_bytes(client, url).await?;
    serde_json::from_slice(&bytes).with_context(|| format!("invalid JSON from {url}"))
}

#[cfg(test)]
pub(crate) mod fake {
    //! Canned-response transport for client tests.

    use super::HttpClient;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    pub struct Seen {
        pub method: String,
        pub url: String,
        pub headers: Vec<(String, String)>,
        pub body: Option<Vec<u8>>,
    }

    impl Seen {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }
    }

    /// Answers the first route whose fragment occurs in the request URL;
    /// anything else gets a 404.
    #[derive(Default)]
    pub struct CannedClient {
        routes: Vec<(String, u16, String)>,
        pub seen: Mutex<Vec<Seen>>,
    }

    impl CannedClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn route(mut self, fragment: &str, status: u16, body: &str) -> Self {
            self.routes
                .push((fragment.to_string(), status, body.to_string()));
            self
        }

        pub fn requests(&self) -> Vec<Seen> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpClient for CannedClient {
        async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            let url = req.url().to_string();
            self.seen.lock().unwrap().push(Seen {
                method: req.method().to_string(),
                url: url.clone(),
                headers: req
                    .headers()
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
                    .collect(),
                body: req.body().and_then(|b| b.as_bytes()).map(|b| b.to_vec()),
            });

            let (status, body) = self
                .routes
                .iter()
                .find(|(fragment, _, _)| url.contains(fragment.as_str()))
                .map(|(_, status, body)| (*status, body.clone()))
                .unwrap_or((404, "not found".to_string()));

            let resp = http::Response::builder()
                .status(status)
                .body(body)
                .unwrap();
            Ok(reqwest::Response::from(resp))
        }
    }
}
