use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Method, Request, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::airquality::Normalizer;
use crate::auth::DbScope;
use crate::fetch::{HttpClient, build_request, execute_checked};
use crate::services::admin_api::{AdminApi, RestoreTarget};
use crate::services::auth_api::{AuthApi, Credentials, TokenResponse};
use crate::services::records_api::{
    AirQualityComparison, AirQualityQuery, AirQualityReport, HistoryPoint, RecordsApi,
    SavedRecord, Snapshot, UserStats,
};

/// Client for the GeoInsight backend REST API.
///
/// The transport is expected to carry the shared `x-api-key` already (see
/// [`crate::fetch::auth::ApiKey`]); the session token, when there is one, is
/// added per request as `Authorization: Bearer`.
pub struct BackendClient<C> {
    http: C,
    base_url: String,
    token: Option<String>,
}

impl<C: HttpClient> BackendClient<C> {
    pub fn new(http: C, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn url_with(&self, path: &str, pairs: &[(&str, String)]) -> Result<Url> {
        let mut url: Url = self
            .url(path)
            .parse()
            .with_context(|| format!("invalid backend url {}", self.base_url))?;
        if !pairs.is_empty() {
            let mut query = url.query_pairs_mut();
            for (k, v) in pairs {
                query.append_pair(k, v);
            }
        }
        Ok(url)
    }

    /// `prefix` followed by `segment` as one percent-encoded path segment.
    fn url_segment(&self, prefix: &str, segment: &str) -> Result<Url> {
        let mut url: Url = self
            .url(prefix)
            .parse()
            .with_context(|| format!("invalid backend url {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("invalid backend url {}", self.base_url))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    fn authorize(&self, mut req: Request) -> Result<Request> {
        if let Some(token) = &self.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .context("session token is not a valid header value")?;
            value.set_sensitive(true);
            req.headers_mut().insert(AUTHORIZATION, value);
        }
        Ok(req)
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<Response> {
        let req = self.authorize(build_request(method, url, body)?)?;
        execute_checked(&self.http, req).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self.send::<()>(Method::GET, url, None).await?;
        Ok(resp.json().await?)
    }

    /// POSTs and returns the JSON answer, or `null` for an empty body.
    async fn post_json<B: Serialize + ?Sized>(&self, url: &str, body: Option<&B>) -> Result<Value> {
        let resp = self.send(Method::POST, url, body).await?;
        let bytes = resp.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn obtain_token(&self, path: &str, credentials: &Credentials) -> Result<String> {
        let resp = self
            .send(Method::POST, &self.url(path), Some(credentials))
            .await?;
        let body: TokenResponse = resp.json().await.context("token missing from response")?;
        Ok(body.token)
    }
}

fn db_prefix(scope: DbScope) -> &'static str {
    match scope {
        DbScope::Full => "/admin/db",
        DbScope::Own => "/user/db",
    }
}

#[async_trait]
impl<C: HttpClient> RecordsApi for BackendClient<C> {
    #[tracing::instrument(skip(self))]
    async fn air_quality(&self, query: &AirQualityQuery) -> Result<AirQualityReport> {
        let url = self.url_with("/records/geo/airquality", &query.pairs())?;
        let payload: Value = self.get_json(url.as_str()).await?;

        let label = query.city.clone().unwrap_or_default();
        let measurements = Normalizer::new().fallback_label(&label).normalize(&payload);
        let fallback = payload["fallback"].as_bool().unwrap_or(false);
        debug!(count = measurements.len(), fallback, "Air quality normalized");
        Ok(AirQualityReport {
            measurements,
            fallback,
        })
    }

    async fn list_records(&self) -> Result<Vec<SavedRecord>> {
        let payload: Value = self.get_json(&self.url("/records")).await?;
        match payload {
            Value::Null => Ok(Vec::new()),
            other => Ok(serde_json::from_value(other).context("unexpected records payload")?),
        }
    }

    #[tracing::instrument(skip(self, snapshot), fields(country = %snapshot.country))]
    async fn save_record(&self, snapshot: &Snapshot) -> Result<Value> {
        self.post_json(&self.url("/records"), Some(snapshot)).await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_record(&self, id: &str) -> Result<()> {
        let url = self.url_segment("/records/", id)?;
        self.send::<()>(Method::DELETE, url.as_str(), None).await?;
        Ok(())
    }

    async fn stats(&self) -> Result<UserStats> {
        self.get_json(&self.url("/records/stats")).await
    }

    #[tracing::instrument(skip(self))]
    async fn history(&self, location: &str, days: u32) -> Result<Vec<HistoryPoint>> {
        let mut url = self.url_segment("/records/history/", location)?;
        url.query_pairs_mut().append_pair("days", &days.to_string());
        self.get_json(url.as_str()).await
    }

    #[tracing::instrument(skip(self))]
    async fn compare_air_quality(&self, days: u32) -> Result<Vec<AirQualityComparison>> {
        let url = self.url_with("/records/compare-airquality", &[("days", days.to_string())])?;
        self.get_json(url.as_str()).await
    }
}

#[async_trait]
impl<C: HttpClient> AdminApi for BackendClient<C> {
    #[tracing::instrument(skip(self))]
    async fn backup(&self) -> Result<Value> {
        self.post_json::<()>(&self.url("/admin/db/backup"), None).await
    }

    #[tracing::instrument(skip(self))]
    async fn restore(&self, target: &RestoreTarget) -> Result<Value> {
        let id = match target {
            RestoreTarget::Latest => "latest",
            RestoreTarget::Backup(id) => id.as_str(),
        };
        let url = self.url_segment("/admin/db/restore/", id)?;
        self.post_json::<()>(url.as_str(), None).await
    }

    #[tracing::instrument(skip(self))]
    async fn export(&self, scope: DbScope) -> Result<Vec<u8>> {
        let url = self.url(&format!("{}/export", db_prefix(scope)));
        let resp = self.send::<()>(Method::GET, &url, None).await?;
        Ok(resp.bytes().await?.to_vec())
    }

    #[tracing::instrument(skip(self, contents), fields(bytes = contents.len()))]
    async fn import(&self, scope: DbScope, file_name: &str, contents: Vec<u8>) -> Result<Value> {
        let url = self.url(&format!("{}/import", db_prefix(scope)));
        let part = reqwest::multipart::Part::bytes(contents)
            .file_name(file_name.to_string())
            .mime_str("application/json")?;
        let form = reqwest::multipart::Form::new().part("file", part);

        // The multipart encoder only lives on RequestBuilder.
        let req = reqwest::Client::new().post(&url).multipart(form).build()?;
        let resp = execute_checked(&self.http, self.authorize(req)?).await?;
        let bytes = resp.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl<C: HttpClient> AuthApi for BackendClient<C> {
    async fn login(&self, credentials: &Credentials) -> Result<String> {
        self.obtain_token("/auth/login", credentials).await
    }

    async fn register(&self, credentials: &Credentials) -> Result<String> {
        self.obtain_token("/auth/register", credentials).await
    }
}
