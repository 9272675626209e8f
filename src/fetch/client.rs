use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes a fully built request.
///
/// Every outbound call in the crate goes through this trait so that auth
/// decorators can be stacked on top of a transport and tests can swap the
/// transport for canned responses.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

#[async_trait]
impl<C: HttpClient + ?Sized> HttpClient for std::sync::Arc<C> {
    async fn execute(&self, req: Request) -> reqwest::Result<Response> {
        (**self).execute(req).await
    }
}
