use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes prepared requests. Lets the HTTP transport be swapped out
/// (or wrapped) without touching the dataset loaders.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
