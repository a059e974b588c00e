use async_trait::async_trait;

use crate::exception::UploadResult;

/// Where bearer tokens come from.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Fetch a fresh access token.
    async fn fetch(&self) -> UploadResult<String>;
}
