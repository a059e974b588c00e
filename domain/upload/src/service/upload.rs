use std::fs::File;

use async_trait::async_trait;

use crate::exception::UploadResult;
use crate::model::vo::QueryParams;

/// # Upload service
///
/// Uploads a local file to a provider, in one request or in concurrent parts.
#[async_trait]
pub trait UploadService<P>: Send + Sync
where
    P: Send + Sync,
{
    /// Upload `file` as the resource described by `payload`.
    ///
    /// Return the external id of the resource once it is available.
    async fn upload(&self, payload: &P, query: &QueryParams, file: File) -> UploadResult<String>;
}
