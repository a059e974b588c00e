use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

use crate::exception::{UploadException, UploadResult};
use crate::model::vo::{
    Action, AssemblyManifest, AssemblyTag, CreatedResource, QueryParams, Substitutions,
    TransportRequest,
};
use crate::service::PartTransport;

/// # Storage provider
///
/// Everything the upload engine needs to know about one remote storage api.
/// Url layouts and json shapes differ per provider, the contracts don't.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Creation payload of a remote resource.
    type Payload: Serialize + Send + Sync;

    /// Transport shared by every request of this provider.
    fn transport(&self) -> Arc<dyn PartTransport>;

    /// Resolve the url of `action`, replacing `{key}` placeholders by `substitutions`.
    ///
    /// Error when the action is unknown or a placeholder can't be filled.
    fn resolve_url(&self, action: Action, substitutions: &Substitutions) -> UploadResult<String>;

    /// Whether the payload asks for a multipart upload.
    fn is_multipart(&self, payload: &Self::Payload) -> UploadResult<bool>;

    /// Create the remote resource, return the raw response body.
    ///
    /// Only a `201 Created` reply is a success.
    async fn create_remote_resource(
        &self,
        payload: &Self::Payload,
        url: &str,
        query: &QueryParams,
    ) -> UploadResult<Bytes> {
        create_remote_resource(self.transport().as_ref(), payload, url, query).await
    }

    /// Parse the creation response.
    fn extract_create_result(&self, raw: &[u8]) -> UploadResult<CreatedResource>;

    /// Wrap an entity tag into the manifest entry shape of this provider.
    fn build_assembly_tag(&self, etag: &str, part_number: u64) -> AssemblyTag;

    /// Finalize a multipart upload. Called at most once per upload.
    async fn assemble(&self, internal_id: &str, manifest: &AssemblyManifest) -> UploadResult<()>;

    /// Block until the resource is available or its processing failed.
    async fn wait_until_available(&self, internal_id: &str) -> UploadResult<()>;
}

/// POST `payload` as json to `url`, expecting `201 Created`.
pub async fn create_remote_resource<T>(
    transport: &dyn PartTransport,
    payload: &T,
    url: &str,
    query: &QueryParams,
) -> UploadResult<Bytes>
where
    T: Serialize + Sync + ?Sized,
{
    let body = serde_json::to_vec(payload)
        .map_err(|e| UploadException::invalid_payload(e.to_string()))?;
    let response = transport
        .send(TransportRequest::post(url, body).with_query(query))
        .await?;
    if response.status != 201 {
        return Err(UploadException::RequestFailed {
            status: response.status,
            body: response.text(),
        });
    }
    Ok(response.body)
}
