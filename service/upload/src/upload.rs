use std::{fs::File, sync::Arc};

use async_trait::async_trait;
use domain_upload::{
    exception::{UploadException, UploadResult},
    model::{
        entity::{read_range, UploadSession},
        vo::{Action, CreatedResource, QueryParams, Substitutions, TransportRequest, UploadOptions, UploadPlan},
    },
    service::{Provider, UploadService},
};
use typed_builder::TypedBuilder;

use crate::pool::WorkerPool;

/// Chooses between a single request and a multipart upload and drives it to the end.
///
/// Nothing is cleaned up remotely when an upload fails halfway.
#[derive(TypedBuilder)]
pub struct UploadServiceImpl<P> {
    provider: Arc<P>,
    #[builder(default)]
    options: UploadOptions,
}

#[async_trait]
impl<P> UploadService<P::Payload> for UploadServiceImpl<P>
where
    P: Provider + 'static,
{
    #[tracing::instrument(skip_all)]
    async fn upload(
        &self,
        payload: &P::Payload,
        query: &QueryParams,
        file: File,
    ) -> UploadResult<String> {
        let content_length = match self.options.content_length {
            Some(content_length) => content_length,
            None => file.metadata()?.len(),
        };
        let file = Arc::new(file);

        if self.provider.is_multipart(payload)? {
            tracing::info!(content_length, "Starting multipart upload.");
            return self.multipart_upload(payload, query, file, content_length).await;
        }
        let chunk_size = self.options.chunk_size;
        if content_length >= chunk_size {
            return Err(UploadException::ContentTooLargeForSingleRequest {
                content_length,
                chunk_size,
            });
        }
        tracing::info!(content_length, "Starting single part upload.");
        self.single_part_upload(payload, query, file, content_length).await
    }
}

impl<P> UploadServiceImpl<P>
where
    P: Provider + 'static,
{
    async fn create(&self, payload: &P::Payload, query: &QueryParams) -> UploadResult<CreatedResource> {
        let url = self.provider.resolve_url(Action::CreateFile, &Substitutions::new())?;
        let raw = self.provider.create_remote_resource(payload, &url, query).await?;
        let resource = self.provider.extract_create_result(&raw)?;
        tracing::info!(
            internal_id = %resource.internal_id,
            external_id = %resource.external_id,
            "Remote resource created."
        );
        Ok(resource)
    }

    async fn single_part_upload(
        &self,
        payload: &P::Payload,
        query: &QueryParams,
        file: Arc<File>,
        content_length: u64,
    ) -> UploadResult<String> {
        let length = content_length.min(self.options.chunk_size);
        let content = read_range(file, 0, length).await?;

        let resource = self.create(payload, query).await?;
        self.provider
            .transport()
            .send(TransportRequest::put(resource.upload_url.as_str(), content).with_query(query))
            .await?;

        self.provider.wait_until_available(&resource.internal_id).await?;
        Ok(resource.external_id)
    }

    async fn multipart_upload(
        &self,
        payload: &P::Payload,
        query: &QueryParams,
        file: Arc<File>,
        content_length: u64,
    ) -> UploadResult<String> {
        // Plan before creating anything remote, a rejected plan leaves nothing behind.
        let plan = UploadPlan::new(
            content_length,
            self.options.chunk_size,
            self.options.max_concurrency,
        )?;
        let resource = self.create(payload, query).await?;
        tracing::info!(
            parts = plan.part_count(),
            concurrency = plan.max_concurrency(),
            "Uploading parts."
        );

        let session = Arc::new(UploadSession::new(resource, file, content_length));
        let manifest = WorkerPool::new(self.provider.clone())
            .run(session.clone(), &plan)
            .await?;

        let resource = &session.resource;
        self.provider.assemble(&resource.internal_id, &manifest).await?;
        tracing::info!(internal_id = %resource.internal_id, "Parts assembled.");

        self.provider.wait_until_available(&resource.internal_id).await?;
        Ok(resource.external_id.clone())
    }
}
