use std::{fs::File, sync::Arc, time::Duration};

use anyhow::Context;
use domain_upload::{
    model::vo::{QueryParams, UploadOptions},
    service::{PartTransport, Provider, UploadService},
};
use infrastructure_provider::{DataOcean, DataOceanPayload, FileService, FileServicePayload};
use service_upload::{ClientCredentialsGrant, CredentialStore, HttpTransport, UploadServiceImpl};

use crate::config::{AppConfig, ProviderKind};

/// Upload the configured file, returning the id the provider assigned to it.
pub async fn run(config: &AppConfig) -> anyhow::Result<String> {
    let grant = ClientCredentialsGrant::builder()
        .token_url(config.auth.token_url.as_str())
        .client_id(config.auth.client_id.as_str())
        .client_secret(config.auth.client_secret.as_str())
        .scope(config.auth.scope.as_str())
        .build();
    let transport: Arc<dyn PartTransport> = Arc::new(
        HttpTransport::builder()
            .credentials(Arc::new(CredentialStore::new(Arc::new(grant))))
            .build(),
    );
    let file = File::open(&config.job.file)
        .with_context(|| format!("Failed to open {}", config.job.file.display()))?;
    let options = UploadOptions::builder()
        .chunk_size(config.upload.chunk_size)
        .max_concurrency(config.upload.max_concurrency)
        .build();
    let provider = &config.provider;
    let poll_timeout = Duration::from_secs(config.upload.poll_timeout_secs);

    match provider.kind {
        ProviderKind::DataOcean => {
            let payload: DataOceanPayload = parse_payload(&config.job.payload)?;
            let data_ocean = DataOcean::new(&provider.base_url, transport, poll_timeout);
            upload(data_ocean, &payload, &config.job.query, options, file).await
        }
        ProviderKind::FileService => {
            let payload: FileServicePayload = parse_payload(&config.job.payload)?;
            let mut file_service = FileService::new(&provider.base_url, transport, poll_timeout);
            if let Some(space_id) = &provider.space_id {
                file_service.cache_space(space_id.as_str());
            }
            upload(file_service, &payload, &config.job.query, options, file).await
        }
    }
}

fn parse_payload<T: serde::de::DeserializeOwned>(payload: &str) -> anyhow::Result<T> {
    serde_json::from_str(payload).context("Job payload doesn't match the provider")
}

async fn upload<P>(
    provider: P,
    payload: &P::Payload,
    query: &QueryParams,
    options: UploadOptions,
    file: File,
) -> anyhow::Result<String>
where
    P: Provider + 'static,
{
    let service = UploadServiceImpl::builder()
        .provider(Arc::new(provider))
        .options(options)
        .build();
    Ok(service.upload(payload, query, file).await?)
}
