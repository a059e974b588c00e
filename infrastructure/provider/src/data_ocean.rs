use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use domain_upload::{
    exception::{UploadException, UploadResult},
    model::vo::{
        substitutions, Action, AssemblyManifest, AssemblyTag, Availability, CreatedResource,
        Substitutions, TagStyle, TransportRequest, TransportResponse,
    },
    service::{PartTransport, Provider},
};
use serde::{Deserialize, Serialize};
use service_upload::AvailabilityPoller;

use crate::templates::UrlTemplates;

const AVAILABLE: &str = "AVAILABLE";
const PROCESSING_FAILED: &str = "ARCHIVE_PROCESSING_FAILED";

/// Creation payload of a DataOcean file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataOceanPayload {
    pub file: DataOceanFile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataOceanFile {
    pub path: String,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub multipart: bool,
    #[serde(default)]
    pub fileset: bool,
}

#[derive(Deserialize)]
struct FileEnvelope {
    file: FileRecord,
}

#[derive(Deserialize)]
struct FileRecord {
    id: String,
    #[serde(default)]
    upload: Option<UploadRecord>,
}

/// What a poll reads, the store may omit anything but the status.
#[derive(Deserialize)]
struct FileStatusEnvelope {
    #[serde(default)]
    file: Option<FileStatus>,
}

#[derive(Deserialize)]
struct FileStatus {
    #[serde(default)]
    status: Option<String>,
}

#[derive(Deserialize)]
struct UploadRecord {
    url: String,
}

#[derive(Serialize)]
struct AssemblyPage<'a> {
    upload: AssemblyParts<'a>,
}

#[derive(Serialize)]
struct AssemblyParts<'a> {
    parts: &'a AssemblyManifest,
}

/// Path addressed object store with region replication.
///
/// Files are identified by the same id for assembling, polling and the caller.
pub struct DataOcean {
    transport: Arc<dyn PartTransport>,
    urls: UrlTemplates,
    poller: AvailabilityPoller,
}

impl DataOcean {
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn PartTransport>,
        poll_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            urls: UrlTemplates::new(
                base_url,
                [
                    (Action::CreateFile, "/files"),
                    (Action::GetFile, "/files/{fileId}"),
                    (Action::AssembleFile, "/files/{resourceId}/assemble"),
                ],
            ),
            poller: AvailabilityPoller::builder()
                .interval(Duration::from_secs(2))
                .timeout(poll_timeout)
                .build(),
        }
    }

    /// Fetch the file resource as the store reports it. Anything but 200 is an error.
    pub async fn get_file(&self, file_id: &str) -> UploadResult<TransportResponse> {
        let url = self.resolve_url(Action::GetFile, &substitutions([("fileId", file_id)]))?;
        let response = self.transport.send(TransportRequest::get(url)).await?;
        if response.status != 200 {
            return Err(UploadException::RequestFailed {
                status: response.status,
                body: response.text(),
            });
        }
        Ok(response)
    }
}

fn file_of(raw: &[u8]) -> UploadResult<FileRecord> {
    let envelope: FileEnvelope =
        serde_json::from_slice(raw).map_err(|e| UploadException::extraction("file", e))?;
    Ok(envelope.file)
}

fn availability(response: &TransportResponse) -> UploadResult<Availability> {
    let envelope: FileStatusEnvelope = response.json()?;
    let status = envelope.file.and_then(|file| file.status);
    Ok(match status.as_deref() {
        Some(AVAILABLE) => Availability::Available,
        Some(PROCESSING_FAILED) => Availability::Failed(PROCESSING_FAILED.to_string()),
        _ => Availability::Pending,
    })
}

#[async_trait]
impl Provider for DataOcean {
    type Payload = DataOceanPayload;

    fn transport(&self) -> Arc<dyn PartTransport> {
        self.transport.clone()
    }

    fn resolve_url(&self, action: Action, substitutions: &Substitutions) -> UploadResult<String> {
        self.urls.resolve(action, substitutions)
    }

    fn is_multipart(&self, payload: &DataOceanPayload) -> UploadResult<bool> {
        if payload.file.path.is_empty() {
            return Err(UploadException::invalid_payload("file.path is empty"));
        }
        Ok(payload.file.multipart)
    }

    fn extract_create_result(&self, raw: &[u8]) -> UploadResult<CreatedResource> {
        let file = file_of(raw)?;
        let upload = file
            .upload
            .ok_or_else(|| UploadException::extraction("upload url", "no file.upload in response"))?;
        Ok(CreatedResource {
            internal_id: file.id.clone(),
            upload_url: upload.url,
            external_id: file.id,
        })
    }

    fn build_assembly_tag(&self, etag: &str, part_number: u64) -> AssemblyTag {
        AssemblyTag {
            etag: etag.to_string(),
            part_number,
            style: TagStyle::SnakeCase,
        }
    }

    async fn assemble(&self, internal_id: &str, manifest: &AssemblyManifest) -> UploadResult<()> {
        let url = self.resolve_url(
            Action::AssembleFile,
            &substitutions([("resourceId", internal_id)]),
        )?;
        let page = AssemblyPage {
            upload: AssemblyParts { parts: manifest },
        };
        let body = serde_json::to_vec(&page).map_err(anyhow::Error::from)?;
        let response = self.transport.send(TransportRequest::post(url, body)).await?;
        if response.status != 200 {
            return Err(UploadException::AssembleFailed {
                id: internal_id.to_string(),
                status: response.status,
            });
        }
        Ok(())
    }

    async fn wait_until_available(&self, internal_id: &str) -> UploadResult<()> {
        let url = self.resolve_url(Action::GetFile, &substitutions([("fileId", internal_id)]))?;
        self.poller
            .wait(self.transport.as_ref(), internal_id, &url, availability)
            .await
    }
}
