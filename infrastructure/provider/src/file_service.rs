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

const COMPLETED: &str = "COMPLETED";
const FAILED: &str = "FAILED";
const SPACE_ID: &str = "spaceId";

/// Creation payload of a FileService upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileServicePayload {
    pub name: String,
    pub parent_id: String,
    #[serde(default)]
    pub multipart: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedUpload {
    id: String,
    file_input_upload_details: UploadDetails,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadDetails {
    file_id: String,
    upload: UploadUrl,
}

#[derive(Deserialize)]
struct UploadUrl {
    url: String,
}

#[derive(Deserialize)]
struct UploadEnvelope {
    #[serde(default)]
    result: Option<UploadState>,
}

#[derive(Deserialize)]
struct UploadState {
    #[serde(default)]
    status: Option<String>,
}

#[derive(Serialize)]
struct AssemblyPage<'a> {
    parts: &'a AssemblyManifest,
}

/// Space and folder organized file store.
///
/// Every url lives under a space. Uploads and files have distinct ids, the upload id
/// drives assembly and polling while the file id goes back to the caller.
pub struct FileService {
    transport: Arc<dyn PartTransport>,
    urls: UrlTemplates,
    poller: AvailabilityPoller,
    space_id: Option<String>,
}

impl FileService {
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
                    (Action::CreateFile, "/spaces/{spaceId}/uploads?complete=True"),
                    (
                        Action::GetFile,
                        "/spaces/{spaceId}/files/{fileId}?complete=true&status=active",
                    ),
                    (Action::GetUpload, "/spaces/{spaceId}/uploads/{uploadId}?complete=True"),
                    (
                        Action::AssembleFile,
                        "/spaces/{spaceId}/uploads/{resourceId}?complete=True",
                    ),
                ],
            ),
            poller: AvailabilityPoller::builder()
                .interval(Duration::ZERO)
                .timeout(poll_timeout)
                .build(),
            space_id: None,
        }
    }

    /// Space used whenever a url is resolved without an explicit `spaceId`.
    pub fn cache_space(&mut self, space_id: impl Into<String>) {
        let space_id = space_id.into();
        tracing::debug!(space_id = %space_id, "Caching space.");
        self.space_id = Some(space_id);
    }

    pub fn space_id(&self) -> Option<&str> {
        self.space_id.as_deref()
    }

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

fn availability(response: &TransportResponse) -> UploadResult<Availability> {
    let envelope: UploadEnvelope = response.json()?;
    let status = envelope.result.and_then(|result| result.status);
    Ok(match status.as_deref() {
        Some(COMPLETED) => Availability::Available,
        Some(FAILED) => Availability::Failed(FAILED.to_string()),
        _ => Availability::Pending,
    })
}

#[async_trait]
impl Provider for FileService {
    type Payload = FileServicePayload;

    fn transport(&self) -> Arc<dyn PartTransport> {
        self.transport.clone()
    }

    fn resolve_url(&self, action: Action, substitutions: &Substitutions) -> UploadResult<String> {
        if substitutions.contains_key(SPACE_ID) {
            return self.urls.resolve(action, substitutions);
        }
        let space_id = self
            .space_id
            .as_ref()
            .ok_or_else(|| UploadException::UrlNotResolved {
                action,
                reason: "no space id given and none cached".to_string(),
            })?;
        let mut substitutions = substitutions.clone();
        substitutions.insert(SPACE_ID.to_string(), space_id.clone());
        self.urls.resolve(action, &substitutions)
    }

    fn is_multipart(&self, payload: &FileServicePayload) -> UploadResult<bool> {
        if payload.name.is_empty() {
            return Err(UploadException::invalid_payload("name is empty"));
        }
        Ok(payload.multipart)
    }

    fn extract_create_result(&self, raw: &[u8]) -> UploadResult<CreatedResource> {
        let created: CreatedUpload =
            serde_json::from_slice(raw).map_err(|e| UploadException::extraction("upload", e))?;
        tracing::debug!(
            upload_id = %created.id,
            file_id = %created.file_input_upload_details.file_id,
            "Upload created."
        );
        Ok(CreatedResource {
            internal_id: created.id,
            upload_url: created.file_input_upload_details.upload.url,
            external_id: created.file_input_upload_details.file_id,
        })
    }

    fn build_assembly_tag(&self, etag: &str, part_number: u64) -> AssemblyTag {
        AssemblyTag {
            etag: etag.to_string(),
            part_number,
            style: TagStyle::CamelCase,
        }
    }

    async fn assemble(&self, internal_id: &str, manifest: &AssemblyManifest) -> UploadResult<()> {
        let url = self.resolve_url(
            Action::AssembleFile,
            &substitutions([("resourceId", internal_id)]),
        )?;
        let body = serde_json::to_vec(&AssemblyPage { parts: manifest }).map_err(anyhow::Error::from)?;
        let response = self.transport.send(TransportRequest::patch(url, body)).await?;
        if response.status != 200 {
            return Err(UploadException::AssembleFailed {
                id: internal_id.to_string(),
                status: response.status,
            });
        }
        Ok(())
    }

    async fn wait_until_available(&self, internal_id: &str) -> UploadResult<()> {
        let url = self.resolve_url(Action::GetUpload, &substitutions([("uploadId", internal_id)]))?;
        self.poller
            .wait(self.transport.as_ref(), internal_id, &url, availability)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use bytes::Bytes;
    use domain_upload::{mock::MockPartTransport, model::vo::Method};
    use serde_json::json;

    use super::*;

    const BASE: &str = "https://files.local/api";

    type Log = Arc<Mutex<Vec<TransportRequest>>>;

    /// Answers with `bodies` in turn, repeating the last one.
    fn scripted(status: u16, bodies: Vec<serde_json::Value>) -> (Arc<dyn PartTransport>, Log) {
        let log = Log::default();
        let seen = log.clone();
        let calls = AtomicUsize::new(0);
        let mut transport = MockPartTransport::new();
        transport.expect_send().returning(move |request| {
            seen.lock().unwrap().push(request);
            let n = calls.fetch_add(1, Ordering::SeqCst).min(bodies.len() - 1);
            Ok(TransportResponse {
                status,
                etag: None,
                body: Bytes::from(bodies[n].to_string()),
            })
        });
        (Arc::new(transport), log)
    }

    fn provider(transport: Arc<dyn PartTransport>) -> FileService {
        let mut provider = FileService::new(BASE, transport, Duration::from_secs(5));
        provider.cache_space("s1");
        provider
    }

    #[test]
    fn cached_space_fills_urls() {
        let (transport, _) = scripted(200, vec![json!({})]);
        let provider = provider(transport);
        assert_eq!(provider.space_id(), Some("s1"));
        assert_eq!(
            provider
                .resolve_url(Action::CreateFile, &Substitutions::new())
                .unwrap(),
            format!("{BASE}/spaces/s1/uploads?complete=True")
        );
        assert_eq!(
            provider
                .resolve_url(Action::GetFile, &substitutions([("spaceId", "s2"), ("fileId", "f1")]))
                .unwrap(),
            format!("{BASE}/spaces/s2/files/f1?complete=true&status=active")
        );
    }

    #[test]
    fn missing_space_is_not_resolved() {
        let (transport, _) = scripted(200, vec![json!({})]);
        let provider = FileService::new(BASE, transport, Duration::from_secs(5));
        assert!(matches!(
            provider.resolve_url(Action::CreateFile, &Substitutions::new()),
            Err(UploadException::UrlNotResolved { action: Action::CreateFile, .. })
        ));
    }

    #[test]
    fn payload_is_camel_case() {
        let payload = FileServicePayload {
            name: "a.zip".to_string(),
            parent_id: "p1".to_string(),
            multipart: true,
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({ "name": "a.zip", "parentId": "p1", "multipart": true })
        );
        let (transport, _) = scripted(200, vec![json!({})]);
        let provider = provider(transport);
        assert!(provider.is_multipart(&payload).unwrap());
        let unnamed = FileServicePayload {
            name: String::new(),
            ..payload
        };
        assert!(matches!(
            provider.is_multipart(&unnamed),
            Err(UploadException::InvalidPayload { .. })
        ));
    }

    #[test]
    fn create_result_separates_upload_and_file() {
        let (transport, _) = scripted(200, vec![json!({})]);
        let raw = json!({
            "id": "u1",
            "fileInputUploadDetails": { "fileId": "f1", "upload": { "url": "https://blob/u1/*" } },
        });
        let resource = provider(transport)
            .extract_create_result(raw.to_string().as_bytes())
            .unwrap();
        assert_eq!(resource, CreatedResource {
            internal_id: "u1".to_string(),
            upload_url: "https://blob/u1/*".to_string(),
            external_id: "f1".to_string(),
        });
    }

    #[test]
    fn create_result_without_details_fails() {
        let (transport, _) = scripted(200, vec![json!({})]);
        let raw = json!({ "id": "u1" });
        assert!(matches!(
            provider(transport).extract_create_result(raw.to_string().as_bytes()),
            Err(UploadException::ExtractionFailed { .. })
        ));
    }

    #[tokio::test]
    async fn assemble_patches_camel_case_manifest() {
        let (transport, log) = scripted(200, vec![json!({})]);
        let provider = provider(transport);
        let mut manifest = AssemblyManifest::default();
        manifest.push(provider.build_assembly_tag("e1", 1));
        provider.assemble("u1", &manifest).await.unwrap();

        let requests = log.lock().unwrap();
        assert_eq!(requests[0].method, Method::Patch);
        assert_eq!(requests[0].url, format!("{BASE}/spaces/s1/uploads/u1?complete=True"));
        let body: serde_json::Value =
            serde_json::from_slice(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({ "parts": [{ "etag": "e1", "partNumber": 1 }] }));
    }

    #[tokio::test]
    async fn assemble_requires_ok() {
        let (transport, _) = scripted(201, vec![json!({})]);
        let err = provider(transport)
            .assemble("u1", &AssemblyManifest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, UploadException::AssembleFailed { status: 201, .. }));
    }

    #[tokio::test]
    async fn polls_upload_until_completed() {
        let (transport, log) = scripted(
            200,
            vec![
                json!({ "result": { "status": "IN_PROGRESS" } }),
                json!({}),
                json!({ "result": { "status": "COMPLETED" } }),
            ],
        );
        provider(transport).wait_until_available("u1").await.unwrap();

        let requests = log.lock().unwrap();
        assert_eq!(requests.len(), 3);
        assert!(requests
            .iter()
            .all(|request| request.url == format!("{BASE}/spaces/s1/uploads/u1?complete=True")));
    }

    #[tokio::test]
    async fn failed_upload_stops_polling() {
        let (transport, log) = scripted(200, vec![json!({ "result": { "status": "FAILED" } })]);
        let err = provider(transport).wait_until_available("u1").await.unwrap_err();
        assert!(matches!(err, UploadException::ProcessingFailed { ref status, .. } if status == "FAILED"));
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn back_to_back_polls_last_for_the_timeout() {
        let (transport, log) = scripted(200, vec![json!({ "result": { "status": "IN_PROGRESS" } })]);
        let mut provider = FileService::new(BASE, transport, Duration::from_millis(100));
        provider.cache_space("s1");
        let started = std::time::Instant::now();
        let err = provider.wait_until_available("u1").await.unwrap_err();
        assert!(matches!(err, UploadException::PollTimedOut { .. }));
        assert!(started.elapsed() >= Duration::from_millis(100));
        assert!(log.lock().unwrap().len() > 1);
    }

    #[tokio::test]
    async fn get_file_requires_ok() {
        let (transport, _) = scripted(202, vec![json!({ "id": "f1" })]);
        let err = provider(transport).get_file("f1").await.unwrap_err();
        assert!(matches!(err, UploadException::RequestFailed { status: 202, .. }));
    }

    #[tokio::test]
    async fn get_file_is_space_scoped() {
        let (transport, log) = scripted(200, vec![json!({ "id": "f1" })]);
        provider(transport).get_file("f1").await.unwrap();
        assert_eq!(
            log.lock().unwrap()[0].url,
            format!("{BASE}/spaces/s1/files/f1?complete=true&status=active")
        );
    }
}
