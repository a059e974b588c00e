use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use mockall::mock;

use crate::{
    exception::UploadResult,
    model::vo::{
        Action, AssemblyManifest, AssemblyTag, CreatedResource, QueryParams, Substitutions,
        TransportRequest, TransportResponse,
    },
    service::{PartTransport, Provider, TokenSource},
};

mock! {
    pub PartTransport {}
    #[async_trait]
    impl PartTransport for PartTransport {
        async fn send(&self, request: TransportRequest) -> UploadResult<TransportResponse>;
    }
}

mock! {
    pub TokenSource {}
    #[async_trait]
    impl TokenSource for TokenSource {
        async fn fetch(&self) -> UploadResult<String>;
    }
}

mock! {
    pub Provider {}
    #[async_trait]
    impl Provider for Provider {
        type Payload = serde_json::Value;
        fn transport(&self) -> Arc<dyn PartTransport>;
        fn resolve_url(&self, action: Action, substitutions: &Substitutions) -> UploadResult<String>;
        fn is_multipart(&self, payload: &serde_json::Value) -> UploadResult<bool>;
        async fn create_remote_resource(
            &self,
            payload: &serde_json::Value,
            url: &str,
            query: &QueryParams,
        ) -> UploadResult<Bytes>;
        fn extract_create_result(&self, raw: &[u8]) -> UploadResult<CreatedResource>;
        fn build_assembly_tag(&self, etag: &str, part_number: u64) -> AssemblyTag;
        async fn assemble(&self, internal_id: &str, manifest: &AssemblyManifest) -> UploadResult<()>;
        async fn wait_until_available(&self, internal_id: &str) -> UploadResult<()>;
    }
}
