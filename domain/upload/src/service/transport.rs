use async_trait::async_trait;

use crate::exception::UploadResult;
use crate::model::vo::{TransportRequest, TransportResponse};

/// # Part transport
///
/// Executes one authenticated http request and classifies the outcome.
#[async_trait]
pub trait PartTransport: Send + Sync {
    /// Send `request`.
    ///
    /// Only 200, 201 and 202 are accepted, any other status is a
    /// [`RequestFailed`](crate::exception::UploadException::RequestFailed).
    /// A request rejected as unauthenticated is retried once with a refreshed
    /// token; a second rejection is [`AuthFailed`](crate::exception::UploadException::AuthFailed).
    async fn send(&self, request: TransportRequest) -> UploadResult<TransportResponse>;
}
