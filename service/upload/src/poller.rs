use std::time::Duration;

use domain_upload::{
    exception::{UploadException, UploadResult},
    model::vo::{Availability, TransportRequest, TransportResponse},
    service::PartTransport,
};
use tokio::time::Instant;
use typed_builder::TypedBuilder;

/// Polls a resource until it leaves the pending state.
///
/// `Pending -> Available | Failed`. Any status but 200 ends the wait with an error, and so
/// does a resource still pending once `timeout` has passed.
#[derive(Debug, Clone, TypedBuilder)]
pub struct AvailabilityPoller {
    /// Pause before every poll, zero polls back to back.
    #[builder(default = Duration::from_secs(2))]
    interval: Duration,
    /// How long a resource may stay pending.
    timeout: Duration,
}

impl AvailabilityPoller {
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET `url` until `classify` reports a terminal state for resource `id`.
    pub async fn wait<F>(
        &self,
        transport: &dyn PartTransport,
        id: &str,
        url: &str,
        classify: F,
    ) -> UploadResult<()>
    where
        F: Fn(&TransportResponse) -> UploadResult<Availability> + Send + Sync,
    {
        let deadline = Instant::now() + self.timeout;
        let mut attempt: u64 = 0;
        loop {
            if self.interval.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(self.interval).await;
            }
            attempt += 1;
            let response = transport.send(TransportRequest::get(url)).await?;
            if response.status != 200 {
                return Err(UploadException::RequestFailed {
                    status: response.status,
                    body: response.text(),
                });
            }
            match classify(&response)? {
                Availability::Available => {
                    tracing::info!(id, attempt, "Resource is available.");
                    return Ok(());
                }
                Availability::Failed(status) => {
                    return Err(UploadException::ProcessingFailed {
                        id: id.to_owned(),
                        status,
                    });
                }
                Availability::Pending => tracing::debug!(id, attempt, "Resource is pending."),
            }
            if Instant::now() >= deadline {
                return Err(UploadException::PollTimedOut {
                    id: id.to_owned(),
                    timeout: self.timeout,
                });
            }
        }
    }
}
