use domain_upload::{
    exception::{UploadException, UploadResult},
    model::vo::{AssemblyManifest, PartOutcome},
};
use tokio_util::sync::CancellationToken;

/// Collects part outcomes into the assembly manifest.
///
/// The first failed outcome cancels the upload and becomes its result.
pub struct ResultAggregator {
    expected: u64,
    outcomes: flume::Receiver<PartOutcome>,
    cancel: CancellationToken,
}

impl ResultAggregator {
    pub fn new(
        expected: u64,
        outcomes: flume::Receiver<PartOutcome>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            expected,
            outcomes,
            cancel,
        }
    }

    pub async fn run(self) -> UploadResult<AssemblyManifest> {
        let mut manifest = AssemblyManifest::with_capacity(self.expected as usize);
        while (manifest.len() as u64) < self.expected {
            let outcome = match self.outcomes.recv_async().await {
                Ok(outcome) => outcome,
                Err(_) => {
                    self.cancel.cancel();
                    return Err(UploadException::IncompleteUpload {
                        expected: self.expected,
                        received: manifest.len() as u64,
                    });
                }
            };
            match outcome.result {
                Ok(tag) => {
                    tracing::debug!(
                        part_number = outcome.part_number,
                        received = manifest.len() + 1,
                        expected = self.expected,
                        "Part uploaded."
                    );
                    manifest.push(tag);
                }
                Err(e) => {
                    tracing::error!(part_number = outcome.part_number, "Part upload failed: {e}");
                    self.cancel.cancel();
                    return Err(e);
                }
            }
        }
        Ok(manifest)
    }
}
