use std::sync::Arc;

use domain_upload::{
    exception::UploadResult,
    model::{
        entity::UploadSession,
        vo::{AssemblyManifest, AssemblyTag, ChunkDescriptor, PartOutcome, TransportRequest, UploadPlan},
    },
    service::Provider,
};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::aggregator::ResultAggregator;

/// Uploads the parts of a plan with a bounded number of concurrent workers.
///
/// Chunk descriptors are handed out through a queue as deep as the worker count, so
/// nothing is read far ahead of the uploads.
pub struct WorkerPool<P> {
    provider: Arc<P>,
}

impl<P> WorkerPool<P>
where
    P: Provider + 'static,
{
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    pub async fn run(
        &self,
        session: Arc<UploadSession>,
        plan: &UploadPlan,
    ) -> UploadResult<AssemblyManifest> {
        let workers = plan.max_concurrency().min(plan.part_count() as usize);
        let cancel = CancellationToken::new();
        let (chunk_tx, chunk_rx) = flume::bounded::<ChunkDescriptor>(workers);
        let (outcome_tx, outcome_rx) = flume::unbounded::<PartOutcome>();

        let aggregator = tokio::spawn(
            ResultAggregator::new(plan.part_count(), outcome_rx, cancel.clone())
                .run()
                .in_current_span(),
        );
        let handles: Vec<_> = (0..workers)
            .map(|worker| {
                let worker_task = Worker {
                    provider: self.provider.clone(),
                    session: session.clone(),
                    chunks: chunk_rx.clone(),
                    outcomes: outcome_tx.clone(),
                    cancel: cancel.clone(),
                };
                tokio::spawn(
                    worker_task
                        .run()
                        .instrument(tracing::debug_span!("upload_worker", worker)),
                )
            })
            .collect();
        drop(chunk_rx);
        drop(outcome_tx);

        for chunk in plan.chunks() {
            tokio::select! {
                _ = cancel.cancelled() => break,
                sent = chunk_tx.send_async(chunk) => if sent.is_err() { break },
            }
        }
        drop(chunk_tx);

        for handle in futures::future::join_all(handles).await {
            if let Err(e) = handle {
                cancel.cancel();
                return Err(e.into());
            }
        }
        aggregator.await?
    }
}

struct Worker<P> {
    provider: Arc<P>,
    session: Arc<UploadSession>,
    chunks: flume::Receiver<ChunkDescriptor>,
    outcomes: flume::Sender<PartOutcome>,
    cancel: CancellationToken,
}

impl<P: Provider> Worker<P> {
    async fn run(self) {
        while let Ok(chunk) = self.chunks.recv_async().await {
            let result = match self.upload(chunk).await {
                Ok(Some(tag)) => Ok(tag),
                Ok(None) => break,
                Err(e) => Err(e),
            };
            let outcome = PartOutcome {
                part_number: chunk.part_number,
                result,
            };
            if self.outcomes.send_async(outcome).await.is_err() {
                break;
            }
        }
    }

    /// Read and PUT one chunk. `None` when the upload was cancelled meanwhile.
    async fn upload(&self, chunk: ChunkDescriptor) -> UploadResult<Option<AssemblyTag>> {
        if self.cancel.is_cancelled() {
            return Ok(None);
        }
        let content = self.session.read_chunk(chunk).await?;
        if self.cancel.is_cancelled() {
            return Ok(None);
        }

        let url = self.session.resource.part_url(chunk.part_number);
        let transport = self.provider.transport();
        let response = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Ok(None),
            response = transport.send(TransportRequest::put(url, content)) => response?,
        };
        let etag = response.entity_tag()?;
        tracing::trace!(part_number = chunk.part_number, etag = %etag, "Part accepted.");
        Ok(Some(self.provider.build_assembly_tag(&etag, chunk.part_number)))
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::Write,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
        time::Duration,
    };

    use async_trait::async_trait;
    use bytes::Bytes;
    use domain_upload::{
        exception::UploadException,
        mock::MockProvider,
        model::vo::{CreatedResource, TagStyle, TransportResponse},
        service::PartTransport,
    };

    use super::*;

    /// Slow PUT endpoint that remembers how many parts were in flight at once.
    #[derive(Default)]
    struct CountingTransport {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        puts: Mutex<Vec<u64>>,
        failing_part: Option<u64>,
    }

    #[async_trait]
    impl PartTransport for CountingTransport {
        async fn send(&self, request: TransportRequest) -> UploadResult<TransportResponse> {
            let part: u64 = request.url.rsplit('/').next().unwrap().parse().unwrap();
            self.puts.lock().unwrap().push(part);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if self.failing_part == Some(part) {
                return Err(UploadException::RequestFailed {
                    status: 500,
                    body: "broken".to_string(),
                });
            }
            Ok(TransportResponse {
                status: 200,
                etag: Some(format!("\"etag-{part}\"")),
                body: Bytes::new(),
            })
        }
    }

    fn pool(transport: Arc<CountingTransport>) -> WorkerPool<MockProvider> {
        let mut provider = MockProvider::new();
        provider
            .expect_transport()
            .returning(move || transport.clone() as Arc<dyn PartTransport>);
        provider
            .expect_build_assembly_tag()
            .returning(|etag, part_number| AssemblyTag {
                etag: etag.to_string(),
                part_number,
                style: TagStyle::SnakeCase,
            });
        WorkerPool::new(Arc::new(provider))
    }

    fn session(len: usize) -> Arc<UploadSession> {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(&vec![7; len]).unwrap();
        let resource = CreatedResource {
            internal_id: "u1".to_string(),
            upload_url: "https://blob/u1/*".to_string(),
            external_id: "f1".to_string(),
        };
        Arc::new(UploadSession::new(resource, Arc::new(file), len as u64))
    }

    #[tokio::test]
    async fn keeps_max_concurrency_parts_in_flight() {
        let transport = Arc::new(CountingTransport::default());
        let plan = UploadPlan::new(19, 1, 3).unwrap();
        assert_eq!(plan.part_count(), 20);

        let manifest = pool(transport.clone())
            .run(session(19), &plan)
            .await
            .unwrap();

        assert_eq!(manifest.len(), 20);
        assert_eq!(transport.peak.load(Ordering::SeqCst), 3);
        let mut puts = transport.puts.lock().unwrap().clone();
        puts.sort_unstable();
        assert_eq!(puts, (1..=20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn failed_part_stops_later_puts() {
        let transport = Arc::new(CountingTransport {
            failing_part: Some(1),
            ..Default::default()
        });
        let plan = UploadPlan::new(49, 1, 1).unwrap();
        assert_eq!(plan.part_count(), 50);

        let err = pool(transport.clone())
            .run(session(49), &plan)
            .await
            .unwrap_err();

        assert!(matches!(err, UploadException::RequestFailed { status: 500, .. }));
        assert_eq!(*transport.puts.lock().unwrap(), vec![1]);
    }
}
