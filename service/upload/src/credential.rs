use std::sync::Arc;

use domain_upload::{exception::UploadResult, service::TokenSource};
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bearer(String);

impl Bearer {
    /// new by prepending 'Bearer ' before token
    #[inline]
    pub fn new(token: &str) -> Self {
        Self(format!("Bearer {token}"))
    }

    /// return the token part
    #[inline]
    pub fn token(&self) -> &str {
        self.0.split_once(' ').map_or("", |(_, token)| token)
    }

    /// return the token with prefix 'Bearer '
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A bearer token together with the generation it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub bearer: Bearer,
    pub generation: u64,
}

/// Process wide bearer token.
///
/// The first token is fetched lazily. A token is only replaced after a request was
/// rejected with it, and only once per generation, so concurrent rejections share one
/// refresh.
pub struct CredentialStore {
    source: Arc<dyn TokenSource>,
    inner: RwLock<InnerState>,
}

#[derive(Default)]
struct InnerState {
    bearer: Option<Bearer>,
    generation: u64,
}

impl InnerState {
    fn current(&self) -> Option<Credential> {
        self.bearer.clone().map(|bearer| Credential {
            bearer,
            generation: self.generation,
        })
    }
}

impl CredentialStore {
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self {
            source,
            inner: RwLock::new(InnerState::default()),
        }
    }

    /// Start with an already granted token.
    pub fn with_token(source: Arc<dyn TokenSource>, token: &str) -> Self {
        Self {
            source,
            inner: RwLock::new(InnerState {
                bearer: Some(Bearer::new(token)),
                generation: 1,
            }),
        }
    }

    /// Current credential, fetching the first token if there is none yet.
    pub async fn get(&self) -> UploadResult<Credential> {
        if let Some(credential) = self.inner.read().await.current() {
            return Ok(credential);
        }
        let mut inner = self.inner.write().await;
        if let Some(credential) = inner.current() {
            return Ok(credential);
        }
        self.replace(&mut inner).await
    }

    /// Replace the token of generation `rejected`.
    ///
    /// When the store already moved past that generation the newer token is returned
    /// without fetching. `None` means the rejected request carried no token, which
    /// always refreshes.
    pub async fn refresh_rejected(&self, rejected: Option<u64>) -> UploadResult<Credential> {
        let mut inner = self.inner.write().await;
        if let (Some(rejected), Some(credential)) = (rejected, inner.current()) {
            if credential.generation != rejected {
                return Ok(credential);
            }
        }
        self.replace(&mut inner).await
    }

    async fn replace(&self, inner: &mut InnerState) -> UploadResult<Credential> {
        let token = self.source.fetch().await?;
        inner.bearer = Some(Bearer::new(&token));
        inner.generation += 1;
        tracing::debug!(generation = inner.generation, "Bearer token refreshed.");
        Ok(Credential {
            bearer: Bearer::new(&token),
            generation: inner.generation,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use domain_upload::{exception::UploadException, mock::MockTokenSource};

    use super::*;

    fn counting_source() -> (Arc<dyn TokenSource>, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let mut source = MockTokenSource::new();
        let counter = count.clone();
        source.expect_fetch().returning(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("token-{n}"))
        });
        (Arc::new(source), count)
    }

    #[test]
    fn bearer_parts() {
        let bearer = Bearer::new("abc");
        assert_eq!(bearer.as_str(), "Bearer abc");
        assert_eq!(bearer.token(), "abc");
    }

    #[tokio::test]
    async fn first_token_is_fetched_lazily_once() {
        let (source, count) = counting_source();
        let store = CredentialStore::new(source);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        let first = store.get().await.unwrap();
        let second = store.get().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.bearer.token(), "token-1");
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_rejection_reuses_newer_token() {
        let (source, count) = counting_source();
        let store = CredentialStore::with_token(source, "initial");
        let refreshed = store.refresh_rejected(Some(1)).await.unwrap();
        assert_eq!(refreshed.generation, 2);
        let again = store.refresh_rejected(Some(1)).await.unwrap();
        assert_eq!(again, refreshed);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_rejections_refresh_once() {
        let (source, count) = counting_source();
        let store = Arc::new(CredentialStore::with_token(source, "initial"));
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.refresh_rejected(Some(1)).await.unwrap() })
            })
            .collect();
        for task in tasks {
            assert_eq!(task.await.unwrap().bearer.token(), "token-1");
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unauthenticated_rejection_always_refreshes() {
        let (source, count) = counting_source();
        let store = CredentialStore::with_token(source, "initial");
        store.refresh_rejected(None).await.unwrap();
        store.refresh_rejected(None).await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn fetch_failure_is_propagated() {
        let mut source = MockTokenSource::new();
        source.expect_fetch().returning(|| {
            Err(UploadException::RequestFailed {
                status: 400,
                body: "invalid_client".to_string(),
            })
        });
        let store = CredentialStore::new(Arc::new(source));
        assert!(matches!(
            store.get().await,
            Err(UploadException::RequestFailed { status: 400, .. })
        ));
    }
}
