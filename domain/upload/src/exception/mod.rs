use crate::model::vo::{Action, MAX_PART_COUNT};

pub type UploadResult<T> = Result<T, UploadException>;

#[derive(Debug, thiserror::Error)]
pub enum UploadException {
    #[error("The upload needs {part_count} parts, more than the allowed {}, use a larger chunk size.", MAX_PART_COUNT)]
    PlanTooLarge { part_count: u64 },

    #[error("Content length {content_length} is not less than chunk size {chunk_size}, it can't be sent in a single request.")]
    ContentTooLargeForSingleRequest { content_length: u64, chunk_size: u64 },

    #[error("Invalid payload: {reason}")]
    InvalidPayload { reason: String },

    #[error("Failed to extract {what} from the provider response: {reason}")]
    ExtractionFailed { what: &'static str, reason: String },

    #[error("Url for action {action} can't be resolved: {reason}")]
    UrlNotResolved { action: Action, reason: String },

    #[error("Request failed with status: {status}, response: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Request is still unauthorized after refreshing the bearer token.")]
    AuthFailed,

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Local file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Assemble request for resource {id} failed with status: {status}")]
    AssembleFailed { id: String, status: u16 },

    #[error("Processing of resource {id} failed with status: {status}")]
    ProcessingFailed { id: String, status: String },

    #[error("Resource {id} is still pending after {timeout:?}.")]
    PollTimedOut { id: String, timeout: std::time::Duration },

    #[error("Only {received} of {expected} part outcomes were reported.")]
    IncompleteUpload { expected: u64, received: u64 },

    #[error("Upload internal error: {source}")]
    InternalError {
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for UploadException {
    fn from(e: anyhow::Error) -> Self {
        UploadException::InternalError { source: e }
    }
}

impl From<tokio::task::JoinError> for UploadException {
    fn from(e: tokio::task::JoinError) -> Self {
        UploadException::InternalError { source: e.into() }
    }
}

impl UploadException {
    pub fn extraction(what: &'static str, reason: impl ToString) -> Self {
        Self::ExtractionFailed {
            what,
            reason: reason.to_string(),
        }
    }

    pub fn invalid_payload(reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            reason: reason.into(),
        }
    }
}
