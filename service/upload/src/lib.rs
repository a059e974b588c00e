mod aggregator;
mod credential;
mod poller;
mod pool;
mod token;
mod transport;
mod upload;

#[rustfmt::skip]
pub use {
    aggregator::ResultAggregator,
    credential::{Bearer, Credential, CredentialStore},
    poller::AvailabilityPoller,
    pool::WorkerPool,
    token::ClientCredentialsGrant,
    transport::HttpTransport,
    upload::UploadServiceImpl,
};
