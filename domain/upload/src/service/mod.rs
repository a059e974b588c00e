mod provider;
mod token;
mod transport;
mod upload;

#[rustfmt::skip]
pub use {
    provider::{create_remote_resource, Provider},
    token::TokenSource,
    transport::PartTransport,
    upload::UploadService,
};
