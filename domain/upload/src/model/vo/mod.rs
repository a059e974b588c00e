mod options;
mod part;
mod plan;
mod resource;
mod transport;

#[rustfmt::skip]
pub use {
    options::{default_max_concurrency, UploadOptions, DEFAULT_CHUNK_SIZE},
    part::{AssemblyManifest, AssemblyTag, PartOutcome, TagStyle},
    plan::{ChunkDescriptor, UploadPlan, MAX_PART_COUNT},
    resource::{substitutions, Action, Availability, CreatedResource, Substitutions, PART_NUMBER_PLACEHOLDER},
    transport::{Method, QueryParams, TransportRequest, TransportResponse},
};
