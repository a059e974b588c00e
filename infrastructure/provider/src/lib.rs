mod data_ocean;
mod file_service;
mod templates;

#[rustfmt::skip]
pub use {
    data_ocean::{DataOcean, DataOceanFile, DataOceanPayload},
    file_service::{FileService, FileServicePayload},
    templates::UrlTemplates,
};
