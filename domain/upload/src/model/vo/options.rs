use typed_builder::TypedBuilder;

/// 50 MiB.
pub const DEFAULT_CHUNK_SIZE: u64 = 50 * 1024 * 1024;

/// Twice the available parallelism.
pub fn default_max_concurrency() -> usize {
    2 * std::thread::available_parallelism()
        .map(usize::from)
        .unwrap_or(1)
}

#[derive(Debug, Clone, TypedBuilder)]
pub struct UploadOptions {
    #[builder(default = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: u64,
    #[builder(default = default_max_concurrency())]
    pub max_concurrency: usize,
    /// Length of the content to upload, taken from the file metadata when absent.
    #[builder(default, setter(strip_option))]
    pub content_length: Option<u64>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = UploadOptions::default();
        assert_eq!(options.chunk_size, 50 * 1024 * 1024);
        assert!(options.max_concurrency >= 2);
        assert_eq!(options.max_concurrency % 2, 0);
        assert!(options.content_length.is_none());
    }
}
