use crate::exception::{UploadException, UploadResult};

/// Upper bound of parts a remote store accepts for one upload.
pub const MAX_PART_COUNT: u64 = 1000;

/// How one file is split into parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadPlan {
    content_length: u64,
    chunk_size: u64,
    max_concurrency: usize,
    part_count: u64,
}

impl UploadPlan {
    /// Plan an upload of `content_length` bytes in chunks of `chunk_size`.
    ///
    /// The part count is `content_length / chunk_size + 1`, so an empty file or a file
    /// whose length is a multiple of the chunk size still ends with one (possibly empty)
    /// trailing part.
    ///
    /// Error when the part count exceeds [`MAX_PART_COUNT`].
    pub fn new(content_length: u64, chunk_size: u64, max_concurrency: usize) -> UploadResult<Self> {
        if chunk_size == 0 {
            return Err(UploadException::invalid_payload("chunk size must be positive"));
        }
        let full_chunks = content_length / chunk_size;
        if full_chunks >= MAX_PART_COUNT {
            return Err(UploadException::PlanTooLarge {
                part_count: full_chunks.saturating_add(1),
            });
        }
        let part_count = full_chunks + 1;
        Ok(Self {
            content_length,
            chunk_size,
            max_concurrency: max_concurrency.max(1),
            part_count,
        })
    }

    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn part_count(&self) -> u64 {
        self.part_count
    }

    /// Descriptors of every part, numbered from 1 without gaps.
    pub fn chunks(&self) -> impl Iterator<Item = ChunkDescriptor> + '_ {
        (1..=self.part_count).map(|part_number| {
            let offset = (part_number - 1) * self.chunk_size;
            let end = offset.saturating_add(self.chunk_size).min(self.content_length);
            ChunkDescriptor {
                part_number,
                offset,
                length: end.saturating_sub(offset),
            }
        })
    }
}

/// Byte range of one part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkDescriptor {
    /// 1-based part number.
    pub part_number: u64,
    pub offset: u64,
    pub length: u64,
}
