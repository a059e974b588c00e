use std::fs::File;
use std::sync::Arc;

use bytes::Bytes;

use crate::exception::UploadResult;
use crate::model::vo::{ChunkDescriptor, CreatedResource};

/// One upload in flight: the remote resource and the local file it is filled from.
///
/// The file is only read at explicit offsets, so the session can be shared by
/// concurrent readers without a lock.
#[derive(Debug)]
pub struct UploadSession {
    pub resource: CreatedResource,
    pub content_length: u64,
    file: Arc<File>,
}

impl UploadSession {
    pub fn new(resource: CreatedResource, file: Arc<File>, content_length: u64) -> Self {
        Self {
            resource,
            content_length,
            file,
        }
    }

    /// Read the byte range of `chunk` without moving any shared cursor.
    pub async fn read_chunk(&self, chunk: ChunkDescriptor) -> UploadResult<Bytes> {
        read_range(self.file.clone(), chunk.offset, chunk.length).await
    }
}

/// Read `length` bytes at `offset` on the blocking pool.
pub async fn read_range(file: Arc<File>, offset: u64, length: u64) -> UploadResult<Bytes> {
    let buffer = tokio::task::spawn_blocking(move || -> std::io::Result<Vec<u8>> {
        let mut buffer = vec![0; length as usize];
        read_exact_at(&file, &mut buffer, offset)?;
        Ok(buffer)
    })
    .await??;
    Ok(Bytes::from(buffer))
}

#[cfg(unix)]
fn read_exact_at(file: &File, buffer: &mut [u8], offset: u64) -> std::io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buffer, offset)
}

#[cfg(windows)]
fn read_exact_at(file: &File, mut buffer: &mut [u8], mut offset: u64) -> std::io::Result<()> {
    use std::io::{Error, ErrorKind};
    use std::os::windows::fs::FileExt;
    while !buffer.is_empty() {
        match file.seek_read(buffer, offset) {
            Ok(0) => return Err(Error::new(ErrorKind::UnexpectedEof, "failed to fill whole buffer")),
            Ok(n) => {
                buffer = &mut buffer[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
