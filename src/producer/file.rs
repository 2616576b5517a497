//! File-backed producer
//!
//! Every pull seeks to the requested offset and copies up to `max_len` bytes.

use super::{released_error, Chunk, Producer};
use crate::error::{ServeError, ServeResult};
use hyper::body::Bytes;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

pub struct FileProducer<R = File> {
    handle: Option<R>,
    size: u64,
}

impl FileProducer<File> {
    /// Open `path` for streaming. Any failure is reported as not found.
    pub fn open(path: &Path) -> ServeResult<Self> {
        let not_found = |_| ServeError::NotFound(path.to_path_buf());
        let file = File::open(path).map_err(not_found)?;
        let size = file.metadata().map_err(not_found)?.len();
        Ok(Self::new(file, size))
    }
}

impl<R> FileProducer<R>
where
    R: Read + Seek,
{
    pub const fn new(handle: R, size: u64) -> Self {
        Self {
            handle: Some(handle),
            size,
        }
    }

    pub const fn size(&self) -> u64 {
        self.size
    }

    pub const fn is_open(&self) -> bool {
        self.handle.is_some()
    }
}

impl<R> Producer for FileProducer<R>
where
    R: Read + Seek + Send + 'static,
{
    fn pull(&mut self, offset: u64, max_len: usize) -> Chunk {
        let Some(reader) = self.handle.as_mut() else {
            return Chunk::Abort(released_error());
        };
        if max_len == 0 {
            return Chunk::empty();
        }
        if let Err(e) = reader.seek(SeekFrom::Start(offset)) {
            return Chunk::Abort(e);
        }

        let mut buf = vec![0u8; max_len];
        match read_some(reader, &mut buf) {
            Ok(0) => Chunk::EndOfStream,
            Ok(n) => {
                buf.truncate(n);
                Chunk::Data(Bytes::from(buf))
            }
            Err(e) => Chunk::Abort(e),
        }
    }

    fn release(&mut self) {
        // Dropping the handle closes it
        self.handle.take();
    }

    fn len(&self) -> Option<u64> {
        Some(self.size)
    }
}

impl<R> Drop for FileProducer<R> {
    fn drop(&mut self) {
        self.handle.take();
    }
}

/// A single read, retried only when interrupted by a signal
fn read_some<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            result => return result,
        }
    }
}
