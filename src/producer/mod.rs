//! Pull-based body producers
//!
//! A producer turns an open file or directory handle into response body bytes,
//! one bounded chunk per `pull`. The runtime side (`http::body`) drives the pulls
//! and calls `release` exactly once when it is done with the producer.

pub mod directory;
pub mod file;

use hyper::body::Bytes;
use std::io;

pub use directory::DirectoryProducer;
pub use file::FileProducer;

/// Result of a single pull
#[derive(Debug)]
pub enum Chunk {
    /// Bytes for this call. May be empty: nothing was available right now, call again.
    Data(Bytes),
    /// All bytes have been emitted
    EndOfStream,
    /// Unrecoverable error mid-stream; the connection must be terminated
    Abort(io::Error),
}

impl Chunk {
    pub const fn empty() -> Self {
        Self::Data(Bytes::new())
    }
}

/// A source of response body chunks bound to one exclusively owned handle.
///
/// Pulls are issued serially, never concurrently, for a single response.
pub trait Producer: Send + 'static {
    /// Produce up to `max_len` bytes starting at byte `offset` of the body.
    fn pull(&mut self, offset: u64, max_len: usize) -> Chunk;

    /// Close the underlying handle. Calling it again is a no-op.
    fn release(&mut self);

    /// Total body length, if known up front.
    fn len(&self) -> Option<u64> {
        None
    }

    /// Smallest `max_len` for which a pull is guaranteed to make progress.
    fn min_chunk(&self) -> usize {
        1
    }
}

pub(crate) fn released_error() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "producer already released")
}

#[cfg(test)]
pub(crate) mod testing {
    //! Handle doubles that count open/close events.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Clone, Default)]
    pub struct HandleCounter {
        opened: Arc<AtomicUsize>,
        closed: Arc<AtomicUsize>,
    }

    impl HandleCounter {
        pub fn open(&self) -> HandleGuard {
            self.opened.fetch_add(1, Ordering::SeqCst);
            HandleGuard {
                closed: Arc::clone(&self.closed),
            }
        }

        pub fn opened(&self) -> usize {
            self.opened.load(Ordering::SeqCst)
        }

        pub fn closed(&self) -> usize {
            self.closed.load(Ordering::SeqCst)
        }
    }

    /// Bumps the close count when dropped
    #[derive(Debug)]
    pub struct HandleGuard {
        closed: Arc<AtomicUsize>,
    }

    impl Drop for HandleGuard {
        fn drop(&mut self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}
