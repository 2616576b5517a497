//! Streaming body driven by a producer
//!
//! `ProducerBody` is the runtime half of the producer protocol. Each time hyper
//! asks for a frame, one pull runs on the blocking pool with an advancing offset.
//! Between pulls the producer sits idle inside the body, so a client that stops
//! reading holds no thread. Whatever ends the stream (end-of-stream, abort, or
//! hyper dropping the body because the client went away) the producer is
//! released exactly once.

use crate::error::ServeError;
use crate::logger;
use crate::producer::{Chunk, Producer};
use hyper::body::{Body, Bytes, Frame, SizeHint};
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::task::JoinHandle;

/// Owns a producer and releases it when dropped
struct Lease<P: Producer>(P);

impl<P: Producer> Drop for Lease<P> {
    fn drop(&mut self) {
        self.0.release();
    }
}

enum State<P: Producer> {
    Idle(Lease<P>),
    /// A pull is running on the blocking pool; the lease travels with it
    Pulling(JoinHandle<(Lease<P>, Chunk)>),
    Done,
}

pub struct ProducerBody<P: Producer> {
    state: State<P>,
    offset: u64,
    chunk_size: usize,
    len: Option<u64>,
}

// The state is never pinned structurally
impl<P: Producer> Unpin for ProducerBody<P> {}

impl<P: Producer> ProducerBody<P> {
    /// Stream `producer` in chunks of at most `chunk_size` bytes.
    ///
    /// The chunk size is raised to the producer's minimum if it is smaller.
    pub fn new(producer: P, chunk_size: usize) -> Self {
        let len = producer.len();
        let chunk_size = chunk_size.max(producer.min_chunk());
        Self {
            state: State::Idle(Lease(producer)),
            offset: 0,
            chunk_size,
            len,
        }
    }

    fn start_pull(&mut self, mut lease: Lease<P>) {
        let (offset, max_len) = (self.offset, self.chunk_size);
        self.state = State::Pulling(tokio::task::spawn_blocking(move || {
            let chunk = lease.0.pull(offset, max_len);
            (lease, chunk)
        }));
    }
}

impl<P: Producer> Body for ProducerBody<P> {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        loop {
            match std::mem::replace(&mut this.state, State::Done) {
                State::Done => return Poll::Ready(None),
                State::Idle(lease) => this.start_pull(lease),
                State::Pulling(mut handle) => {
                    let joined = match Pin::new(&mut handle).poll(cx) {
                        Poll::Pending => {
                            this.state = State::Pulling(handle);
                            return Poll::Pending;
                        }
                        Poll::Ready(joined) => joined,
                    };
                    let (lease, chunk) = match joined {
                        Ok(pulled) => pulled,
                        Err(e) => {
                            // The lease was dropped, and so released, while unwinding
                            logger::log_error(&format!("Producer pull failed: {e}"));
                            return Poll::Ready(Some(Err(io::Error::other(e))));
                        }
                    };
                    match chunk {
                        // Nothing this time; pull again
                        Chunk::Data(bytes) if bytes.is_empty() => this.start_pull(lease),
                        Chunk::Data(bytes) => {
                            this.offset += bytes.len() as u64;
                            this.state = State::Idle(lease);
                            return Poll::Ready(Some(Ok(Frame::data(bytes))));
                        }
                        Chunk::EndOfStream => return Poll::Ready(None),
                        Chunk::Abort(err) => {
                            let kind = err.kind();
                            logger::log_error(&ServeError::StreamAbort(err).to_string());
                            drop(lease);
                            return Poll::Ready(Some(Err(io::Error::new(
                                kind,
                                "response stream aborted",
                            ))));
                        }
                    }
                }
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        matches!(self.state, State::Done)
    }

    fn size_hint(&self) -> SizeHint {
        self.len.map_or_else(SizeHint::default, |len| {
            SizeHint::with_exact(len.saturating_sub(self.offset))
        })
    }
}

impl<P: Producer> Drop for ProducerBody<P> {
    fn drop(&mut self) {
        let complete = matches!(self.state, State::Done)
            || self.len.is_some_and(|len| self.offset >= len);
        if !complete {
            logger::log_debug(&format!("Client went away after {} bytes", self.offset));
        }
        // An idle lease is released right here; one in flight is released by
        // the blocking task once its output is discarded
    }
}
