//! Error types
//!
//! Three kinds of failure matter while serving a request:
//! - `NotFound`: any lookup/open failure, whatever the cause (rendered as the 404 page)
//! - `StreamAbort`: a read or seek failure after headers were sent (connection is cut)
//! - `ConstructionFailure`: the response object could not be built (nothing is queued)

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("stream aborted: {0}")]
    StreamAbort(#[source] io::Error),

    #[error("failed to construct response: {0}")]
    ConstructionFailure(#[from] hyper::http::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid address: {0}")]
    Address(String),
}

pub type ServeResult<T> = Result<T, ServeError>;
