//! Request handler module
//!
//! Classifies the requested path and picks the response: not-found page,
//! canonicalizing redirect, streamed file, or streamed directory listing.

pub mod classify;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
