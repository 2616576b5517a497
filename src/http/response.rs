//! HTTP response building module
//!
//! Builds every response the server sends: fixed pages, redirects and streamed
//! producer bodies. `queue_response` stamps the headers shared by all of them.

use super::body::ProducerBody;
use crate::error::{ServeError, ServeResult};
use crate::producer::{DirectoryProducer, FileProducer, Producer};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::Bytes;
use hyper::header::{self, HeaderValue};
use hyper::http::response::Builder;
use hyper::{Response, StatusCode};
use std::io;

pub type ResponseBody = UnsyncBoxBody<Bytes, io::Error>;

/// Fixed 404 page
pub const PAGE_404: &str = "<html>\
                            <head><title>File not found</title></head>\
                            <body>File not found</body>\
                            </html>";

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

fn full(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into()).map_err(|never| match never {}).boxed_unsync()
}

fn empty() -> ResponseBody {
    Empty::new().map_err(|never| match never {}).boxed_unsync()
}

/// Build 404 Not Found response
pub fn build_404_response() -> ServeResult<Response<ResponseBody>> {
    Ok(Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header(header::CONTENT_TYPE, HTML_CONTENT_TYPE)
        .body(full(PAGE_404))?)
}

/// Build 301 redirect to the canonical (trailing slash) form of a directory
pub fn build_redirect_response(location: &str) -> ServeResult<Response<ResponseBody>> {
    Ok(Response::builder()
        .status(StatusCode::MOVED_PERMANENTLY)
        .header(header::LOCATION, location)
        .body(empty())?)
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> ServeResult<Response<ResponseBody>> {
    Ok(Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header(header::ALLOW, ALLOWED_METHODS)
        .header(header::CONTENT_TYPE, "text/plain")
        .body(full("405 Method Not Allowed"))?)
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response() -> ServeResult<Response<ResponseBody>> {
    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(header::ALLOW, ALLOWED_METHODS)
        .header(header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS)
        .header(header::ACCESS_CONTROL_MAX_AGE, "86400")
        .body(empty())?)
}

/// Build 200 response streaming a file; the length is known up front
pub fn build_file_response<R>(
    producer: FileProducer<R>,
    chunk_size: usize,
) -> ServeResult<Response<ResponseBody>>
where
    FileProducer<R>: Producer,
{
    let builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_LENGTH, producer.len().unwrap_or_default());
    build_streamed_response(builder, producer, chunk_size)
}

/// Build 200 response streaming a directory listing of unknown length
pub fn build_directory_response<I>(
    producer: DirectoryProducer<I>,
    chunk_size: usize,
) -> ServeResult<Response<ResponseBody>>
where
    DirectoryProducer<I>: Producer,
{
    let builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, HTML_CONTENT_TYPE);
    build_streamed_response(builder, producer, chunk_size)
}

/// Attach `producer` as the body of the response described by `builder`.
///
/// The head is validated before the pump starts. If it cannot be built the
/// producer is released right here and nothing is returned to be queued.
fn build_streamed_response<P: Producer>(
    builder: Builder,
    mut producer: P,
    chunk_size: usize,
) -> ServeResult<Response<ResponseBody>> {
    match builder.body(()) {
        Ok(head) => {
            Ok(head.map(|()| ProducerBody::new(producer, chunk_size).boxed_unsync()))
        }
        Err(e) => {
            producer.release();
            Err(ServeError::ConstructionFailure(e))
        }
    }
}

/// Add the headers every outgoing response carries, regardless of kind
pub fn queue_response(
    mut response: Response<ResponseBody>,
    server_name: &str,
) -> Response<ResponseBody> {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    match HeaderValue::from_str(server_name) {
        Ok(value) => {
            headers.insert(header::SERVER, value);
        }
        Err(e) => {
            crate::logger::log_warning(&format!("Invalid server name '{server_name}': {e}"));
        }
    }
    response
}
