//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, prefix routing,
//! classification of the target and choice of response.

use crate::config::{AppState, ServeConfig};
use crate::error::{ServeError, ServeResult};
use crate::handler::classify::{classify, strip_route_prefix, PathKind, Target};
use crate::http::{self, ResponseBody};
use crate::logger::{self, AccessLogEntry};
use crate::producer::{DirectoryProducer, FileProducer};
use hyper::header::{self, HeaderMap};
use hyper::{Method, Request, Response, Version};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Main entry point for HTTP request handling
///
/// An `Err` means no response could be constructed; hyper then drops the
/// connection without queueing anything.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<ResponseBody>, ServeError> {
    let started = Instant::now();
    let config = &state.config;

    let result = match *req.method() {
        Method::GET | Method::HEAD => serve_path(req.uri().path(), &config.serve),
        Method::OPTIONS => http::build_options_response(),
        _ => {
            logger::log_warning(&format!("Method not allowed: {}", req.method()));
            http::build_405_response()
        }
    };

    match result {
        Ok(response) => {
            let response = http::queue_response(response, &config.http.server_name);
            if config.logging.access_log {
                let entry = access_entry(&req, &response, peer_addr, started);
                logger::log_access(&entry, &config.logging.access_log_format);
            }
            Ok(response)
        }
        Err(e) => {
            logger::log_error(&format!("{} {}: {e}", req.method(), req.uri()));
            Err(e)
        }
    }
}

/// Map a URL path onto a 404, a redirect, a file stream or a directory listing
pub fn serve_path(url_path: &str, serve: &ServeConfig) -> ServeResult<Response<ResponseBody>> {
    let Some(raw) = strip_route_prefix(url_path, &serve.prefix) else {
        return http::build_404_response();
    };
    let Some(target) = Target::resolve(Path::new(&serve.root), raw) else {
        logger::log_debug(&format!("Rejected request path: {url_path}"));
        return http::build_404_response();
    };

    match classify(&target.fs_path) {
        PathKind::NotFound => http::build_404_response(),
        PathKind::File => match FileProducer::open(&target.fs_path) {
            Ok(producer) => http::build_file_response(producer, serve.chunk_size),
            Err(e) => not_found(&e),
        },
        PathKind::Directory if !target.is_canonical_dir() => {
            http::build_redirect_response(&format!("{}{}/", serve.prefix, target.raw))
        }
        PathKind::Directory => {
            match DirectoryProducer::open(&target.fs_path, target.display, serve.escape_names) {
                Ok(producer) => http::build_directory_response(producer, serve.chunk_size),
                Err(e) => not_found(&e),
            }
        }
    }
}

/// The path vanished or became unreadable between classification and open
fn not_found(err: &ServeError) -> ServeResult<Response<ResponseBody>> {
    logger::log_debug(&err.to_string());
    http::build_404_response()
}

fn access_entry<B>(
    req: &Request<B>,
    response: &Response<ResponseBody>,
    peer_addr: SocketAddr,
    started: Instant,
) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = version_label(req.version()).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = header_str(response.headers(), &header::CONTENT_LENGTH)
        .and_then(|len| len.parse().ok());
    entry.referer = header_str(req.headers(), &header::REFERER).map(ToString::to_string);
    entry.user_agent = header_str(req.headers(), &header::USER_AGENT).map(ToString::to_string);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    entry
}

fn header_str<'a>(headers: &'a HeaderMap, name: &header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
