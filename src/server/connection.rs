// Connection handling module
// Accepts a single TCP connection and serves HTTP/1.1 on it

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpStream;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Accept a connection, enforcing `performance.max_connections`.
///
/// The connection is served on its own task and registered with `graceful`
/// so shutdown can wait for in-flight responses.
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    graceful: &GracefulShutdown,
) {
    // Increment first, then check, so concurrent accepts cannot overshoot
    let prev_count = state.active_connections.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            state.active_connections.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Connection limit reached ({max_conn}), rejecting {peer_addr}"
            ));
            return;
        }
    }

    logger::log_connection_accepted(&peer_addr);

    let perf = &state.config.performance;
    let mut builder = http1::Builder::new();
    builder.timer(TokioTimer::new()).keep_alive(perf.keep_alive);
    if perf.read_timeout > 0 {
        builder.header_read_timeout(Duration::from_secs(perf.read_timeout));
    }

    let service_state = Arc::clone(state);
    let conn = builder.serve_connection(
        TokioIo::new(stream),
        service_fn(move |req| handler::handle_request(req, Arc::clone(&service_state), peer_addr)),
    );
    let conn = graceful.watch(conn);

    let state = Arc::clone(state);
    tokio::spawn(async move {
        if let Err(err) = conn.await {
            // Client hang-ups mid-body are routine for a file server
            if err.is_incomplete_message() || err.is_canceled() {
                logger::log_debug(&format!("Connection from {peer_addr} ended early: {err}"));
            } else {
                logger::log_connection_error(&err);
            }
        }
        state.active_connections.fetch_sub(1, Ordering::SeqCst);
    });
}
