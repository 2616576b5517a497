// Server loop module
// Accepts connections until shutdown is requested, then drains in-flight ones

use std::sync::Arc;
use std::time::Duration;

use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// Run the accept loop on `listener` until `shutdown` is notified.
///
/// After the listener is closed, connections still streaming get
/// `performance.shutdown_grace` seconds before they are dropped.
pub async fn start_server_loop(listener: TcpListener, state: Arc<AppState>, shutdown: Arc<Notify>) {
    let graceful = GracefulShutdown::new();

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &graceful);
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }
            () = shutdown.notified() => break,
        }
    }

    drop(listener);
    logger::log_shutdown(state.active_connections());

    let grace = Duration::from_secs(state.config.performance.shutdown_grace);
    tokio::select! {
        () = graceful.shutdown() => logger::log_info("All connections closed"),
        () = tokio::time::sleep(grace) => logger::log_warning(&format!(
            "Shutdown grace period of {}s elapsed, dropping {} connection(s)",
            grace.as_secs(),
            state.active_connections()
        )),
    }
}
