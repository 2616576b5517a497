// Signal handling module
//
// Supported signals:
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)
// - SIGUSR1: Reopen log files after rotation

use std::sync::Arc;
use tokio::sync::Notify;

use crate::logger;

/// Start signal handlers (Unix only)
///
/// Spawns a background task that notifies `shutdown` once on SIGTERM or
/// SIGINT and reopens the log files on every SIGUSR1.
///
/// | Signal  | Action           | Nginx Equivalent   |
/// |---------|------------------|--------------------|
/// | SIGTERM | Graceful stop    | `nginx -s quit`    |
/// | SIGINT  | Graceful stop    | Ctrl+C             |
/// | SIGUSR1 | Reopen logs      | `nginx -s reopen`  |
#[cfg(unix)]
pub fn start_signal_handler(shutdown: Arc<Notify>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let registered = (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
            signal(SignalKind::user_defined1()),
        );
        let (mut sigterm, mut sigint, mut sigusr1) = match registered {
            (Ok(term), Ok(int), Ok(usr1)) => (term, int, usr1),
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                logger::log_error(&format!("Failed to register signal handlers: {e}"));
                return;
            }
        };

        logger::log_debug(&format!(
            "[SIGNAL] Handlers registered for process {}",
            std::process::id()
        ));

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    logger::log_info("[SIGNAL] SIGTERM received, shutting down");
                    shutdown.notify_one();
                    break;
                }
                _ = sigint.recv() => {
                    logger::log_info("[SIGNAL] SIGINT received, shutting down");
                    shutdown.notify_one();
                    break;
                }
                _ = sigusr1.recv() => reopen_logs(),
            }
        }
    });
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(shutdown: Arc<Notify>) {
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            logger::log_info("[SIGNAL] Ctrl+C received, shutting down");
            shutdown.notify_one();
        }
    });
}

#[cfg(unix)]
fn reopen_logs() {
    if !logger::writer::is_initialized() {
        return;
    }
    match logger::writer::get().reopen() {
        Ok(()) => logger::log_info("[SIGNAL] SIGUSR1 received, log files reopened"),
        Err(e) => logger::log_error(&format!("Failed to reopen log files: {e}")),
    }
}
