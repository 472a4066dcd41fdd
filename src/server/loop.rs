// Server loop module
// Accepts connections until the shutdown future resolves, then drains

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// Run the accept loop until `shutdown` completes.
///
/// After shutdown the listener is closed first, then open connections get
/// `performance.shutdown_timeout` seconds to finish before the function
/// returns regardless.
pub async fn run_server<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F)
where
    F: Future,
{
    let active_connections = Arc::new(AtomicUsize::new(0));
    let graceful = GracefulShutdown::new();
    let mut shutdown = std::pin::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(
                            stream,
                            peer_addr,
                            &state,
                            &active_connections,
                            &graceful,
                        );
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            _ = &mut shutdown => break,
        }
    }

    drop(listener);

    let grace_secs = state.config.performance.shutdown_timeout;
    logger::log_shutdown_started(active_connections.load(Ordering::SeqCst), grace_secs);
    let drained = tokio::time::timeout(Duration::from_secs(grace_secs), graceful.shutdown())
        .await
        .is_ok();
    logger::log_shutdown_finished(drained);
}
