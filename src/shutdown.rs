//! Cooperative cancellation for long state-mutating passes.
//!
//! The first Ctrl+C or SIGTERM cancels the returned token; an ingest pass
//! checks it between files, stops, and still saves what it recorded. A
//! second signal exits immediately without saving.

use tokio_util::sync::CancellationToken;

/// Exit code used when the user forces an exit with a second signal.
const FORCED_EXIT_CODE: i32 = 130;

async fn next_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "SIGTERM handler unavailable, using Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Spawn the signal listener and return the token it cancels.
pub(crate) fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let handler_token = token.clone();

    tokio::spawn(async move {
        next_signal().await;
        tracing::info!(
            "Stopping after the current file; press Ctrl+C again to abort without saving"
        );
        handler_token.cancel();

        next_signal().await;
        tracing::warn!("Forced exit, unsaved sync state is lost");
        std::process::exit(FORCED_EXIT_CODE);
    });

    token
}
