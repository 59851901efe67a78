use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Cancels `cancelation` on Ctrl-C, or right away if listening for it fails. Returns early when
/// the token gets cancelled by someone else.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                error!("Failed to listen for Ctrl-C {e:?}");
            }
            debug!("Shutdown requested");
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => {},
    };
}
