//! Process wiring: the change pipeline runs next to the health endpoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use stockrelay_change_listener::{PgChangeSource, StockListener};
use stockrelay_core::sink::StockSink;
use stockrelay_core::source::ChangeSource;
use stockrelay_forwarding::ForwardingService;
use stockrelay_hq_client::HqClient;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::routes;

/// How long shutdown waits for an in-flight send to finish.
const FORWARDING_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Builds the HTTP router.
pub fn build_router() -> Router {
    Router::new()
        .merge(routes::health::router())
        .layer(TraceLayer::new_for_http())
}

/// Runs the service until SIGINT or SIGTERM.
///
/// # Errors
///
/// Returns `AppError::Pipeline` if the change subscription cannot be
/// established, and `AppError::Server` if the HTTP listener cannot be bound
/// or the server fails.
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let listener = Arc::new(StockListener::new(PgChangeSource::new(&config.database)));
    let hq = Arc::new(HqClient::new(config.hq.clone()));
    serve(listener, hq, config.service_port, shutdown_signal()).await
}

/// Subscribes the pipeline, then serves HTTP until `shutdown` completes.
///
/// Nothing is served unless the subscription succeeds.
///
/// # Errors
///
/// Returns `AppError::Pipeline` if the change subscription cannot be
/// established, and `AppError::Server` if the HTTP listener cannot be bound
/// or the server fails.
pub async fn serve<S, F>(
    listener: Arc<StockListener<S>>,
    sink: Arc<dyn StockSink>,
    port: u16,
    shutdown: F,
) -> Result<(), AppError>
where
    S: ChangeSource + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let forwarding = ForwardingService::new(listener.clone(), sink);

    let cancel = CancellationToken::new();
    let events = match forwarding.listen(cancel.child_token()).await {
        Ok(events) => events,
        Err(e) => {
            close_listener(&listener).await;
            return Err(e.into());
        }
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let tcp = match TcpListener::bind(addr).await {
        Ok(tcp) => tcp,
        Err(e) => {
            cancel.cancel();
            close_listener(&listener).await;
            return Err(e.into());
        }
    };

    let mut forwarding_task = tokio::spawn(async move { forwarding.forward(events).await });

    info!(%addr, "Starting HTTP server");
    let served = axum::serve(tcp, build_router())
        .with_graceful_shutdown(shutdown)
        .await;

    info!("Shutting down");
    cancel.cancel();

    match tokio::time::timeout(FORWARDING_SHUTDOWN_GRACE, &mut forwarding_task).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "Forwarding task failed"),
        Err(_) => {
            warn!("Forwarding did not stop in time, abandoning in-flight send");
            forwarding_task.abort();
        }
    }

    close_listener(&listener).await;

    served?;
    Ok(())
}

async fn close_listener<S>(listener: &StockListener<S>)
where
    S: ChangeSource + 'static,
{
    if let Err(e) = listener.close().await {
        error!(error = %e, "Failed to close change listener");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!("Shutdown requested");
}
