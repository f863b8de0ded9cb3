use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use anyhow::Context;
use axum::Router;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tower::ServiceExt;
use tracing::{Instrument, debug, debug_span, error, info, warn};

use crate::infrastructure::settings::Settings;
use crate::presentation::http::middleware::trace::apply_trace;
use crate::presentation::{AppState, http_handlers};

#[derive(Debug, Clone, Copy)]
pub(crate) struct ConnectionTimeouts {
    /// Time a client gets to send a complete request head.
    pub(crate) read_header: Duration,
    /// Time a keep-alive connection may sit without a request in flight.
    pub(crate) idle: Duration,
}

impl ConnectionTimeouts {
    pub(crate) fn from_settings(settings: &Settings) -> Self {
        Self {
            read_header: Duration::from_secs(settings.http_read_header_timeout_secs),
            idle: Duration::from_secs(settings.http_idle_timeout_secs),
        }
    }
}

pub(crate) async fn run_http(settings: &Settings, state: AppState) -> anyhow::Result<()> {
    let app = build_router(state, settings.http_request_body_limit_bytes);

    let listener = TcpListener::bind(&settings.http_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.http_addr))?;

    info!("HTTP server listening on {}", settings.http_addr);
    serve(
        listener,
        app,
        ConnectionTimeouts::from_settings(settings),
        shutdown_signal(),
    )
    .await;

    info!("HTTP server stopped");
    Ok(())
}

pub(crate) fn build_router(state: AppState, body_limit: usize) -> Router {
    apply_trace(http_handlers::routes(state, body_limit))
}

/// Accepts connections until `shutdown` resolves, then lets every open
/// connection finish its current request before returning.
pub(crate) async fn serve<F>(
    listener: TcpListener,
    app: Router,
    timeouts: ConnectionTimeouts,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    let (closing_tx, closing_rx) = watch::channel(false);
    let mut connections = JoinSet::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    let connection =
                        serve_connection(stream, app.clone(), timeouts, closing_rx.clone());
                    connections.spawn(connection.instrument(debug_span!("connection", %peer)));
                }
                Err(err) => {
                    warn!(error = %err, "failed to accept connection");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            },
            Some(joined) = connections.join_next(), if !connections.is_empty() => {
                if let Err(err) = joined {
                    error!(error = %err, "connection task failed");
                }
            }
        }
    }

    drop(listener);
    closing_tx.send_replace(true);
    info!(open = connections.len(), "waiting for open connections");
    while let Some(joined) = connections.join_next().await {
        if let Err(err) = joined {
            error!(error = %err, "connection task failed");
        }
    }
}

async fn serve_connection(
    stream: TcpStream,
    app: Router,
    timeouts: ConnectionTimeouts,
    mut closing: watch::Receiver<bool>,
) {
    let activity = ConnectionActivity::new();
    let service = {
        let activity = Arc::clone(&activity);
        service_fn(move |request: hyper::Request<Incoming>| {
            let active = activity.begin();
            let app = app.clone();
            async move {
                let response = app.oneshot(request).await;
                drop(active);
                response
            }
        })
    };

    let mut builder = http1::Builder::new();
    builder
        .timer(TokioTimer::new())
        .header_read_timeout(timeouts.read_header);
    let connection = builder.serve_connection(TokioIo::new(stream), service);
    tokio::pin!(connection);

    let mut shutting_down = false;
    loop {
        let idle_wait = activity.idle_remaining(timeouts.idle);
        if idle_wait.is_none() && !shutting_down {
            debug!("closing idle connection");
            shutting_down = true;
            connection.as_mut().graceful_shutdown();
        }

        tokio::select! {
            result = connection.as_mut() => {
                if let Err(err) = result {
                    debug!(error = %err, "connection closed with error");
                }
                return;
            }
            _ = closing.changed(), if !shutting_down => {
                shutting_down = true;
                connection.as_mut().graceful_shutdown();
            }
            () = tokio::time::sleep(idle_wait.unwrap_or(timeouts.idle)), if !shutting_down => {}
        }
    }
}

/// Request bookkeeping for one connection, shared with its service.
struct ConnectionActivity {
    opened: Instant,
    in_flight: AtomicUsize,
    last_active_ms: AtomicU64,
}

impl ConnectionActivity {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            opened: Instant::now(),
            in_flight: AtomicUsize::new(0),
            last_active_ms: AtomicU64::new(0),
        })
    }

    fn begin(self: &Arc<Self>) -> ActiveRequest {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        ActiveRequest(Arc::clone(self))
    }

    fn touch(&self) {
        let elapsed = u64::try_from(self.opened.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.last_active_ms.store(elapsed, Ordering::SeqCst);
    }

    /// `None` once the connection has been idle for `idle`.
    fn idle_remaining(&self, idle: Duration) -> Option<Duration> {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            return Some(idle);
        }

        let last_active =
            self.opened + Duration::from_millis(self.last_active_ms.load(Ordering::SeqCst));
        idle.checked_sub(last_active.elapsed())
            .filter(|remaining| !remaining.is_zero())
    }
}

struct ActiveRequest(Arc<ConnectionActivity>);

impl Drop for ActiveRequest {
    fn drop(&mut self) {
        self.0.touch();
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(err) => {
            error!(error = %err, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
