//! Graceful shutdown
//!
//! Shutdown runs every cleanup step even when an earlier one fails. Failures
//! are collected in a [`ShutdownReport`] that decides the exit code once
//! everything has been attempted.

use crate::routes::App;
use axum::{extract::Request, ServiceExt};
use sqlx::SqlitePool;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::oneshot;

/// Cleanup failures gathered while shutting down
#[derive(Debug, Default)]
pub struct ShutdownReport {
    failures: Vec<String>,
}

impl ShutdownReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed step; later steps still run
    pub fn record(&mut self, step: &str, error: impl Display) {
        tracing::error!(step, error = %error, "Shutdown step failed");
        self.failures.push(format!("{}: {}", step, error));
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    /// Summarize the shutdown in the log
    pub fn log(&self) {
        if self.is_clean() {
            tracing::info!("Shutdown complete");
        } else {
            tracing::error!(
                failures = self.failures.len(),
                "Shutdown finished with failures: {}",
                self.failures.join("; ")
            );
        }
    }
}

/// Wait for Ctrl+C, SIGTERM or SIGHUP
pub async fn wait_for_shutdown() {
    tokio::select! {
        () = wait_ctrl_c() => {},
        () = wait_unix(UnixSignal::Terminate) => {},
        () = wait_unix(UnixSignal::Hangup) => {},
    }

    tracing::info!("Shutdown signal received, initiating graceful shutdown");
}

async fn wait_ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C signal"),
        Err(e) => {
            tracing::error!(%e, "Error handling Ctrl+C signal");
            std::future::pending::<()>().await;
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum UnixSignal {
    Terminate,
    Hangup,
}

#[cfg(unix)]
async fn wait_unix(which: UnixSignal) {
    use signal::unix::{signal, SignalKind};

    let kind = match which {
        UnixSignal::Terminate => SignalKind::terminate(),
        UnixSignal::Hangup => SignalKind::hangup(),
    };

    match signal(kind) {
        Ok(mut handler) => {
            handler.recv().await;
            tracing::info!("Received {:?} signal", which);
        }
        Err(e) => {
            tracing::error!(%e, "Failed to install {:?} handler", which);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_unix(_which: UnixSignal) {
    std::future::pending::<()>().await;
}

/// Serve `app` until `signal` resolves, then drain in-flight requests
///
/// New connections stop being accepted as soon as `signal` fires. If requests
/// are still running after `drain_timeout`, the serve task is aborted and the
/// overrun is recorded as a failure. Connection tasks axum already spawned are
/// not cancelled by that; they stop with the runtime.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    app: App,
    signal: F,
    drain_timeout: Duration,
    report: &mut ShutdownReport,
) where
    F: Future<Output = ()> + Send,
{
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
            .with_graceful_shutdown(async move {
                // Sender dropped also means stop
                let _ = stop_rx.await;
            })
            .await
    });

    tokio::select! {
        joined = &mut server => {
            record_server_exit(report, joined);
            return;
        }
        () = signal => {}
    }

    let _ = stop_tx.send(());

    match tokio::time::timeout(drain_timeout, &mut server).await {
        Ok(joined) => record_server_exit(report, joined),
        Err(_) => {
            server.abort();
            report.record(
                "drain",
                format!("requests still in flight after {:?}", drain_timeout),
            );
        }
    }
}

fn record_server_exit(
    report: &mut ShutdownReport,
    joined: Result<std::io::Result<()>, tokio::task::JoinError>,
) {
    match joined {
        Ok(Ok(())) => tracing::info!("HTTP server stopped"),
        Ok(Err(e)) => report.record("http server", e),
        Err(e) => report.record("http server task", e),
    }
}

/// Close `pool`, waiting at most `timeout` for its connections to be released
pub async fn close_pool(
    report: &mut ShutdownReport,
    name: &str,
    pool: &SqlitePool,
    timeout: Duration,
) {
    match tokio::time::timeout(timeout, pool.close()).await {
        Ok(()) => tracing::info!("Closed {} pool", name),
        Err(_) => report.record(
            &format!("close {} pool", name),
            format!("timed out after {:?}", timeout),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::with_middleware;
    use axum::{routing::get, Router};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[test]
    fn report_collects_every_failure() {
        let mut report = ShutdownReport::new();
        assert!(report.is_clean());

        report.record("drain", "timed out");
        report.record("close writer pool", "timed out");

        assert!(!report.is_clean());
        assert_eq!(report.failures().len(), 2);
        assert!(report.failures()[0].starts_with("drain"));
    }

    #[tokio::test]
    async fn stops_cleanly_when_signalled() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let app = with_middleware(Router::new().route("/", get(|| async { "ok" })));
        let (tx, rx) = oneshot::channel::<()>();
        tx.send(()).unwrap();

        let mut report = ShutdownReport::new();
        serve_with_shutdown(
            listener,
            app,
            async {
                let _ = rx.await;
            },
            Duration::from_secs(5),
            &mut report,
        )
        .await;

        assert!(report.is_clean(), "{:?}", report.failures());
    }

    #[tokio::test]
    async fn slow_request_past_the_drain_timeout_is_recorded() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = with_middleware(Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                "late"
            }),
        ));
        let (tx, rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream
                .write_all(b"GET /slow HTTP/1.1\r\nhost: localhost\r\n\r\n")
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
            let _ = tx.send(());
            let mut buf = Vec::new();
            let _ = stream.read_to_end(&mut buf).await;
        });

        let mut report = ShutdownReport::new();
        serve_with_shutdown(
            listener,
            app,
            async {
                let _ = rx.await;
            },
            Duration::from_millis(200),
            &mut report,
        )
        .await;

        assert_eq!(report.failures().len(), 1);
        assert!(report.failures()[0].starts_with("drain"));
    }

    #[tokio::test]
    async fn closing_an_idle_pool_is_clean() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("close.db").display());
        let pool = iseng_storage::create_writer_pool(&url, 1).await.unwrap();

        let mut report = ShutdownReport::new();
        close_pool(&mut report, "writer", &pool, Duration::from_secs(5)).await;

        assert!(report.is_clean());
        assert!(pool.is_closed());
    }
}
