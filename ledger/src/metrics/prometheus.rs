//! Prometheus-backed metrics and HTTP exporter.
//!
//! This module defines a [`MetricsRegistry`] that owns a Prometheus
//! registry and a set of strongly-typed ledger metrics, and an async HTTP
//! exporter that serves `/metrics` using `hyper`.

use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use bytes::Bytes;
use http_body_util::Full;
use hyper::{
    Method, Request, Response, StatusCode, body::Incoming, header, server::conn::http1,
    service::service_fn,
};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use prometheus::{
    self, Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry, TextEncoder,
};

/// Ledger-related Prometheus metrics.
///
/// These are registered into a [`Registry`] and updated from the admission
/// and sealing paths.
#[derive(Clone)]
pub struct LedgerMetrics {
    /// Wall-clock duration of the proof-of-work nonce search, in seconds.
    pub seal_seconds: Histogram,
    /// Total blocks sealed and appended.
    pub blocks_sealed: IntCounter,
    /// Total transactions that passed admission.
    pub transactions_admitted: IntCounter,
    /// Total transactions refused admission.
    pub admissions_rejected: IntCounter,
    /// Total cold-chain envelope violations detected.
    pub compliance_violations: IntCounter,
    /// Transactions currently waiting in the admission pool.
    pub pending_transactions: IntGauge,
}

impl LedgerMetrics {
    /// Registers ledger metrics into the given `Registry`.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let seal_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "seal_seconds",
                "Wall-clock duration of the proof-of-work seal in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
        )?;
        registry.register(Box::new(seal_seconds.clone()))?;

        let blocks_sealed = IntCounter::with_opts(Opts::new(
            "blocks_sealed_total",
            "Total number of blocks sealed and appended to the chain",
        ))?;
        registry.register(Box::new(blocks_sealed.clone()))?;

        let transactions_admitted = IntCounter::with_opts(Opts::new(
            "transactions_admitted_total",
            "Total number of transactions that passed admission",
        ))?;
        registry.register(Box::new(transactions_admitted.clone()))?;

        let admissions_rejected = IntCounter::with_opts(Opts::new(
            "admissions_rejected_total",
            "Total number of transactions refused admission",
        ))?;
        registry.register(Box::new(admissions_rejected.clone()))?;

        let compliance_violations = IntCounter::with_opts(Opts::new(
            "compliance_violations_total",
            "Total number of cold-chain envelope violations detected",
        ))?;
        registry.register(Box::new(compliance_violations.clone()))?;

        let pending_transactions = IntGauge::with_opts(Opts::new(
            "pending_transactions",
            "Transactions currently waiting in the admission pool",
        ))?;
        registry.register(Box::new(pending_transactions.clone()))?;

        Ok(Self {
            seal_seconds,
            blocks_sealed,
            transactions_admitted,
            admissions_rejected,
            compliance_violations,
            pending_transactions,
        })
    }
}

/// Wrapper around a Prometheus registry and the ledger metrics.
///
/// This is the main handle you pass around in the node. It can be wrapped
/// in an [`Arc`] and shared across threads/tasks.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    pub ledger: LedgerMetrics,
}

impl MetricsRegistry {
    /// Creates a new `MetricsRegistry` with a fresh underlying `Registry`
    /// and registers the ledger metrics under the `ledger_` prefix.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("ledger".to_string()), None)?;
        let ledger = LedgerMetrics::register(&registry)?;
        Ok(Self { registry, ledger })
    }

    /// Encodes all metrics in this registry into the Prometheus text format.
    pub fn gather_text(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("failed to encode Prometheus metrics: {e}");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Runs an HTTP server that exposes Prometheus metrics.
///
/// The server listens on `addr` and serves `GET /metrics` with the
/// Prometheus text exposition format. All other paths return 404.
///
/// This function is `async` and is intended to be spawned onto a Tokio
/// runtime.
pub async fn run_prometheus_http_server(
    metrics: Arc<MetricsRegistry>,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let svc = service_fn(move |req| {
                let metrics = metrics.clone();
                handle_request(req, metrics)
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, svc).await {
                tracing::error!("prometheus HTTP server error: {err}");
            }
        });
    }
}

async fn handle_request(
    req: Request<Incoming>,
    metrics: Arc<MetricsRegistry>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => {
            let body = metrics.gather_text();
            Ok(Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
                .body(Full::new(Bytes::from(body)))
                .unwrap())
        }
        _ => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from("not found")))
            .unwrap()),
    }
}
