// src/main.rs
//
// Minimal demo node that wires up the ledger library:
//
// - RocksDB-backed chain storage (genesis created on first start)
// - Admission pool + proof-of-work sealing behind the LedgerNode facade
// - Prometheus metrics exporter on /metrics
// - Event-logging task and a periodic performance-metrics emitter
// - Graceful Ctrl-C shutdown.
//
// The HTTP API that feeds transactions into the node lives outside this
// crate; this binary only demonstrates the wiring.

use std::{sync::Arc, time::Duration};

use tokio::signal;

use ledger::{
    ChainStore, LedgerConfig, LedgerEvent, LedgerNode, MetricsRegistry, RocksDbKvStore,
    run_prometheus_http_server,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "ledger=info".to_string()))
        .init();

    if let Err(err) = run_node().await {
        tracing::error!("fatal error: {err}");
        std::process::exit(1);
    }
}

async fn run_node() -> Result<(), String> {
    // For now, just use defaults. Later this can load from a file/CLI/env.
    let cfg = LedgerConfig::default();

    // ---------------------------
    // Metrics registry + exporter
    // ---------------------------

    let metrics = Arc::new(
        MetricsRegistry::new().map_err(|e| format!("failed to initialise metrics registry: {e}"))?,
    );

    if cfg.metrics.enabled {
        let metrics_clone = metrics.clone();
        let addr = cfg.metrics.listen_addr;
        tokio::spawn(async move {
            if let Err(e) = run_prometheus_http_server(metrics_clone, addr).await {
                tracing::error!("metrics HTTP server error: {e}");
            }
        });
        tracing::info!("metrics exporter listening on http://{}/metrics", addr);
    }

    // ---------------------------
    // Storage + chain load
    // ---------------------------

    let kv = RocksDbKvStore::open(&cfg.storage)
        .map_err(|e| format!("failed to open RocksDB store at {}: {e}", cfg.storage.path))?;

    // Load failure here is fatal: no block production on a chain we
    // cannot fully reconstruct.
    let chain = ChainStore::load(kv, &cfg.network).map_err(|e| format!("chain load failed: {e}"))?;

    // ---------------------------
    // Node facade
    // ---------------------------

    let node = Arc::new(LedgerNode::new(cfg, chain, metrics));

    // ---------------------------
    // Event logging task
    // ---------------------------

    let mut events = node.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                LedgerEvent::BlockSealed {
                    index,
                    hash,
                    tx_count,
                    mining_time_ms,
                } => {
                    tracing::info!(index, %hash, tx_count, mining_time_ms, "block sealed");
                }
                LedgerEvent::TemperatureViolation(v) => {
                    tracing::warn!(
                        batch_id = %v.batch_id,
                        observed = v.observed,
                        threshold = v.threshold,
                        "compliance violation"
                    );
                }
                LedgerEvent::ProcessingError { context, reason } => {
                    tracing::error!(%context, "processing error: {reason}");
                }
                _ => {}
            }
        }
    });

    // ---------------------------
    // Periodic performance metrics
    // ---------------------------

    let stats_node = node.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30));
        loop {
            interval.tick().await;
            stats_node.emit_performance_metrics().await;
            let stats = stats_node.stats().await;
            tracing::info!(
                chain_length = stats.chain_length,
                total_transactions = stats.total_transactions,
                pending = stats.pending_transactions,
                "ledger stats"
            );
        }
    });

    let stats = node.stats().await;
    tracing::info!(
        chain_length = stats.chain_length,
        difficulty = stats.current_difficulty,
        "ledger node running"
    );

    // ---------------------------
    // Wait for shutdown
    // ---------------------------

    let _ = signal::ctrl_c().await;
    tracing::info!("shutdown signal received");

    Ok(())
}
