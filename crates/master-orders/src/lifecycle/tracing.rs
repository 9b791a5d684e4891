//! # Observability & Tracing
//!
//! Structured logging for the whole engine. Record actors log every request
//! with a `record_type` field, engine components log with `account`,
//! `master` and `member` fields, and client methods open spans via
//! `#[instrument]`.
//!
//! ```bash
//! RUST_LOG=info cargo run        # one line per merge, removal and transition
//! RUST_LOG=debug cargo run       # every actor request with its payload
//! RUST_LOG=master_orders::allocation=trace cargo run
//! ```
//!
//! With `RUST_LOG=info` an admission reads:
//!
//! ```text
//! INFO admit:acquire_or_create: Opened master order account=account_1 master=master_1 txn=txn_1 pays_centrally=true
//! INFO admit: Admitted member order master=master_1 account=account_1 items=2
//! ```

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
