//! Metrics collection.
//!
//! # Metrics
//! - `wallet_transactions_submitted_total` (counter)
//! - `wallet_transactions_settled_total` (counter): by `status`
//! - `wallet_provider_errors_total` (counter): by `method`, `code`
//! - `wallet_connected` (gauge): 1=connected, 0=disconnected
//!
//! Nothing is exported until the embedding application installs a
//! `metrics` recorder; until then these calls are no-ops.

pub fn record_transaction_submitted() {
    metrics::counter!("wallet_transactions_submitted_total").increment(1);
}

pub fn record_transaction_settled(status: &'static str) {
    metrics::counter!("wallet_transactions_settled_total", "status" => status).increment(1);
}

pub fn record_provider_error(method: &'static str, code: Option<i64>) {
    let code = code.map_or_else(|| "none".to_string(), |c| c.to_string());
    metrics::counter!("wallet_provider_errors_total", "method" => method, "code" => code)
        .increment(1);
}

pub fn record_wallet_connected(connected: bool) {
    metrics::gauge!("wallet_connected").set(if connected { 1.0 } else { 0.0 });
}
