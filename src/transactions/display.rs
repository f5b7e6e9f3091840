//! Presentation helpers for the transaction history.

use chrono::{TimeZone, Utc};

use crate::transactions::types::TransactionRecord;
use crate::wallet::chains::chain_info;

const MINUTE_MS: u64 = 60_000;
const HOUR_MS: u64 = 60 * MINUTE_MS;
const DAY_MS: u64 = 24 * HOUR_MS;

const DEFAULT_EXPLORER: &str = "https://etherscan.io";

/// Which side of a transfer the viewer is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Sent,
    Received,
}

impl Direction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Received => "received",
        }
    }
}

/// `Sent` when `viewer` is the sender, compared case-insensitively.
pub fn direction(record: &TransactionRecord, viewer: &str) -> Direction {
    if record.from.eq_ignore_ascii_case(viewer) {
        Direction::Sent
    } else {
        Direction::Received
    }
}

/// "Just now", "5m ago", "3h ago", or the calendar date after a day.
pub fn format_relative_time(timestamp_ms: u64, now_ms: u64) -> String {
    let elapsed = now_ms.saturating_sub(timestamp_ms);
    if elapsed < MINUTE_MS {
        "Just now".to_string()
    } else if elapsed < HOUR_MS {
        format!("{}m ago", elapsed / MINUTE_MS)
    } else if elapsed < DAY_MS {
        format!("{}h ago", elapsed / HOUR_MS)
    } else {
        match Utc.timestamp_millis_opt(timestamp_ms as i64).single() {
            Some(at) => at.format("%Y-%m-%d").to_string(),
            None => "Unknown date".to_string(),
        }
    }
}

/// Block explorer link for `hash`; Etherscan when the chain is unknown.
pub fn explorer_tx_url(chain_id: Option<&str>, hash: &str) -> String {
    let base = chain_id
        .and_then(chain_info)
        .map_or(DEFAULT_EXPLORER, |chain| chain.explorer);
    format!("{base}/tx/{hash}")
}
