//! Transaction data model.

use alloy::primitives::{Bytes, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::provider::types::ReceiptSummary;

/// A transfer the user wants to make. Built per call, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionRequest {
    /// Recipient address as typed.
    pub to: String,
    /// Amount in ether, as decimal text.
    pub value_eth: String,
    pub gas_limit: Option<U256>,
    pub gas_price: Option<U256>,
    pub data: Option<Bytes>,
}

impl TransactionRequest {
    pub fn new(to: impl Into<String>, value_eth: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            value_eth: value_eth.into(),
            ..Self::default()
        }
    }

    /// Pin the gas parameters from a previous estimate.
    pub fn with_estimate(mut self, estimate: &GasEstimate) -> Self {
        self.gas_limit = Some(estimate.gas_limit);
        self.gas_price = Some(estimate.gas_price);
        self
    }

    pub fn with_data(mut self, data: Bytes) -> Self {
        self.data = Some(data);
        self
    }
}

/// Fee quote for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GasEstimate {
    pub gas_limit: U256,
    pub gas_price: U256,
    /// `gas_limit * gas_price` in ether, exact.
    pub estimated_fee_eth: String,
}

/// Lifecycle of a submitted transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Failed,
}

impl TransactionStatus {
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Whether moving to `next` is allowed: only `Pending` may change, and
    /// only to a terminal state.
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(self, Self::Pending) && next.is_terminal()
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submitted transaction as tracked by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub hash: String,
    pub from: String,
    pub to: String,
    pub value_eth: String,
    pub gas_used: Option<u64>,
    pub status: TransactionStatus,
    /// Submission time, milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl TransactionRecord {
    /// Apply a mined receipt. Returns the new status when it changed.
    ///
    /// Records already in a terminal state are left untouched.
    pub fn apply_receipt(&mut self, receipt: &ReceiptSummary) -> Option<TransactionStatus> {
        let next = if receipt.succeeded() {
            TransactionStatus::Confirmed
        } else {
            TransactionStatus::Failed
        };
        if !self.status.can_transition_to(next) {
            return None;
        }
        self.status = next;
        self.gas_used = receipt.gas_used();
        Some(next)
    }
}
