//! Error definitions shared by the session manager and the coordinator.

use std::fmt;
use thiserror::Error;

use crate::provider::types::{
    ProviderError, INTERNAL_ERROR_CODE, REQUEST_PENDING_CODE, USER_REJECTED_CODE,
};

/// What the user was trying to do when a provider call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Connect,
    Refresh,
    EstimateGas,
    Transaction,
}

impl Action {
    /// Message shown when the provider gave no text of its own.
    pub const fn fallback_message(self) -> &'static str {
        match self {
            Self::Connect => "Failed to connect wallet",
            Self::Refresh => "Failed to refresh wallet",
            Self::EstimateGas => "Failed to estimate gas",
            Self::Transaction => "Transaction failed",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connect => "Connection",
            Self::Refresh => "Refresh",
            Self::EstimateGas => "Gas estimate",
            Self::Transaction => "Transaction",
        })
    }
}

/// Form and field checks that fail before any provider call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid recipient address")]
    InvalidAddress,

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    #[error("{0} is required")]
    Required(&'static str),

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Passwords do not match")]
    PasswordMismatch,
}

/// Errors surfaced by wallet and transaction operations.
///
/// All of them are recoverable; callers record them as UI state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WalletError {
    /// No wallet provider is installed.
    #[error("No wallet provider found. Install a browser wallet such as MetaMask to continue.")]
    ProviderUnavailable,

    /// The user declined a wallet prompt.
    #[error("{0} rejected by user")]
    UserRejected(Action),

    /// A prompt of the same kind is already open.
    #[error("{0} request already pending")]
    RequestAlreadyPending(Action),

    /// The wallet exposed no accounts.
    #[error("No accounts found")]
    NoAccounts,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The wallet reported an internal error while submitting.
    #[error("Internal error")]
    Internal,

    /// Any other provider-reported failure.
    #[error("{message}")]
    Rpc { code: Option<i64>, message: String },
}

impl WalletError {
    /// Map a provider failure into the taxonomy for `action`.
    pub fn from_provider(error: ProviderError, action: Action) -> Self {
        match error {
            ProviderError::Rpc { code, .. } if code == USER_REJECTED_CODE => {
                Self::UserRejected(action)
            }
            ProviderError::Rpc { code, .. } if code == REQUEST_PENDING_CODE => {
                Self::RequestAlreadyPending(action)
            }
            ProviderError::Rpc { code, .. }
                if code == INTERNAL_ERROR_CODE && action == Action::Transaction =>
            {
                Self::Internal
            }
            ProviderError::Rpc { code, message } => Self::Rpc {
                code: Some(code),
                message: if message.trim().is_empty() {
                    action.fallback_message().to_string()
                } else {
                    message
                },
            },
            other => Self::Rpc {
                code: None,
                message: other.to_string(),
            },
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Result type for wallet operations.
pub type WalletResult<T> = Result<T, WalletError>;
