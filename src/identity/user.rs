//! Normalized user record shared by every sign-in path.

use serde::{Deserialize, Serialize};

use crate::identity::google::GoogleIdentity;
use crate::wallet::Web3User;

/// The logged-in user as persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
}

/// How the user signed in, derived from which fields are present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    Web3,
    Google,
    Traditional,
}

impl AccountKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Web3 => "Web3 Account",
            Self::Google => "Google Account",
            Self::Traditional => "Traditional Account",
        }
    }
}

impl User {
    pub fn traditional(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: Some(email.into()),
            address: None,
            balance: None,
            chain_id: None,
        }
    }

    /// Accounts carrying a wallet address are Web3 accounts, email-only
    /// accounts are Google accounts, anything else is traditional.
    pub fn account_kind(&self) -> AccountKind {
        if self.address.is_some() {
            AccountKind::Web3
        } else if self.email.is_some() {
            AccountKind::Google
        } else {
            AccountKind::Traditional
        }
    }
}

impl From<Web3User> for User {
    fn from(user: Web3User) -> Self {
        Self {
            name: user.name,
            email: None,
            address: Some(user.address),
            balance: Some(user.balance),
            chain_id: Some(user.chain_id),
        }
    }
}

impl From<GoogleIdentity> for User {
    fn from(identity: GoogleIdentity) -> Self {
        Self::traditional(identity.name, identity.email)
    }
}
