//! Google sign-in adapter.
//!
//! The OAuth exchange happens elsewhere; this adapter receives the resulting
//! ID token, decodes its payload and forwards the identity over a channel.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::mpsc;

/// Identity claims taken from a Google ID token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GoogleIdentity {
    #[serde(rename = "sub")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub picture: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Google authentication not available")]
    Unavailable,

    #[error("Malformed credential: {0}")]
    MalformedCredential(String),

    #[error("Failed to process Google authentication")]
    Processing,
}

/// Completion events delivered to the application shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityEvent {
    SignedIn(GoogleIdentity),
    Failed(IdentityError),
}

/// Decode the payload segment of a JWT credential.
///
/// The signature is not checked here; the token comes straight from the
/// identity provider's callback.
pub fn decode_credential(credential: &str) -> Result<GoogleIdentity, IdentityError> {
    let mut segments = credential.split('.');
    let payload = match (segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_)) => payload,
        _ => {
            return Err(IdentityError::MalformedCredential(
                "expected three dot-separated segments".to_string(),
            ))
        }
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| IdentityError::MalformedCredential(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| IdentityError::MalformedCredential(e.to_string()))
}

/// Turns credential callbacks into [`IdentityEvent`]s.
#[derive(Debug, Clone)]
pub struct GoogleSignIn {
    events: mpsc::Sender<IdentityEvent>,
    client_id: Option<String>,
}

impl GoogleSignIn {
    pub fn new(events: mpsc::Sender<IdentityEvent>, client_id: Option<String>) -> Self {
        Self { events, client_id }
    }

    /// Whether a client id is configured, without which no prompt can open.
    pub fn is_available(&self) -> bool {
        self.client_id.as_deref().is_some_and(|id| !id.is_empty())
    }

    /// Start a sign-in. Fails immediately when sign-in is unavailable.
    pub async fn sign_in(&self) -> Result<(), IdentityError> {
        if self.is_available() {
            tracing::debug!("Google sign-in prompt requested");
            return Ok(());
        }
        let _ = self
            .events
            .send(IdentityEvent::Failed(IdentityError::Unavailable))
            .await;
        Err(IdentityError::Unavailable)
    }

    /// Handle the credential returned by the identity provider.
    pub async fn complete(&self, credential: &str) -> Result<(), IdentityError> {
        let event = match decode_credential(credential) {
            Ok(identity) => {
                tracing::info!(email = %identity.email, "Google sign-in completed");
                IdentityEvent::SignedIn(identity)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Rejecting Google credential");
                IdentityEvent::Failed(IdentityError::Processing)
            }
        };
        self.events
            .send(event)
            .await
            .map_err(|_| IdentityError::Processing)
    }
}
