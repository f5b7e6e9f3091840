//! Identity adapters: Google sign-in and email/password forms.
//!
//! Every path ends in a [`User`], the record the application shell persists.

pub mod credentials;
pub mod google;
pub mod user;

pub use credentials::{login, request_password_reset, signup, validate_email};
pub use google::{decode_credential, GoogleIdentity, GoogleSignIn, IdentityError, IdentityEvent};
pub use user::{AccountKind, User};
