//! Email/password forms.
//!
//! No credential backend exists yet: a well-formed submission is accepted and
//! turned into a [`User`].

use crate::error::ValidationError;
use crate::identity::user::User;

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(trimmed)
    }
}

/// Loose shape check: one `@`, a local part and a dotted domain.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = required("Email", email)?;
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                && !domain.ends_with('.')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

/// Sign in with email and password. The display name is the email's local part.
pub fn login(email: &str, password: &str) -> Result<User, ValidationError> {
    validate_email(email)?;
    required("Password", password)?;

    let email = email.trim();
    let name = email.split('@').next().unwrap_or(email);
    Ok(User::traditional(name, email))
}

/// Create an account. Both password fields must match.
pub fn signup(
    name: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<User, ValidationError> {
    let name = required("Name", name)?;
    validate_email(email)?;
    required("Password", password)?;
    if password != confirm_password {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(User::traditional(name, email.trim()))
}

/// Accept a password-reset request, returning the address the link goes to.
pub fn request_password_reset(email: &str) -> Result<String, ValidationError> {
    validate_email(email)?;
    let email = email.trim().to_string();
    tracing::info!(email = %email, "Password reset requested");
    Ok(email)
}
