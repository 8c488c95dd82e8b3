//! Client-side input checks. Failures never reach the network.

use crate::error::{Error, Result};
use regex::Regex;
use std::sync::OnceLock;

fn email_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok())
        .as_ref()
}

/// Reject a blank required field
pub fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} is required", field)));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<()> {
    require("Email", email)?;
    let well_formed = email_pattern().is_some_and(|pattern| pattern.is_match(email.trim()));
    if !well_formed {
        return Err(Error::Validation("Please enter a valid email address".into()));
    }
    Ok(())
}

/// At least 8 characters with an uppercase letter, a lowercase letter and a digit
pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < 8 {
        return Err(Error::Validation("Password must be at least 8 characters long".into()));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(Error::Validation("Password must contain at least one uppercase letter".into()));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(Error::Validation("Password must contain at least one lowercase letter".into()));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(Error::Validation("Password must contain at least one digit".into()));
    }
    Ok(())
}

/// Six-digit one-time code
pub fn validate_otp(code: &str) -> Result<()> {
    let code = code.trim();
    if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::Validation("Verification code must be 6 digits".into()));
    }
    Ok(())
}
