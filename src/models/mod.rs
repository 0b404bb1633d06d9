//! Data models for Sovereign.

mod client;
mod contract;
mod testimonial;
mod vault;

use thiserror::Error;

pub use client::{Client, NewClient};
pub use contract::{Contract, ContractStatus, NewContract};
pub use testimonial::{
    generate_token, is_valid_token, NewTestimonial, Testimonial, TestimonialStatus,
    TestimonialSubmission, TransitionError, TOKEN_LENGTH, TOKEN_TTL_DAYS,
};
pub use vault::{Vault, VaultUpdate};

/// A request field breaks a model rule.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ValidationError(pub String);

pub(crate) fn require_text(field: &str, value: &str, max_chars: usize) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if len == 0 {
        return Err(ValidationError(format!("{} is required", field)));
    }
    if len > max_chars {
        return Err(ValidationError(format!(
            "{} must be at most {} characters",
            field, max_chars
        )));
    }
    Ok(())
}

pub(crate) fn check_email(field: &str, value: &str) -> Result<(), ValidationError> {
    let valid = value
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && domain.contains('.') && !value.contains(' '))
        .unwrap_or(false);
    if valid {
        Ok(())
    } else {
        Err(ValidationError(format!("{} is not a valid email address", field)))
    }
}
