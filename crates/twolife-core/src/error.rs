//! Error types for TwoLife Core
//!
//! Every failure the lead workflow can produce is one of the variants below.
//! Validation and verification failures are client-correctable; storage and
//! dependency failures are server-side. Notification failures never leave
//! the fan-out except through the operator-initiated reply/test operations.

use thiserror::Error;

use crate::verification::{RejectionReason, VerifierError};

/// Result type alias for the intake workflow
pub type Result<T> = std::result::Result<T, IntakeError>;

/// Outcome of a failed lead submission
#[derive(Error, Debug)]
pub enum IntakeError {
    /// Malformed or missing input
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The verification provider rejected the proof token
    #[error("Verification rejected: {0}")]
    Verification(RejectionReason),

    /// The verification provider could not be reached or is misconfigured
    #[error("Verification unavailable: {0}")]
    VerificationUnavailable(#[from] VerifierError),

    /// The store reported itself disconnected before any side effect
    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),

    /// The lead write failed after verification passed
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl IntakeError {
    /// Whether the caller can fix the request and retry
    pub fn is_client_error(&self) -> bool {
        matches!(self, IntakeError::Validation(_) | IntakeError::Verification(_))
    }
}

/// Structural problems with an inbound submission
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Field '{0}' is required")]
    MissingField(&'static str),

    #[error("Terms and conditions must be accepted")]
    TermsNotAccepted,

    #[error("Verification token missing")]
    MissingToken,
}

impl ValidationError {
    /// Name of the offending field, for error payloads
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingField(field) => field,
            ValidationError::TermsNotAccepted => "acceptedTerms",
            ValidationError::MissingToken => "token",
        }
    }
}

/// Persistence failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store unavailable")]
    Unavailable,

    #[error("Store backend error: {0:#}")]
    Backend(#[from] anyhow::Error),
}

/// Admin authentication failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Credentials required")]
    MissingCredentials,

    #[error("Invalid username or password")]
    InvalidLogin,

    #[error("Invalid session token")]
    InvalidToken,

    #[error("Session token expired")]
    ExpiredToken,

    #[error("Invalid service key")]
    InvalidServiceKey,

    #[error("Authentication backend error: {0}")]
    Backend(String),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        AuthError::Backend(e.to_string())
    }
}

/// Outbound notification failures
#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Notification channel not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Notification transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Notification rejected by {channel} ({status}): {body}")]
    Rejected {
        channel: &'static str,
        status: u16,
        body: String,
    },
}

/// Failures of an operator reply. Unlike the fan-out these are reported.
#[derive(Error, Debug)]
pub enum ReplyError {
    #[error("Lead {0} not found")]
    LeadNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Notification(#[from] NotificationError),
}
