//! TwoLife Core - Lead capture engine for the TwoLifeCar marketplace
//!
//! Turns public contact-form submissions into stored leads, gated by a
//! proof-of-humanity check, and lets authenticated operators review them.
//!
//! # Architecture
//!
//! ```text
//!  submission
//!      │
//!      ▼
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  LeadIntake  │──▶│   Verifier   │   │  AdminGate   │◀── operator
//! │  (intake)    │   │(verification)│   │   (auth)     │
//! └──────┬───────┘   └──────────────┘   └──────┬───────┘
//!        │                                     │
//!        ▼                                     ▼
//! ┌──────────────┐                     ┌──────────────┐
//! │  LeadStore   │                     │CredentialStore│
//! │   (store)    │                     │   (store)    │
//! └──────┬───────┘                     └──────────────┘
//!        │ stored
//!        ▼
//! ┌──────────────┐
//! │Notifications │──▶ team chat, confirmation email
//! │  (notify)    │
//! └──────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use twolife_core::config::{IntakeConfig, VerificationPolicy};
//! use twolife_core::intake::LeadIntake;
//! use twolife_core::lead::LeadSubmission;
//! use twolife_core::store::MemoryStore;
//!
//! # async fn run() -> twolife_core::Result<()> {
//! let store = Arc::new(MemoryStore::new());
//! let intake = LeadIntake::new(
//!     store,
//!     IntakeConfig::new().with_policy(VerificationPolicy::FailOpen),
//! );
//!
//! let lead = intake
//!     .submit(
//!         LeadSubmission::new("Juan", "juan@example.com", "Busco un sedán")
//!             .with_accepted_terms(true),
//!     )
//!     .await?;
//! println!("stored {}", lead.id);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod intake;
pub mod lead;
pub mod notify;
pub mod store;
pub mod verification;

pub use auth::{AdminCredential, AdminGate, Credentials, Principal, SessionToken};
pub use config::{
    AuthConfig, IntakeConfig, NotificationConfig, VerificationConfig, VerificationPolicy,
};
pub use error::{
    AuthError, IntakeError, NotificationError, ReplyError, Result, StoreError, ValidationError,
};
pub use intake::LeadIntake;
pub use lead::{Lead, LeadId, LeadSubmission};
pub use notify::Notifications;
pub use store::{CredentialStore, LeadStore, MemoryStore, SqliteStore};
pub use verification::{Mechanism, RejectionReason, VerificationResult, Verifier};

/// Core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
