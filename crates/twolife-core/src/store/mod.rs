//! Persistence layer
//!
//! Two collaborators share one backend: the lead store (create/list/get/
//! delete over [`Lead`]) and the admin credential store. Both report an
//! availability signal that can be queried without writing, so the intake
//! workflow can fail fast before any side effect.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │               SqliteStore                │
//! ├──────────────────────────────────────────┤
//! │        leads        │  admin_credentials │
//! │ (created_at_ms DESC)│   (unique username)│
//! └──────────────────────────────────────────┘
//! ```
//!
//! `MemoryStore` implements the same traits for tests and ephemeral runs.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::auth::AdminCredential;
use crate::error::StoreError;
use crate::lead::{Lead, LeadId};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Lead persistence collaborator
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Connectivity signal; must not write
    async fn is_available(&self) -> bool;

    /// Persist a new lead
    async fn create(&self, lead: Lead) -> StoreResult<Lead>;

    /// All leads, newest first. Ties on `created_at` keep the later insert first.
    async fn list(&self) -> StoreResult<Vec<Lead>>;

    /// Look a single lead up
    async fn get(&self, id: &LeadId) -> StoreResult<Option<Lead>>;

    /// Permanently remove a lead. Returns whether a row was removed;
    /// removing an unknown id is not an error.
    async fn delete_by_id(&self, id: &LeadId) -> StoreResult<bool>;
}

/// Admin credential persistence collaborator
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<AdminCredential>>;

    /// Insert a credential. Returns `false` if the username already exists.
    async fn insert_credential(&self, credential: AdminCredential) -> StoreResult<bool>;
}
