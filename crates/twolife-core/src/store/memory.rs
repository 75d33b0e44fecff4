//! In-memory store for tests and ephemeral deployments

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{CredentialStore, LeadStore, StoreResult};
use crate::auth::AdminCredential;
use crate::error::StoreError;
use crate::lead::{Lead, LeadId};

/// Volatile store with switchable availability and write failures
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Leads in insertion order
    leads: Arc<RwLock<Vec<Lead>>>,

    /// Credentials by username
    credentials: Arc<RwLock<HashMap<String, AdminCredential>>>,

    unavailable: AtomicBool,

    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle the connectivity signal
    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    /// Make every subsequent `create` fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of stored leads
    pub fn lead_count(&self) -> usize {
        self.leads.read().len()
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LeadStore for MemoryStore {
    async fn is_available(&self) -> bool {
        !self.unavailable.load(Ordering::SeqCst)
    }

    async fn create(&self, lead: Lead) -> StoreResult<Lead> {
        self.check_available()?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(anyhow::anyhow!("simulated write failure")));
        }

        let mut leads = self.leads.write();
        if leads.iter().any(|l| l.id == lead.id) {
            return Err(StoreError::Backend(anyhow::anyhow!(
                "duplicate lead id {}",
                lead.id
            )));
        }
        leads.push(lead.clone());
        Ok(lead)
    }

    async fn list(&self) -> StoreResult<Vec<Lead>> {
        self.check_available()?;
        // Reverse first so the stable sort keeps later inserts ahead on ties
        let mut leads: Vec<Lead> = self.leads.read().iter().rev().cloned().collect();
        leads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(leads)
    }

    async fn get(&self, id: &LeadId) -> StoreResult<Option<Lead>> {
        self.check_available()?;
        Ok(self.leads.read().iter().find(|l| &l.id == id).cloned())
    }

    async fn delete_by_id(&self, id: &LeadId) -> StoreResult<bool> {
        self.check_available()?;
        let mut leads = self.leads.write();
        let before = leads.len();
        leads.retain(|l| &l.id != id);
        Ok(leads.len() < before)
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<AdminCredential>> {
        self.check_available()?;
        Ok(self.credentials.read().get(username).cloned())
    }

    async fn insert_credential(&self, credential: AdminCredential) -> StoreResult<bool> {
        self.check_available()?;
        let mut credentials = self.credentials.write();
        if credentials.contains_key(&credential.username) {
            return Ok(false);
        }
        credentials.insert(credential.username.clone(), credential);
        Ok(true)
    }
}
