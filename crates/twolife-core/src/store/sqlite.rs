//! SqliteStore: SQLite WAL persistence for leads and admin credentials

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

use super::{CredentialStore, LeadStore, StoreResult};
use crate::auth::AdminCredential;
use crate::lead::{Lead, LeadId};

/// SQLite-backed store. One connection, serialized behind a mutex.
///
/// Statements run on the blocking thread pool.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open (or create) the database in WAL mode and run migrations.
    ///
    /// `":memory:"` opens a private in-memory database.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let in_memory = path.as_os_str() == ":memory:";
        if !in_memory {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Creating database directory '{}'", parent.display()))?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Opening SQLite '{}'", path.display()))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("Configuring SQLite PRAGMAs")?;
        migrate(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open a private in-memory database
    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    /// Run `op` against the connection on the blocking thread pool
    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            op(&guard)
        })
        .await
        .context("SQLite task aborted")?
    }

    /// Row counts per table
    pub fn stats(&self) -> Result<serde_json::Value> {
        let conn = self.conn.lock();
        let leads: i64 = conn.query_row("SELECT COUNT(*) FROM leads", [], |row| row.get(0))?;
        let admins: i64 =
            conn.query_row("SELECT COUNT(*) FROM admin_credentials", [], |row| row.get(0))?;

        Ok(serde_json::json!({
            "leads": leads,
            "admin_credentials": admins,
        }))
    }
}

fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS leads (
            seq            INTEGER PRIMARY KEY AUTOINCREMENT,
            id             TEXT NOT NULL UNIQUE,
            name           TEXT NOT NULL,
            email          TEXT NOT NULL,
            message        TEXT NOT NULL,
            accepted_terms INTEGER NOT NULL,
            created_at_ms  INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_leads_created_at
            ON leads(created_at_ms DESC, seq DESC);

        CREATE TABLE IF NOT EXISTS admin_credentials (
            id             TEXT PRIMARY KEY,
            username       TEXT NOT NULL UNIQUE,
            password_hash  TEXT NOT NULL,
            created_at_ms  INTEGER NOT NULL
        );
        ",
    )
    .context("Migrating SQLite schema")
}

fn ping(conn: &Connection) -> Result<()> {
    conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
        .context("SQLite ping")?;
    Ok(())
}

fn insert_lead(conn: &Connection, lead: &Lead) -> Result<()> {
    conn.execute(
        "INSERT INTO leads (id, name, email, message, accepted_terms, created_at_ms)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            lead.id.as_str(),
            lead.name,
            lead.email,
            lead.message,
            lead.accepted_terms,
            lead.created_at.timestamp_millis()
        ],
    )
    .context("INSERT leads")?;
    Ok(())
}

fn select_leads(conn: &Connection) -> Result<Vec<Lead>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, message, accepted_terms, created_at_ms
         FROM leads
         ORDER BY created_at_ms DESC, seq DESC",
    )?;

    let rows = stmt.query_map([], row_to_lead).context("Query leads")?;

    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("Collecting leads")
}

fn select_lead(conn: &Connection, id: &LeadId) -> Result<Option<Lead>> {
    conn.query_row(
        "SELECT id, name, email, message, accepted_terms, created_at_ms
         FROM leads WHERE id = ?1",
        params![id.as_str()],
        row_to_lead,
    )
    .optional()
    .context("Query lead by id")
}

fn remove_lead(conn: &Connection, id: &LeadId) -> Result<bool> {
    let removed = conn
        .execute("DELETE FROM leads WHERE id = ?1", params![id.as_str()])
        .context("DELETE leads")?;
    Ok(removed > 0)
}

fn select_credential(conn: &Connection, username: &str) -> Result<Option<AdminCredential>> {
    conn.query_row(
        "SELECT id, username, password_hash, created_at_ms
         FROM admin_credentials WHERE username = ?1",
        params![username],
        |row| {
            let created_at_ms: i64 = row.get(3)?;
            Ok(AdminCredential {
                id: row.get(0)?,
                username: row.get(1)?,
                password_hash: row.get(2)?,
                created_at: millis_to_datetime(created_at_ms),
            })
        },
    )
    .optional()
    .context("Query admin_credentials")
}

fn insert_credential_row(conn: &Connection, credential: &AdminCredential) -> Result<bool> {
    let inserted = conn
        .execute(
            "INSERT OR IGNORE INTO admin_credentials (id, username, password_hash, created_at_ms)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                credential.id,
                credential.username,
                credential.password_hash,
                credential.created_at.timestamp_millis()
            ],
        )
        .context("INSERT admin_credentials")?;
    Ok(inserted > 0)
}

fn row_to_lead(row: &rusqlite::Row<'_>) -> rusqlite::Result<Lead> {
    let id: String = row.get(0)?;
    let created_at_ms: i64 = row.get(5)?;
    Ok(Lead {
        id: LeadId(id),
        name: row.get(1)?,
        email: row.get(2)?,
        message: row.get(3)?,
        accepted_terms: row.get(4)?,
        created_at: millis_to_datetime(created_at_ms),
    })
}

fn millis_to_datetime(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

#[async_trait]
impl LeadStore for SqliteStore {
    async fn is_available(&self) -> bool {
        match self.blocking(ping).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("SQLite store unavailable: {:#}", e);
                false
            }
        }
    }

    async fn create(&self, lead: Lead) -> StoreResult<Lead> {
        let lead = self
            .blocking(move |conn| {
                insert_lead(conn, &lead)?;
                Ok(lead)
            })
            .await?;
        Ok(lead)
    }

    async fn list(&self) -> StoreResult<Vec<Lead>> {
        Ok(self.blocking(select_leads).await?)
    }

    async fn get(&self, id: &LeadId) -> StoreResult<Option<Lead>> {
        let id = id.clone();
        Ok(self.blocking(move |conn| select_lead(conn, &id)).await?)
    }

    async fn delete_by_id(&self, id: &LeadId) -> StoreResult<bool> {
        let id = id.clone();
        Ok(self.blocking(move |conn| remove_lead(conn, &id)).await?)
    }
}

#[async_trait]
impl CredentialStore for SqliteStore {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<AdminCredential>> {
        let username = username.to_string();
        Ok(self
            .blocking(move |conn| select_credential(conn, &username))
            .await?)
    }

    async fn insert_credential(&self, credential: AdminCredential) -> StoreResult<bool> {
        Ok(self
            .blocking(move |conn| insert_credential_row(conn, &credential))
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lead::LeadFields;

    fn temp_store() -> SqliteStore {
        SqliteStore::in_memory().expect("in-memory SQLite should open")
    }

    fn lead_at(name: &str, ms: i64) -> Lead {
        Lead::create_at(
            LeadFields {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                message: "Busco un sedán".to_string(),
            },
            millis_to_datetime(ms),
        )
    }

    #[tokio::test]
    async fn test_create_and_get_round_trip() {
        let store = temp_store();
        let lead = Lead::create(LeadFields {
            name: "Juan".into(),
            email: "juan@example.com".into(),
            message: "Busco un sedán".into(),
        });

        store.create(lead.clone()).await.unwrap();
        let loaded = store.get(&lead.id).await.unwrap().expect("lead should exist");
        assert_eq!(loaded, lead);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = temp_store();
        store.create(lead_at("Ana", 1_000)).await.unwrap();
        store.create(lead_at("Beto", 3_000)).await.unwrap();
        store.create(lead_at("Carla", 2_000)).await.unwrap();

        let names: Vec<String> = store.list().await.unwrap().into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["Beto", "Carla", "Ana"]);
    }

    #[tokio::test]
    async fn test_equal_timestamps_keep_later_insert_first() {
        let store = temp_store();
        store.create(lead_at("A", 5_000)).await.unwrap();
        store.create(lead_at("B", 5_000)).await.unwrap();

        let names: Vec<String> = store.list().await.unwrap().into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[tokio::test]
    async fn test_list_is_idempotent() {
        let store = temp_store();
        store.create(lead_at("A", 1)).await.unwrap();
        store.create(lead_at("B", 2)).await.unwrap();

        let first = store.list().await.unwrap();
        let second = store.list().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_delete_removes_lead() {
        let store = temp_store();
        let lead = store.create(lead_at("A", 1)).await.unwrap();

        assert!(store.delete_by_id(&lead.id).await.unwrap());
        assert!(store.list().await.unwrap().is_empty());

        // Deleting again is not an error
        assert!(!store.delete_by_id(&lead.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_id_is_a_backend_error() {
        let store = temp_store();
        let lead = lead_at("A", 1);
        store.create(lead.clone()).await.unwrap();
        assert!(store.create(lead).await.is_err());
    }

    #[tokio::test]
    async fn test_credentials_unique_username() {
        let store = temp_store();
        let cred = AdminCredential::new("admin", "$2b$04$hash");

        assert!(store.insert_credential(cred.clone()).await.unwrap());
        assert!(!store
            .insert_credential(AdminCredential::new("admin", "$2b$04$other"))
            .await
            .unwrap());

        let found = store.find_by_username("admin").await.unwrap().unwrap();
        assert_eq!(found.id, cred.id);
        assert_eq!(found.password_hash, "$2b$04$hash");
        assert!(store.find_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_available_and_stats() {
        let store = temp_store();
        assert!(store.is_available().await);
        store.create(lead_at("A", 1)).await.unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats["leads"], 1);
        assert_eq!(stats["admin_credentials"], 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_writers_share_the_connection() {
        let store = Arc::new(temp_store());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.create(lead_at(&format!("L{}", i), i)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let leads = store.list().await.unwrap();
        assert_eq!(leads.len(), 16);
        assert_eq!(leads[0].name, "L15");
    }

    #[test]
    fn test_usable_from_a_current_thread_runtime() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let store = temp_store();
        rt.block_on(async {
            store.create(lead_at("A", 1)).await.unwrap();
            assert!(store.is_available().await);
            assert_eq!(store.list().await.unwrap().len(), 1);
        });
    }

    #[tokio::test]
    async fn test_file_backed_store_persists() {
        let dir = std::env::temp_dir().join(format!("twolife-test-{}", uuid::Uuid::new_v4()));
        let path = dir.join("leads.db");

        let lead = lead_at("Persisted", 42);
        {
            let store = SqliteStore::open(&path).unwrap();
            store.create(lead.clone()).await.unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.list().await.unwrap(), vec![lead]);

        let _ = std::fs::remove_dir_all(dir);
    }
}
