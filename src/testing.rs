//! In-memory implementations of the store traits, shared by the unit tests.
//! They mirror the semantics the Postgres stores get from SQL: exact-match
//! token lookup, owner-scoped record queries, (date desc, created_at desc)
//! ordering.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use axum::async_trait;
use bytes::Bytes;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::store::{AuthToken, TokenStore};
use crate::records::store::{HealthRecord, RecordStore};
use crate::storage::FileStore;
use crate::users::store::{User, UserStore};

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
    id_lookups: AtomicUsize,
}

impl MemoryUserStore {
    /// How many times the gate resolved a user by id; used to assert that
    /// rejected requests never reach user resolution.
    pub fn id_lookups(&self) -> usize {
        self.id_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        self.id_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create(&self, name: &str, email: &str, password_hash: &str) -> anyhow::Result<User> {
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            created_at: now,
            updated_at: now,
        };
        self.users.lock().unwrap().push(user.clone());
        Ok(user)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        name: &str,
        email: &str,
    ) -> anyhow::Result<Option<User>> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.name = name.into();
                user.email = email.into();
                user.updated_at = OffsetDateTime::now_utc();
                Ok(Some(user.clone()))
            }
            None => Ok(None),
        }
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> anyhow::Result<Option<User>> {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password_hash = password_hash.into();
                user.updated_at = OffsetDateTime::now_utc();
                Ok(Some(user.clone()))
            }
            None => Ok(None),
        }
    }
}

#[derive(Default)]
pub struct MemoryTokenStore {
    rows: Mutex<Vec<AuthToken>>,
    lookups: AtomicUsize,
}

impl MemoryTokenStore {
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn count_for(&self, user_id: Uuid) -> usize {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id)
            .count()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn find_active(&self, user_id: Uuid, token: &str) -> anyhow::Result<Option<AuthToken>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.user_id == user_id && t.token == token)
            .cloned())
    }

    async fn create(&self, user_id: Uuid, token: &str) -> anyhow::Result<AuthToken> {
        let row = AuthToken {
            id: Uuid::new_v4(),
            user_id,
            token: token.into(),
            created_at: OffsetDateTime::now_utc(),
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn invalidate_all(&self, user_id: Uuid) -> anyhow::Result<u64> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|t| t.user_id != user_id);
        Ok((before - rows.len()) as u64)
    }
}

#[derive(Default)]
pub struct MemoryRecordStore {
    rows: Mutex<Vec<HealthRecord>>,
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, record: &HealthRecord) -> anyhow::Result<HealthRecord> {
        self.rows.lock().unwrap().push(record.clone());
        Ok(record.clone())
    }

    async fn find_owned(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<HealthRecord>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id && r.user_id == user_id)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<HealthRecord>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn list(&self, user_id: Uuid) -> anyhow::Result<Vec<HealthRecord>> {
        let mut rows: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.date, b.created_at).cmp(&(a.date, a.created_at)));
        Ok(rows)
    }

    async fn search(&self, user_id: Uuid, keyword: &str) -> anyhow::Result<Vec<HealthRecord>> {
        let keyword = keyword.to_lowercase();
        let mut rows: Vec<_> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| {
                r.user_id == user_id
                    && r.notes
                        .as_deref()
                        .map_or(false, |n| n.to_lowercase().contains(&keyword))
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| (b.date, b.created_at).cmp(&(a.date, a.created_at)));
        Ok(rows)
    }

    async fn update(&self, record: &HealthRecord) -> anyhow::Result<HealthRecord> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|r| r.id == record.id) {
            Some(row) => {
                *row = record.clone();
                Ok(record.clone())
            }
            None => anyhow::bail!("record {} not found", record.id),
        }
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<()> {
        self.rows.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryFileStore {
    files: Mutex<HashMap<String, Bytes>>,
}

impl MemoryFileStore {
    pub fn contains(&self, filename: &str) -> bool {
        self.files.lock().unwrap().contains_key(filename)
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn store(&self, filename: &str, body: Bytes) -> anyhow::Result<()> {
        self.files.lock().unwrap().insert(filename.into(), body);
        Ok(())
    }

    async fn delete(&self, filename: &str) -> anyhow::Result<bool> {
        Ok(self.files.lock().unwrap().remove(filename).is_some())
    }

    async fn load(&self, filename: &str) -> anyhow::Result<Option<Bytes>> {
        Ok(self.files.lock().unwrap().get(filename).cloned())
    }
}
