//! In-memory [`Gateway`] for handler tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::gateway::{Gateway, RowResult};
use crate::user::{NewUser, User};

#[derive(Default)]
pub struct MemoryGateway {
    users: Mutex<Vec<User>>,
    offline: AtomicBool,
    failing_writes: AtomicBool,
    undecodable_rows: AtomicUsize,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail as if the server were unreachable.
    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn fail_writes(&self) {
        self.failing_writes.store(true, Ordering::SeqCst);
    }

    /// Appends rows that fail to decode to every listing.
    pub fn add_undecodable_rows(&self, count: usize) {
        self.undecodable_rows.fetch_add(count, Ordering::SeqCst);
    }

    pub fn stored(&self) -> Vec<User> {
        self.users.lock().unwrap().clone()
    }

    fn check_online(&self) -> Result<(), GatewayError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut.into());
        }
        Ok(())
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn ping(&self) -> Result<(), GatewayError> {
        self.check_online()
    }

    async fn list_users(&self) -> Result<Vec<RowResult>, GatewayError> {
        self.check_online()?;
        let mut rows: Vec<RowResult> = self.stored().into_iter().map(Ok).collect();
        for _ in 0..self.undecodable_rows.load(Ordering::SeqCst) {
            rows.push(Err(sqlx::Error::ColumnNotFound("email".to_owned()).into()));
        }
        Ok(rows)
    }

    async fn insert_user(&self, user: &NewUser) -> Result<i32, GatewayError> {
        self.check_online()?;
        if self.failing_writes.load(Ordering::SeqCst) {
            return Err(sqlx::Error::Protocol("disk full".to_owned()).into());
        }

        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(GatewayError::Conflict {
                constraint: Some("users_email_key".to_owned()),
                message: "duplicate key value violates unique constraint \"users_email_key\""
                    .to_owned(),
            });
        }
        let id = users.iter().map(|u| u.id).max().unwrap_or(0) + 1;
        users.push(user.clone().into_user(id));
        Ok(id)
    }
}
