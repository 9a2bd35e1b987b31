use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::{Connection, FromRow, PgPool};

use crate::config::Config;
use crate::error::GatewayError;
use crate::schema;
use crate::user::{NewUser, User};

const SELECT_USERS: &str = "SELECT id, name, email FROM users";
const INSERT_USER: &str = "INSERT INTO users (name, email) VALUES ($1, $2) RETURNING id";

/// Outcome of decoding a single row of a listing.
pub type RowResult = Result<User, GatewayError>;

/// Database access shared by every request handler.
///
/// Implementations must be safe to call from many workers at once; the
/// PostgreSQL implementation relies on the pool for that.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn ping(&self) -> Result<(), GatewayError>;

    /// Reads every user. The outer error means the query itself failed; each
    /// row is decoded on its own so one bad row does not hide the others.
    async fn list_users(&self) -> Result<Vec<RowResult>, GatewayError>;

    /// Inserts the user and returns the id the store generated for it.
    async fn insert_user(&self, user: &NewUser) -> Result<i32, GatewayError>;
}

pub struct PgGateway {
    pool: PgPool,
}

impl PgGateway {
    /// Creates the pool without connecting; call [`Gateway::ping`] to verify it.
    pub fn open(config: &Config) -> Self {
        Self {
            pool: PgPool::connect_lazy_with(config.connect_options()),
        }
    }

    pub async fn ensure_schema(&self) -> Result<(), GatewayError> {
        schema::ensure_users_table(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl Gateway for PgGateway {
    async fn ping(&self) -> Result<(), GatewayError> {
        let mut conn = self.pool.acquire().await?;
        conn.ping().await?;
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<RowResult>, GatewayError> {
        let mut rows = sqlx::query(SELECT_USERS).fetch(&self.pool);
        let mut users = Vec::new();
        while let Some(row) = rows.try_next().await? {
            users.push(User::from_row(&row).map_err(GatewayError::from));
        }
        Ok(users)
    }

    async fn insert_user(&self, user: &NewUser) -> Result<i32, GatewayError> {
        let id: i32 = sqlx::query_scalar(INSERT_USER)
            .bind(&user.name)
            .bind(&user.email)
            .fetch_one(&self.pool)
            .await?;
        Ok(id)
    }
}
