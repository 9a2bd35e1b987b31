use sqlx::PgPool;

pub const CREATE_USERS_TABLE: &str = "\
    CREATE TABLE IF NOT EXISTS users (
        id SERIAL PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        email VARCHAR(100) UNIQUE NOT NULL
    )";

/// Creates the `users` table unless it already exists.
pub async fn ensure_users_table(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(CREATE_USERS_TABLE).execute(pool).await?;
    Ok(())
}
