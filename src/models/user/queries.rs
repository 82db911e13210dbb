use sqlx::PgPool;

use crate::errors::AppError;
use super::types::*;

pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, password_hash, display_name, role, is_active \
         FROM users WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;
    Ok(user)
}

pub async fn create(pool: &PgPool, new: &NewUser) -> Result<i64, AppError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO users (username, password_hash, display_name, role) \
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(&new.username)
    .bind(&new.password_hash)
    .bind(&new.display_name)
    .bind(new.role.as_str())
    .fetch_one(pool)
    .await?;
    Ok(id)
}

pub async fn count_admins(pool: &PgPool) -> Result<i64, AppError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM users WHERE role = 'admin' AND is_active",
    )
    .fetch_one(pool)
    .await?;
    Ok(count)
}
