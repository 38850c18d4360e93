//! User queries and the SQLite import batch

use async_trait::async_trait;
use roster_common::{Degree, NewUser, User, UserUpdate};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use thiserror::Error;
use tracing::{info, warn};

use crate::import::UserBatch;

/// Single-record operation failures
#[derive(Debug, Error)]
pub enum RecordError {
    /// Another user already owns the requested email
    #[error("Email {email} already belongs to user {owner}")]
    EmailConflict { email: String, owner: String },

    #[error("No user found with id {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

const SELECT_USERS: &str = r#"
    SELECT u.id, u.name, u.email, u.dept, d.dept_short, u.year, u.degree
    FROM m_users u
    LEFT JOIN m_departments d ON u.dept = d.id
"#;

/// All users with their department code, ordered by id
///
/// A missing department yields `dept_short: None`. Rows that fail to
/// decode are logged and left out.
pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>, sqlx::Error> {
    let rows = sqlx::query(&format!("{} ORDER BY u.id", SELECT_USERS))
        .fetch_all(pool)
        .await?;

    Ok(rows
        .iter()
        .filter_map(|row| match user_from_row(row) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Error scanning user row: {}", e);
                None
            }
        })
        .collect())
}

/// One user by id
pub async fn get_user(pool: &SqlitePool, id: &str) -> Result<Option<User>, sqlx::Error> {
    let row = sqlx::query(&format!("{} WHERE u.id = ?", SELECT_USERS))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(user_from_row).transpose()
}

/// Overwrite the editable fields of an existing user
///
/// Fails with `EmailConflict` if a different user already has the email,
/// and with `NotFound` if `id` does not exist. Nothing is written in either
/// case.
pub async fn update_user(
    pool: &SqlitePool,
    id: &str,
    update: &UserUpdate,
) -> Result<(), RecordError> {
    let mut tx = pool.begin().await?;

    let owner: Option<String> =
        sqlx::query_scalar("SELECT id FROM m_users WHERE email = ? AND id != ? LIMIT 1")
            .bind(&update.email)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

    if let Some(owner) = owner {
        return Err(RecordError::EmailConflict {
            email: update.email.clone(),
            owner,
        });
    }

    let result = sqlx::query(
        "UPDATE m_users SET name = ?, email = ?, dept = ?, year = ?, degree = ? WHERE id = ?",
    )
    .bind(&update.name)
    .bind(&update.email)
    .bind(update.dept)
    .bind(&update.year)
    .bind(update.degree.as_str())
    .bind(id)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RecordError::NotFound(id.to_string()));
    }

    tx.commit().await?;

    info!(user_id = %id, "User updated");
    Ok(())
}

/// Delete a user by id
pub async fn delete_user(pool: &SqlitePool, id: &str) -> Result<(), RecordError> {
    let result = sqlx::query("DELETE FROM m_users WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RecordError::NotFound(id.to_string()));
    }

    info!(user_id = %id, "User deleted");
    Ok(())
}

fn user_from_row(row: &SqliteRow) -> Result<User, sqlx::Error> {
    let degree: String = row.try_get("degree")?;

    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        dept: row.try_get("dept")?,
        dept_short: row.try_get("dept_short")?,
        year: row.try_get("year")?,
        degree: Degree::normalize(&degree),
    })
}

/// Import batch backed by one SQLite transaction
///
/// SQLite rolls back only the failing statement on a constraint error, so a
/// rejected row leaves the transaction open for the rows after it.
pub struct SqliteUserBatch {
    tx: Transaction<'static, Sqlite>,
}

impl SqliteUserBatch {
    pub async fn begin(pool: &SqlitePool) -> Result<Self, sqlx::Error> {
        Ok(Self {
            tx: pool.begin().await?,
        })
    }
}

#[async_trait]
impl UserBatch for SqliteUserBatch {
    async fn upsert(&mut self, user: &NewUser) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO m_users (id, name, email, dept, year, degree)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                email = excluded.email,
                dept = excluded.dept,
                year = excluded.year,
                degree = excluded.degree,
                status = '0'
            "#,
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.dept)
        .bind(&user.year)
        .bind(user.degree.as_str())
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }
}
