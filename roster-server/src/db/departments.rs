//! Department queries

use roster_common::Department;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::warn;

/// Active departments ordered by display name
///
/// Rows that fail to decode are logged and left out.
pub async fn list_active_departments(pool: &SqlitePool) -> Result<Vec<Department>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, dept_short, dept_name, status
        FROM m_departments
        WHERE status = '1'
        ORDER BY dept_name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .filter_map(|row| match department_from_row(row) {
            Ok(department) => Some(department),
            Err(e) => {
                warn!("Error scanning department row: {}", e);
                None
            }
        })
        .collect())
}

fn department_from_row(row: &SqliteRow) -> Result<Department, sqlx::Error> {
    let status: String = row.try_get("status")?;

    Ok(Department {
        id: row.try_get("id")?,
        dept_short: row.try_get("dept_short")?,
        dept_name: row.try_get("dept_name")?,
        active: status == "1",
    })
}
