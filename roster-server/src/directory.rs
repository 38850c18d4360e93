//! Department directory
//!
//! Snapshot of active department codes, loaded once at startup and shared
//! read-only with every handler. Departments added or renamed afterwards are
//! not visible until the process restarts.

use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use tracing::{info, warn};

/// Uppercased department short code → department id
#[derive(Debug, Clone, Default)]
pub struct DepartmentDirectory {
    by_code: HashMap<String, i64>,
}

impl DepartmentDirectory {
    /// Build the snapshot from all active departments
    ///
    /// A failing query is returned to the caller (fatal at startup). Rows
    /// that fail to decode are logged and skipped.
    pub async fn load(pool: &SqlitePool) -> Result<Self, sqlx::Error> {
        let rows = sqlx::query("SELECT id, dept_short FROM m_departments WHERE status = '1'")
            .fetch_all(pool)
            .await?;

        let mut by_code = HashMap::with_capacity(rows.len());
        for row in &rows {
            let decoded = row
                .try_get::<i64, _>("id")
                .and_then(|id| Ok((id, row.try_get::<String, _>("dept_short")?)));

            match decoded {
                Ok((id, code)) => {
                    by_code.insert(normalize_code(&code), id);
                }
                Err(e) => warn!("Could not decode department row, skipping: {}", e),
            }
        }

        info!("Loaded {} departments into directory", by_code.len());
        Ok(Self { by_code })
    }

    /// Build a snapshot from `(code, id)` pairs
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: AsRef<str>,
    {
        Self {
            by_code: entries
                .into_iter()
                .map(|(code, id)| (normalize_code(code.as_ref()), id))
                .collect(),
        }
    }

    /// Department id for a short code, ignoring case and surrounding spaces
    pub fn resolve(&self, code: &str) -> Option<i64> {
        self.by_code.get(&normalize_code(code)).copied()
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
