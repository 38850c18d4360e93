//! Record access layer
//!
//! Parameterized queries over the shared SQLite pool. Each mutating
//! operation runs in its own transaction, rolled back on any early return.

pub mod departments;
pub mod users;

pub use departments::list_active_departments;
pub use users::{delete_user, get_user, list_users, update_user, SqliteUserBatch};
