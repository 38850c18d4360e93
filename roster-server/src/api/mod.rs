//! HTTP API handlers for roster-server

pub mod departments;
pub mod health;
pub mod upload;
pub mod users;

pub use departments::department_routes;
pub use health::health_routes;
pub use upload::upload_routes;
pub use users::user_routes;
