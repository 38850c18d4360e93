//! # Roster Common Library
//!
//! Shared code for the roster service:
//! - Domain models (departments, users, degrees)
//! - Database initialization and schema
//! - Configuration resolution
//! - Common error type

pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use error::{Error, Result};
pub use models::{Degree, Department, NewUser, User, UserUpdate};
