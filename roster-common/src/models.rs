//! Domain models shared by the store and the HTTP layer

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Degree programme a user is enrolled in
///
/// Closed set. Free-text labels from spreadsheets are folded into it by
/// [`Degree::normalize`]; anything unrecognized becomes `UG`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Degree {
    #[default]
    Ug,
    Pg,
    Mba,
    Phd,
}

impl Degree {
    /// All variants, in display order
    pub const ALL: [Degree; 4] = [Degree::Ug, Degree::Pg, Degree::Mba, Degree::Phd];

    /// Map a free-text degree label to a `Degree`
    ///
    /// Case-insensitive and whitespace-trimmed. Never fails: unknown labels
    /// fall back to `UG`.
    pub fn normalize(label: &str) -> Self {
        match label.trim().to_uppercase().as_str() {
            "UG" | "B.TECH" | "BTECH" => Degree::Ug,
            "PG" | "M.TECH" | "MTECH" => Degree::Pg,
            "MBA" => Degree::Mba,
            "PHD" => Degree::Phd,
            _ => Degree::Ug,
        }
    }

    /// Stored and displayed form (`"UG"`, `"PG"`, `"MBA"`, `"PHD"`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Degree::Ug => "UG",
            Degree::Pg => "PG",
            Degree::Mba => "MBA",
            Degree::Phd => "PHD",
        }
    }
}

impl fmt::Display for Degree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Degree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Degree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Degree::normalize(&label))
    }
}

/// Row of `m_departments`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Department {
    pub id: i64,
    pub dept_short: String,
    pub dept_name: String,
    pub active: bool,
}

/// User record as returned to clients
///
/// `dept_short` comes from a LEFT JOIN and is `None` when the referenced
/// department row is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub dept: i64,
    #[serde(rename = "deptName")]
    pub dept_short: Option<String>,
    pub year: String,
    pub degree: Degree,
}

/// Fully validated row staged for upsert by the bulk import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub dept: i64,
    pub year: String,
    pub degree: Degree,
}

/// Editable fields of a single user (PUT body)
///
/// Unknown fields such as `id` or `deptName` are ignored, so a client can
/// send back a record it received from the list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserUpdate {
    pub name: String,
    pub email: String,
    pub dept: i64,
    pub year: String,
    pub degree: Degree,
}

impl UserUpdate {
    /// Copy with surrounding whitespace removed from the text fields
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            dept: self.dept,
            year: self.year.trim().to_string(),
            degree: self.degree,
        }
    }
}
