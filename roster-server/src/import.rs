//! Bulk user import
//!
//! Pipeline: parse CSV → validate and normalize each row → resolve the
//! department code → stage an upsert → commit once.
//!
//! Rows are independent. A bad row (short, missing id, unknown department,
//! or rejected by the store) is reported and skipped; the rest of the batch
//! still goes in. Only a failed commit discards the whole batch.

use async_trait::async_trait;
use roster_common::{Degree, NewUser};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

use crate::directory::DepartmentDirectory;

/// Fields per data row: id, name, email, department, year, degree
pub const EXPECTED_COLUMNS: usize = 6;

/// Import failures that reject the upload as a whole
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("CSV file is empty or has only a header row.")]
    EmptyUpload,

    #[error("Failed to parse CSV file: {0}")]
    Malformed(String),

    #[error("Failed to start database transaction: {0}")]
    Begin(#[source] sqlx::Error),

    #[error("Failed to commit database transaction: {0}")]
    Commit(#[source] sqlx::Error),
}

/// One data record from the upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRow {
    /// Record number in the upload, counting the header as 1
    pub line: u64,
    pub fields: Vec<String>,
}

/// Why a single row was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    InsufficientColumns { line: u64, found: usize },
    EmptyId { line: u64 },
    UnknownDepartment { line: u64, id: String, code: String },
    Store { line: u64, id: String, message: String },
}

impl RowError {
    pub fn line(&self) -> u64 {
        match self {
            RowError::InsufficientColumns { line, .. }
            | RowError::EmptyId { line }
            | RowError::UnknownDepartment { line, .. }
            | RowError::Store { line, .. } => *line,
        }
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowError::InsufficientColumns { line, found } => write!(
                f,
                "Row {}: Insufficient columns. Expected {}, got {}. Skipping.",
                line, EXPECTED_COLUMNS, found
            ),
            RowError::EmptyId { line } => {
                write!(f, "Row {}: 'id' (Reg No) cannot be empty. Skipping.", line)
            }
            RowError::UnknownDepartment { line, id, code } => write!(
                f,
                "Row {} (ID: {}): Department '{}' not found. Skipping.",
                line, id, code
            ),
            RowError::Store { line, id, message } => write!(
                f,
                "Row {} (ID: {}): Database error: {}. Skipping.",
                line, id, message
            ),
        }
    }
}

/// Outcome of a committed import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Rows written (inserted or updated)
    pub imported: usize,
    /// Skipped rows, in file order
    pub errors: Vec<RowError>,
}

impl ImportReport {
    /// True when every row was written
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

/// Transaction-scoped sink for staged user upserts
///
/// A failed `upsert` must leave the batch usable for later rows. Dropping
/// the batch without `commit` discards everything staged.
#[async_trait]
pub trait UserBatch: Send {
    /// Insert the user, or overwrite an existing user with the same id
    async fn upsert(&mut self, user: &NewUser) -> Result<(), sqlx::Error>;

    /// Make all successful upserts durable
    async fn commit(self) -> Result<(), sqlx::Error>;
}

/// Parse an uploaded CSV into data rows (header dropped)
///
/// Records may have any number of fields; short rows are caught per row.
/// Bytes that are not valid UTF-8 are replaced rather than failing the
/// upload. A quoted field left open at end of input is `Malformed`.
pub fn parse_upload(data: &[u8]) -> Result<Vec<UploadRow>, ImportError> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err(ImportError::EmptyUpload);
    }

    if ends_inside_quotes(data) {
        return Err(ImportError::Malformed("unterminated quoted field".to_string()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut rows = Vec::new();
    for (index, result) in reader.byte_records().enumerate() {
        let record = result.map_err(|e| ImportError::Malformed(e.to_string()))?;
        rows.push(UploadRow {
            line: index as u64 + 1,
            fields: record
                .iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect(),
        });
    }

    if rows.len() < 2 {
        return Err(ImportError::EmptyUpload);
    }

    rows.remove(0);
    Ok(rows)
}

/// True if `data` ends while a quoted field is still open
///
/// Follows the reader's quoting rules: a quote opens a quoted field only as
/// the first byte of a field, and `""` inside one is a literal quote.
fn ends_inside_quotes(data: &[u8]) -> bool {
    #[derive(PartialEq)]
    enum State {
        FieldStart,
        Unquoted,
        Quoted,
        QuoteInQuoted,
    }

    let mut state = State::FieldStart;
    for &byte in data {
        state = match (state, byte) {
            (State::FieldStart, b'"') => State::Quoted,
            (State::Quoted, b'"') => State::QuoteInQuoted,
            (State::Quoted, _) => State::Quoted,
            (State::QuoteInQuoted, b'"') => State::Quoted,
            (_, b',' | b'\n' | b'\r') => State::FieldStart,
            (_, _) => State::Unquoted,
        };
    }

    state == State::Quoted
}

/// Validate and normalize one row
pub fn prepare_row(row: &UploadRow, directory: &DepartmentDirectory) -> Result<NewUser, RowError> {
    let [id, name, email, dept_code, year, degree] = match &row.fields[..] {
        [id, name, email, dept_code, year, degree, ..] => {
            [id, name, email, dept_code, year, degree].map(|field| field.trim())
        }
        short => {
            return Err(RowError::InsufficientColumns {
                line: row.line,
                found: short.len(),
            })
        }
    };

    if id.is_empty() {
        return Err(RowError::EmptyId { line: row.line });
    }

    let dept = directory
        .resolve(&dept_code.to_uppercase())
        .ok_or_else(|| RowError::UnknownDepartment {
            line: row.line,
            id: id.to_string(),
            code: row.fields[3].clone(),
        })?;

    Ok(NewUser {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        dept,
        year: year.to_string(),
        degree: Degree::normalize(degree),
    })
}

/// Run every row through validation and the batch, then commit
///
/// The batch must already be open. Row failures accumulate in the report;
/// a commit failure returns `ImportError::Commit` and nothing is kept.
pub async fn run_import<B: UserBatch>(
    directory: &DepartmentDirectory,
    rows: &[UploadRow],
    mut batch: B,
) -> Result<ImportReport, ImportError> {
    let mut report = ImportReport::default();

    for row in rows {
        let user = match prepare_row(row, directory) {
            Ok(user) => user,
            Err(e) => {
                debug!("{}", e);
                report.errors.push(e);
                continue;
            }
        };

        match batch.upsert(&user).await {
            Ok(()) => report.imported += 1,
            Err(e) => {
                let error = RowError::Store {
                    line: row.line,
                    id: user.id,
                    message: e.to_string(),
                };
                debug!("{}", error);
                report.errors.push(error);
            }
        }
    }

    batch.commit().await.map_err(ImportError::Commit)?;

    info!(
        imported = report.imported,
        errors = report.errors.len(),
        "User import committed"
    );

    Ok(report)
}
