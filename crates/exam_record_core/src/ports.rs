//! crates/exam_record_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of the concrete document store implementation.

use async_trait::async_trait;

use crate::domain::{ExamDocument, ExamResult, ExamSession};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors of the backing store.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Store Port (Trait)
//=========================================================================================

/// The document store holding every exam record in a single table.
#[async_trait]
pub trait ExamStore: Send + Sync {
    /// Appends a new session document to the store.
    async fn insert_session(&self, session: &ExamSession) -> PortResult<()>;

    /// Merges the result payload into every document matching the result's
    /// `(email, exam_id)` pair and returns how many documents were touched.
    ///
    /// Fails with `PortError::NotFound` when no document matches the pair.
    async fn apply_result(&self, result: &ExamResult) -> PortResult<u64>;

    /// All documents for the given email, in insertion order. An email with
    /// no documents yields the empty list, never an error.
    async fn find_by_email(&self, email: &str) -> PortResult<Vec<ExamDocument>>;

    /// The document for the given email with the greatest `timestamp`.
    /// Equal timestamps are broken by insertion order, last-inserted wins.
    async fn last_exam_for_email(&self, email: &str) -> PortResult<ExamDocument>;

    /// The document with the greatest `timestamp` across the whole store,
    /// with the same tie-break as `last_exam_for_email`.
    async fn last_exam_global(&self) -> PortResult<ExamDocument>;
}
