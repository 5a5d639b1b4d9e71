//! crates/exam_record_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or web framework.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single persisted exam record: a flat, schema-less JSON object.
///
/// The store enforces no schema on these beyond what the request models
/// impose at the boundary, so they are represented as an ordered map of
/// field name to arbitrary JSON value.
pub type ExamDocument = Map<String, Value>;

/// Represents one exam attempt, created at initiation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamSession {
    pub email: String,
    pub exam_id: String,
    /// Unix seconds at initiation.
    pub timestamp: i64,
    /// Derived identity key: `"{email}-{exam_id}-{timestamp}"`.
    pub session_id: String,
}

impl ExamSession {
    /// Creates a new session for the given user and exam, deriving the
    /// session id from the initiation timestamp.
    ///
    /// Two sessions started within the same second for the same pair share
    /// a session id; callers accept that collision.
    pub fn begin(email: String, exam_id: String, timestamp: i64) -> Self {
        let session_id = format!("{}-{}-{}", email, exam_id, timestamp);
        Self {
            email,
            exam_id,
            timestamp,
            session_id,
        }
    }

    /// Converts the session into its stored document form.
    pub fn into_document(self) -> ExamDocument {
        let mut doc = ExamDocument::new();
        doc.insert("email".to_string(), Value::String(self.email));
        doc.insert("exam_id".to_string(), Value::String(self.exam_id));
        doc.insert("timestamp".to_string(), Value::from(self.timestamp));
        doc.insert("session_id".to_string(), Value::String(self.session_id));
        doc
    }
}

/// The outcome payload applied to matching session(s) via update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamResult {
    pub email: String,
    pub exam_id: String,
    pub score: f64,
    pub cheat_score: f64,
    pub passed: bool,
    /// Open-ended key-value payload with no fixed schema.
    pub details: Option<Map<String, Value>>,
}

impl ExamResult {
    /// Merges this result into an existing document.
    ///
    /// Result fields overwrite their keys; fields the result does not carry
    /// (`timestamp`, `session_id`) survive, so "last exam" lookups keep
    /// working on updated documents. An absent `details` clears any
    /// previously stored details key: the payload is authoritative for its
    /// own fields.
    pub fn apply_to(&self, doc: &mut ExamDocument) {
        doc.insert("email".to_string(), Value::String(self.email.clone()));
        doc.insert("exam_id".to_string(), Value::String(self.exam_id.clone()));
        doc.insert("score".to_string(), Value::from(self.score));
        doc.insert("cheat_score".to_string(), Value::from(self.cheat_score));
        doc.insert("passed".to_string(), Value::Bool(self.passed));
        match &self.details {
            Some(details) => {
                doc.insert("details".to_string(), Value::Object(details.clone()));
            }
            None => {
                doc.remove("details");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn session_id_is_derived_from_email_exam_and_timestamp() {
        let session = ExamSession::begin("a@b.com".into(), "rust-101".into(), 1_700_000_000);
        assert_eq!(session.session_id, "a@b.com-rust-101-1700000000");
    }

    #[test]
    fn session_document_carries_all_four_fields() {
        let doc = ExamSession::begin("a@b.com".into(), "rust-101".into(), 42).into_document();
        assert_eq!(doc.get("email"), Some(&json!("a@b.com")));
        assert_eq!(doc.get("exam_id"), Some(&json!("rust-101")));
        assert_eq!(doc.get("timestamp"), Some(&json!(42)));
        assert_eq!(doc.get("session_id"), Some(&json!("a@b.com-rust-101-42")));
    }

    #[test]
    fn apply_to_preserves_session_identity_fields() {
        let mut doc = ExamSession::begin("a@b.com".into(), "rust-101".into(), 42).into_document();
        let result = ExamResult {
            email: "a@b.com".into(),
            exam_id: "rust-101".into(),
            score: 87.5,
            cheat_score: 0.1,
            passed: true,
            details: None,
        };
        result.apply_to(&mut doc);

        assert_eq!(doc.get("timestamp"), Some(&json!(42)));
        assert_eq!(doc.get("session_id"), Some(&json!("a@b.com-rust-101-42")));
        assert_eq!(doc.get("score"), Some(&json!(87.5)));
        assert_eq!(doc.get("passed"), Some(&json!(true)));
    }

    #[test]
    fn apply_to_replaces_details_and_clears_them_when_absent() {
        let mut doc = ExamDocument::new();
        let mut old_details = Map::new();
        old_details.insert("proctor".to_string(), json!("webcam"));
        doc.insert("details".to_string(), Value::Object(old_details));

        let mut new_details = Map::new();
        new_details.insert("flags".to_string(), json!(["tab-switch"]));
        let with_details = ExamResult {
            email: "a@b.com".into(),
            exam_id: "rust-101".into(),
            score: 50.0,
            cheat_score: 0.9,
            passed: false,
            details: Some(new_details),
        };
        with_details.apply_to(&mut doc);
        assert_eq!(doc.get("details"), Some(&json!({"flags": ["tab-switch"]})));

        let without_details = ExamResult {
            details: None,
            ..with_details
        };
        without_details.apply_to(&mut doc);
        assert!(doc.get("details").is_none());
    }
}
