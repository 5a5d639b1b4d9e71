//! services/api/src/adapters/store.rs
//!
//! This module contains the document store adapter, which is the concrete
//! implementation of the `ExamStore` port from the `core` crate. It persists
//! schema-less exam documents in a single SQLite table using `sqlx`, querying
//! them through `json_extract` field predicates.

use std::time::Duration;

use async_trait::async_trait;
use exam_record_core::domain::{ExamDocument, ExamResult, ExamSession};
use exam_record_core::ports::{ExamStore, PortError, PortResult};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A SQLite-backed document store that implements the `ExamStore` port.
#[derive(Clone)]
pub struct SqliteExamStore {
    pool: SqlitePool,
}

impl SqliteExamStore {
    /// Creates a new `SqliteExamStore` from an existing pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connects to SQLite using the given URL.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    sqlx::query("PRAGMA journal_mode = WAL;")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA busy_timeout = 5000;")
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Creates the document table if it does not exist. Run once at startup.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS exam_documents (
                    id INTEGER PRIMARY KEY,
                    doc TEXT NOT NULL
                );
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_exam_documents_email
                    ON exam_documents (json_extract(doc, '$.email'));
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

//=========================================================================================
// Row Mapping Helpers
//=========================================================================================

fn unexpected<E: std::fmt::Display>(e: E) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn parse_document(raw: &str) -> PortResult<ExamDocument> {
    serde_json::from_str(raw).map_err(unexpected)
}

fn document_from_row(row: &sqlx::sqlite::SqliteRow) -> PortResult<ExamDocument> {
    let raw: String = row.try_get("doc").map_err(unexpected)?;
    parse_document(&raw)
}

//=========================================================================================
// `ExamStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ExamStore for SqliteExamStore {
    async fn insert_session(&self, session: &ExamSession) -> PortResult<()> {
        let doc = serde_json::to_string(session).map_err(unexpected)?;
        sqlx::query("INSERT INTO exam_documents (doc) VALUES (?1)")
            .bind(doc)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn apply_result(&self, result: &ExamResult) -> PortResult<u64> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let rows = sqlx::query(
            r"
                SELECT id, doc FROM exam_documents
                WHERE json_extract(doc, '$.email') = ?1
                  AND json_extract(doc, '$.exam_id') = ?2
                ORDER BY id ASC
            ",
        )
        .bind(&result.email)
        .bind(&result.exam_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(unexpected)?;

        if rows.is_empty() {
            return Err(PortError::NotFound("Exam not found".to_string()));
        }

        let mut updated = 0u64;
        for row in rows {
            let id: i64 = row.try_get("id").map_err(unexpected)?;
            let mut doc = document_from_row(&row)?;
            result.apply_to(&mut doc);
            let raw = serde_json::to_string(&doc).map_err(unexpected)?;
            sqlx::query("UPDATE exam_documents SET doc = ?1 WHERE id = ?2")
                .bind(raw)
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(unexpected)?;
            updated += 1;
        }

        tx.commit().await.map_err(unexpected)?;
        Ok(updated)
    }

    async fn find_by_email(&self, email: &str) -> PortResult<Vec<ExamDocument>> {
        let rows = sqlx::query(
            r"
                SELECT doc FROM exam_documents
                WHERE json_extract(doc, '$.email') = ?1
                ORDER BY id ASC
            ",
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            documents.push(document_from_row(&row)?);
        }
        Ok(documents)
    }

    async fn last_exam_for_email(&self, email: &str) -> PortResult<ExamDocument> {
        let row = sqlx::query(
            r"
                SELECT doc FROM exam_documents
                WHERE json_extract(doc, '$.email') = ?1
                ORDER BY json_extract(doc, '$.timestamp') DESC, id DESC
                LIMIT 1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("No exams found for {}", email)))?;

        document_from_row(&row)
    }

    async fn last_exam_global(&self) -> PortResult<ExamDocument> {
        let row = sqlx::query(
            r"
                SELECT doc FROM exam_documents
                ORDER BY json_extract(doc, '$.timestamp') DESC, id DESC
                LIMIT 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound("No exams found".to_string()))?;

        document_from_row(&row)
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn test_store(name: &str) -> SqliteExamStore {
        let url = format!("sqlite:file:{}?mode=memory&cache=shared", name);
        let store = SqliteExamStore::connect(&url).await.expect("connect sqlite");
        store.migrate().await.expect("migrate");
        store
    }

    fn session(email: &str, exam_id: &str, timestamp: i64) -> ExamSession {
        ExamSession::begin(email.to_string(), exam_id.to_string(), timestamp)
    }

    #[tokio::test]
    async fn inserted_session_is_found_by_email() {
        let store = test_store("memdb_insert_find").await;
        store
            .insert_session(&session("a@b.com", "rust-101", 100))
            .await
            .unwrap();

        let docs = store.find_by_email("a@b.com").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].get("exam_id"), Some(&json!("rust-101")));
        assert_eq!(docs[0].get("session_id"), Some(&json!("a@b.com-rust-101-100")));

        assert!(store.find_by_email("nobody@b.com").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn last_exam_picks_greatest_timestamp() {
        let store = test_store("memdb_last_by_ts").await;
        store.insert_session(&session("a@b.com", "old", 100)).await.unwrap();
        store.insert_session(&session("a@b.com", "new", 200)).await.unwrap();
        store.insert_session(&session("other@b.com", "newest", 300)).await.unwrap();

        let last = store.last_exam_for_email("a@b.com").await.unwrap();
        assert_eq!(last.get("exam_id"), Some(&json!("new")));

        let global = store.last_exam_global().await.unwrap();
        assert_eq!(global.get("exam_id"), Some(&json!("newest")));
    }

    #[tokio::test]
    async fn equal_timestamps_break_toward_last_inserted() {
        let store = test_store("memdb_tie_break").await;
        store.insert_session(&session("a@b.com", "first", 100)).await.unwrap();
        store.insert_session(&session("a@b.com", "second", 100)).await.unwrap();

        let last = store.last_exam_for_email("a@b.com").await.unwrap();
        assert_eq!(last.get("exam_id"), Some(&json!("second")));
    }

    #[tokio::test]
    async fn apply_result_touches_every_matching_document() {
        let store = test_store("memdb_update_all").await;
        store.insert_session(&session("a@b.com", "rust-101", 100)).await.unwrap();
        store.insert_session(&session("a@b.com", "rust-101", 200)).await.unwrap();
        store.insert_session(&session("a@b.com", "other", 300)).await.unwrap();

        let result = ExamResult {
            email: "a@b.com".to_string(),
            exam_id: "rust-101".to_string(),
            score: 87.5,
            cheat_score: 0.2,
            passed: true,
            details: None,
        };
        let updated = store.apply_result(&result).await.unwrap();
        assert_eq!(updated, 2);

        let docs = store.find_by_email("a@b.com").await.unwrap();
        let touched: Vec<_> = docs
            .iter()
            .filter(|d| d.get("exam_id") == Some(&json!("rust-101")))
            .collect();
        assert_eq!(touched.len(), 2);
        for doc in touched {
            assert_eq!(doc.get("score"), Some(&json!(87.5)));
            assert_eq!(doc.get("passed"), Some(&json!(true)));
            // merge semantics: identity fields survive the update
            assert!(doc.get("timestamp").is_some());
            assert!(doc.get("session_id").is_some());
        }

        let untouched = docs
            .iter()
            .find(|d| d.get("exam_id") == Some(&json!("other")))
            .unwrap();
        assert!(untouched.get("score").is_none());
    }

    #[tokio::test]
    async fn apply_result_without_matching_pair_is_not_found() {
        let store = test_store("memdb_update_missing").await;
        let result = ExamResult {
            email: "a@b.com".to_string(),
            exam_id: "rust-101".to_string(),
            score: 10.0,
            cheat_score: 0.0,
            passed: false,
            details: None,
        };
        let err = store.apply_result(&result).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[tokio::test]
    async fn empty_store_has_no_last_exam() {
        let store = test_store("memdb_empty_global").await;
        assert!(matches!(
            store.last_exam_global().await.unwrap_err(),
            PortError::NotFound(_)
        ));
        assert!(matches!(
            store.last_exam_for_email("a@b.com").await.unwrap_err(),
            PortError::NotFound(_)
        ));
    }
}
