//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use exam_record_core::ports::ExamStore;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all
/// handlers. The store handle is injected here rather than held globally, so
/// it is constructed and released together with the process lifecycle.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ExamStore>,
}
