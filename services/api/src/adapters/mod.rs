pub mod store;

pub use store::SqliteExamStore;
