pub mod domain;
pub mod ports;

pub use domain::{ExamDocument, ExamResult, ExamSession};
pub use ports::{ExamStore, PortError, PortResult};
