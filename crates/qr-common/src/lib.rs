//! Qryti Common Types
//!
//! Entity models returned by the compliance platform API and shared
//! structured logging setup for the console binaries.

pub mod logging;
pub mod models;

pub use models::{
    Assessment, AssessmentProgress, Certificate, FileRecord, User, UserProfile,
};
