//! Domain layer types.
//!
//! Email records as fetched, the closed category enumeration, annotated
//! pipeline output, and the aggregated report.

mod annotated;
mod category;
mod email;
mod report;
mod types;

pub use annotated::{AnnotatedEmail, Summary, SummaryProvenance, SUMMARY_UNAVAILABLE};
pub use category::{CategoryLabel, CategoryProvenance, UnknownCategory};
pub use email::{truncate_chars, EmailRecord, EmailValidationError};
pub use report::{Report, ReportStatistics};
pub use types::EmailId;
