//! Validate module - Structural checks on a reconciled target document.
//!
//! Validation never stops at the first problem; every violation is
//! collected into [`ValidationErrors`] so a run can report them together.

mod document;
mod validation;

pub use document::*;
pub use validation::*;
