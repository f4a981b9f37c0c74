//! Report module - Machine- and human-readable views of a diff.
//!
//! [`DiffReport`] is the JSON artifact a run leaves behind: every missing
//! entity with enough detail to add it, every extra entity, field drift and
//! per-namespace counts. [`Narrative`] renders the same findings as Markdown
//! grouped by severity.

mod narrative;
mod report;

pub use narrative::*;
pub use report::*;
