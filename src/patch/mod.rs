//! Patch module - Format-preserving edits to the target document.
//!
//! Every operation reads raw text, locates entity blocks by their
//! name-anchored key line at the namespace's indentation, and returns new
//! text built from [`TextRegion`](crate::text::TextRegion)s together with a
//! per-entity [`Outcomes`] list. All operations are idempotent.

mod add;
mod attribute;
mod convert;
mod outcome;
mod patcher;
mod remove;


pub use outcome::*;
pub use patcher::*;
