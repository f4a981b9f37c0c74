//! Diff module - Set differences between a reference and a target document.
//!
//! Each namespace is treated as a set of names. Schemas common to both
//! documents are additionally diffed field by field, and common fields are
//! checked for attribute drift.

mod diff;
mod differ;

#[cfg(test)]
mod diff_test;

pub use diff::*;
pub use differ::*;
