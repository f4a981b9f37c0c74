//! Refs module - Finding and rewriting `$ref` cross-references.
//!
//! External references (`file#/Name`) point into sibling files of the
//! reference document. A reconciled target may only contain internal
//! references (`#/components/<namespace>/Name`).

mod pointer;
mod rewriter;

pub use pointer::*;
pub use rewriter::*;
