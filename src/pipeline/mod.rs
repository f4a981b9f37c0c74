//! Pipeline module - Running reconciliation stages against the target file.
//!
//! A [`Reconciler`] owns the reference set and the target handle. Each
//! stage rereads the target, computes its edit from the current text and
//! commits it as one transaction. A full `sync` chains the non-destructive
//! stages; removal is only run on request.

mod reconciler;
mod summary;


pub use reconciler::*;
pub use summary::*;
