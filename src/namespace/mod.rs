//! Namespace module - The closed set of entity collections a document is diffed over.
//!
//! Each namespace knows where its section lives in either document layout,
//! how deeply its entries are indented, and where a missing section belongs.

mod namespace;

pub use namespace::*;
