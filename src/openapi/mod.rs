//! OpenAPI module - Typed read-only views of OpenAPI v3 documents.
//!
//! This module projects schema, parameter and path definitions out of the
//! untyped document tree for reporting and validation.

mod schema;

pub use schema::*;
