//! # OpenAPI Sync
//!
//! Reconciles a consolidated OpenAPI v3 document against the multi-file
//! reference it was derived from.
//!
//! The reference is treated as the source of truth. Missing schemas,
//! parameters, paths and schema fields are copied into the target, inline
//! path parameters are replaced with component references, and external
//! `$ref`s are rewritten into internal ones. Every edit is a text patch, so
//! comments, quoting, key order and blank lines outside the touched blocks
//! survive byte for byte.
//!
//! ## Modules
//!
//! - [`namespace`] - The entity namespaces and where each lives in a document
//! - [`text`] - Line outlines and block-level text surgery
//! - [`document`] - Parsed documents, the reference set and the transactional target file
//! - [`diff`] - Name-level and field-level differences between reference and target
//! - [`refs`] - External `$ref` discovery and all-or-nothing rewriting
//! - [`patch`] - Format-preserving add, remove, convert and align edits
//! - [`report`] - The JSON diff report and its Markdown narrative
//! - [`validate`] - Structural and reference validation of the target
//! - [`pipeline`] - Ordered reconciliation stages and run summaries
//! - [`config`] - YAML configuration and default paths
//! - [`logging`] - Tracing subscriber setup

pub mod config;
pub mod diff;
pub mod document;
pub mod error;
pub mod logging;
pub mod namespace;
pub mod openapi;
pub mod patch;
pub mod pipeline;
pub mod refs;
pub mod report;
pub mod text;
pub mod validate;

pub use config::ReconcileConfig;
pub use diff::{Diff, DiffSet, Differ, FieldFinding};
pub use document::{LoadedDocument, ReferenceSet, StructuredDocument, TargetFile};
pub use error::{ReconcileError, Result};
pub use namespace::{Layout, Namespace};
pub use patch::{Outcome, Outcomes, Patcher};
pub use pipeline::{Reconciler, RunSummary};
pub use report::{DiffReport, Narrative};
pub use validate::{validate_document, ValidationError, ValidationErrors};
