//! Document module - Loading reference and target documents.
//!
//! Every document is held twice: as a structural tree for read-only
//! analysis and as raw text for patching. The target file is only ever
//! mutated through [`TargetFile`], which rereads, backs up, writes
//! atomically and restores on failure.

mod loaded;
mod structured;
mod target;

pub use loaded::*;
pub use structured::*;
pub use target::*;
