//! Text module - Format-preserving views and edits over raw YAML text.
//!
//! Mutation never goes through a structural re-serialization. Instead the
//! raw text is indexed line by line ([`Outline`]), entity definitions are
//! located as indentation-delimited [`Block`]s, and changes are expressed as
//! contiguous [`TextRegion`] replacements that leave every other byte alone.

mod outline;
mod region;

pub use outline::*;
pub use region::*;
