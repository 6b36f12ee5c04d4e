//! Data models shared by the tree, pattern and matching layers.

mod language;
mod result;
mod source;

pub use language::*;
pub use result::*;
pub use source::*;
