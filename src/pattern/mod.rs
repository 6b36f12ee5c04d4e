//! Pattern model.
//!
//! Patterns are typed trees describing a structural or textual shape to look
//! for in a UST. They are language neutral: the same pattern tree is matched
//! against trees from every language in its root's language set. Patterns are
//! authored either in code through [`PatternNode`] constructors and
//! [`PatternRoot::builder`], or as JSON (`{"kind": "Invocation", ...}`).

mod node;
mod root;
mod text_regex;

pub use node::*;
pub use root::*;
pub use text_regex::*;
