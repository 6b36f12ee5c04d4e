//! Universal Syntax Tree: the language-neutral tree front-ends produce.
//!
//! Nodes are stored in an arena owned by [`RootUst`] and reference each other
//! by [`NodeId`]. Parent links are an index table computed once after the
//! tree is complete, so building a tree never needs back-pointers.

mod node;
mod tree;

pub use node::*;
pub use tree::*;
