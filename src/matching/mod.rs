//! Matching of pattern trees against USTs.
//!
//! A match attempt threads a [`MatchingContext`] through the pattern tree and
//! returns it with the gathered locations and a success flag. A mismatch is the
//! ordinary negative outcome, never an error. [`MatchingEngine`] walks a whole
//! tree and turns successful root attempts into results.

mod context;
mod engine;
mod matcher;

pub use context::{MatchingContext, MatchingOptions};
pub use engine::MatchingEngine;
pub use matcher::Matcher;
