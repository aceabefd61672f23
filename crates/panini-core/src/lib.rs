//! Panini Core - atom contract, error handling, shared helpers

pub mod atom;
pub mod error;
pub mod similarity;

pub use atom::*;
pub use error::{Error, Result};
pub use similarity::concept_similarity;
