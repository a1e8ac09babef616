//! Model candidates, the catalog, and candidate selection

pub mod candidate;
pub mod catalog;
pub mod selector;

pub use candidate::{FallbackTarget, ModelCandidate};
pub use catalog::Catalog;
pub use selector::{CandidateSelector, Priority, Selection};
