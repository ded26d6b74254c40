//! Domain layer types and invariants.

pub mod deck;
pub mod error;
pub mod markup;
