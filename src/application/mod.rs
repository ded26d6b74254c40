//! Application services layer.

pub mod cache;
pub mod deck;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod render;
