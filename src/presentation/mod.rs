//! Presentation layer: askama templates and render helpers.

pub mod views;
