//! Sfoglia: serve a remote markdown slide deck as standalone per-page SVG
//! fragments.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
