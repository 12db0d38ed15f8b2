//! Variant linking library - shared modules for the variant-link binary and tests.

pub mod config;
pub mod index;
pub mod loader;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod report;
pub mod resolver;
pub mod safety;
