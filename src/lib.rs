//! Varanno library main entry point.

pub mod annotate;
pub mod common;
