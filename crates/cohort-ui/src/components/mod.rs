//! Reusable UI building blocks.

pub mod header;
pub mod key_hints;
