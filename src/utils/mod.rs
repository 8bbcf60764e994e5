//! Utility types and functions

pub mod detection;

pub use detection::{BoundingBox, BOX_VALUES};
