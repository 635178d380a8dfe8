//! Structural equality for JSON values.

mod is_equal;

pub use is_equal::{is_equal, is_equal_opt};
