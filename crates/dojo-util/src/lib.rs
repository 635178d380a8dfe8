//! dojo-util - value utilities shared by the dojo store crates.

pub mod json_equal;

pub use json_equal::{is_equal, is_equal_opt};
