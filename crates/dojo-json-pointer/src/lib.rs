//! JSON Pointer (RFC 6901) paths for the dojo state store.
//!
//! A [`Pointer`] is a sequence of decoded segments with a canonical string
//! form. Pointers resolve against `serde_json::Value` documents either
//! read-only ([`get`]) or mutably through a copy-on-write [`walk`] that can
//! create missing containers on the way down.
//!
//! # Example
//!
//! ```
//! use dojo_json_pointer::Pointer;
//! use serde_json::json;
//!
//! let pointer = Pointer::new("/a~1b/0");
//! assert_eq!(pointer.segments(), ["a/b", "0"]);
//! assert_eq!(pointer.path(), "/a~1b/0");
//!
//! let doc = json!({"a/b": [42]});
//! assert_eq!(pointer.get(&doc), Some(&json!(42)));
//! ```

use thiserror::Error;

pub mod get;
pub mod pointer;
pub mod util;
pub mod walk;

pub use get::get;
pub use pointer::Pointer;
pub use util::{
    array_index, escape_component, format_pointer, is_integer, parse_pointer,
    unescape_component,
};
pub use walk::{walk, CreatedSlot, PointerTarget};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PointerError {
    #[error("INVALID_INDEX: {0}")]
    InvalidIndex(String),
    #[error("INVALID_TARGET")]
    InvalidTarget,
}
