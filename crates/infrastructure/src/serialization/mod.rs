//! JSON helpers for files written by Runi.
//!
//! Output is pretty-printed with 2-space indentation and a trailing newline
//! so hand-edited config files stay readable.

mod json;

pub use json::*;
