//! Pattern registry
//!
//! Named built-in regular expressions (email, IP, phone, date, time) plus
//! compilation and validation of user-supplied pattern text.

mod registry;

pub use registry::{compile_user_pattern, Pattern, PatternRegistry, BUILTIN_NAMES};
