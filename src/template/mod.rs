//! Destination template resolution.
//!
//! Templates are plain text with `:name` placeholders. A placeholder may carry
//! inline keyword arguments for helpers, `:name(key=value, ...)`. A template
//! that exactly equals a registered preset name is replaced by the preset.

pub mod resolver;
pub mod token;

pub use resolver::{Helper, HelperOptions, Resolver};
pub use token::{Hash, Placeholder, Segment, parse_template};
