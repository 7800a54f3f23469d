//! Repath - rule-based rewriting of source file paths into output paths.
//!
//! This library provides:
//! - Path pattern compilation (`:name`, `*`, custom groups) and raw regex rules
//! - First-match-wins rule evaluation with optional guards
//! - Destination templates with presets, helpers and shared data
//! - TOML configuration for rules, presets and data
//!
//! # Example
//!
//! ```
//! use repath::Rewriter;
//! use regex::Regex;
//!
//! let mut rewriter = Rewriter::new();
//! rewriter
//!     .rule(Regex::new("posts").unwrap(), "blog/:stem/index.html")?
//!     .rule(Regex::new("docs").unwrap(), "docs/:stem/index.html")?;
//!
//! assert_eq!(
//!     rewriter.rewrite("content/posts/first-post.md", None)?,
//!     "blog/first-post/index.html"
//! );
//! assert_eq!(rewriter.rewrite("content/docs/api.md", None)?, "docs/api/index.html");
//! assert_eq!(rewriter.rewrite("foo/bar.xyz", None)?, "foo/bar.xyz");
//! # Ok::<(), repath::RepathError>(())
//! ```

pub mod config;
pub mod error;
pub mod file;
pub mod rules;
pub mod template;

pub use error::{RepathError, Result};
pub use file::{Data, File, IntoFile};
pub use rules::{
	CaptureKey, CompiledMatcher, Matchable, MatchOptions, ParamMap, PatternSpec, RawMatch,
	Rewriter, RewriterOptions, Rule,
};
pub use template::{HelperOptions, Resolver};
