//! Rule matching and path rewriting for repath.
//!
//! This module handles:
//! - Compiling path patterns and regexes into matchers
//! - Matching rules against files and capturing params
//! - Rewriting paths with the first matching rule

pub mod matcher;
pub mod pattern;
pub mod rewriter;

pub use matcher::{Guard, Matchable, ParamMap, Rule, find_matching_rule};
pub use pattern::{CaptureKey, CompiledMatcher, MatchOptions, PatternSpec, RawMatch, compile};
pub use rewriter::{Rewriter, RewriterOptions};
