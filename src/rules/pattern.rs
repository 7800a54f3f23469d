//! Path pattern compilation.
//!
//! A pattern is either a path string written in a small DSL or a regex used
//! as-is. Both compile to a `CompiledMatcher`: one anchored regex plus the
//! ordered `CaptureKey`s describing its capture groups.
//!
//! Path DSL:
//! - `:name` captures one segment (up to the next `/`, or the next `.` when
//!   the parameter is prefixed with `.`)
//! - `:name(re)` captures with a custom sub-pattern
//! - `(re)` is an unnamed custom group
//! - `*` captures everything up to the next literal boundary
//! - `?`, `+`, `*` after a parameter make it optional, repeated, or both
//! - `\x` matches `x` literally; any other text matches itself
//!
//! Unnamed captures (`*` and `(re)`) are keyed by their zero-based position
//! among unnamed captures.

use crate::error::{Result, RepathError};
use regex::Regex;
use std::fmt;

/// Key of one capture group: a parameter name or a positional index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CaptureKey {
	Named(String),
	Index(usize),
}

impl CaptureKey {
	/// Parse a template token into a key. All-digit tokens are indices.
	pub fn parse(token: &str) -> Self {
		token
			.parse::<usize>()
			.map(CaptureKey::Index)
			.unwrap_or_else(|_| CaptureKey::Named(token.to_string()))
	}
}

impl fmt::Display for CaptureKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			CaptureKey::Named(name) => f.write_str(name),
			CaptureKey::Index(index) => write!(f, "{}", index),
		}
	}
}

impl From<&str> for CaptureKey {
	fn from(token: &str) -> Self {
		CaptureKey::parse(token)
	}
}

impl From<usize> for CaptureKey {
	fn from(index: usize) -> Self {
		CaptureKey::Index(index)
	}
}

/// What a rule matches against: a DSL path pattern or a raw regex.
#[derive(Debug, Clone)]
pub enum PatternSpec {
	Path(String),
	Regex(Regex),
}

impl PatternSpec {
	/// The pattern source text.
	pub fn as_str(&self) -> &str {
		match self {
			PatternSpec::Path(pattern) => pattern,
			PatternSpec::Regex(regex) => regex.as_str(),
		}
	}
}

impl fmt::Display for PatternSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PatternSpec::Path(pattern) => f.write_str(pattern),
			PatternSpec::Regex(regex) => write!(f, "/{}/", regex.as_str()),
		}
	}
}

impl From<&str> for PatternSpec {
	fn from(pattern: &str) -> Self {
		PatternSpec::Path(pattern.to_string())
	}
}

impl From<String> for PatternSpec {
	fn from(pattern: String) -> Self {
		PatternSpec::Path(pattern)
	}
}

impl From<Regex> for PatternSpec {
	fn from(regex: Regex) -> Self {
		PatternSpec::Regex(regex)
	}
}

/// Matching strictness flags for DSL patterns. Raw regexes ignore them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
	/// A trailing `/` is significant (`foo/bar/` does not match `foo/bar`).
	pub strict: bool,

	/// Anchor at the end of the path. When false the pattern matches a
	/// prefix ending on a segment boundary.
	pub end: bool,

	/// Match case-sensitively.
	pub sensitive: bool,
}

impl Default for MatchOptions {
	fn default() -> Self {
		MatchOptions {
			strict: false,
			end: true,
			sensitive: false,
		}
	}
}

/// The groups of one successful regex match. Index 0 is the whole match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMatch {
	groups: Vec<Option<String>>,
}

impl RawMatch {
	/// The whole matched text.
	pub fn as_str(&self) -> &str {
		self.get(0).unwrap_or_default()
	}

	/// Group `index`, or `None` if it did not participate.
	pub fn get(&self, index: usize) -> Option<&str> {
		self.groups.get(index).and_then(|group| group.as_deref())
	}

	/// Number of groups including the whole match.
	pub fn len(&self) -> usize {
		self.groups.len()
	}

	pub fn is_empty(&self) -> bool {
		self.groups.is_empty()
	}
}

/// A compiled pattern: the regex and the key of each of its capture groups.
#[derive(Debug, Clone)]
pub struct CompiledMatcher {
	regex: Regex,
	keys: Vec<CaptureKey>,
}

impl CompiledMatcher {
	/// Build a matcher from a regex and explicit keys.
	pub fn new(regex: Regex, keys: Vec<CaptureKey>) -> Self {
		CompiledMatcher { regex, keys }
	}

	pub fn regex(&self) -> &Regex {
		&self.regex
	}

	/// Capture keys, in capture group order.
	pub fn keys(&self) -> &[CaptureKey] {
		&self.keys
	}

	/// Run the matcher against a path.
	pub fn exec(&self, path: &str) -> Option<RawMatch> {
		let captures = self.regex.captures(path)?;
		let groups = captures
			.iter()
			.map(|group| group.map(|m| m.as_str().to_string()))
			.collect();
		Some(RawMatch { groups })
	}

	/// Pair each key with its captured value, in key order.
	///
	/// `None` marks a group that did not take part in the match.
	pub fn assignments(&self, raw: &RawMatch) -> Vec<(CaptureKey, Option<String>)> {
		self.keys
			.iter()
			.enumerate()
			.map(|(i, key)| (key.clone(), raw.get(i + 1).map(str::to_string)))
			.collect()
	}
}

/// Compile a pattern spec.
pub fn compile(spec: &PatternSpec, options: &MatchOptions) -> Result<CompiledMatcher> {
	match spec {
		PatternSpec::Path(pattern) => compile_path(pattern, options),
		PatternSpec::Regex(regex) => {
			let keys = (0..regex.captures_len() - 1).map(CaptureKey::Index).collect();
			Ok(CompiledMatcher::new(regex.clone(), keys))
		}
	}
}

/// Compile a DSL path pattern.
pub fn compile_path(pattern: &str, options: &MatchOptions) -> Result<CompiledMatcher> {
	let tokens = parse(pattern)?;
	let source = tokens_to_regex(&tokens, options);

	let regex = Regex::new(&source).map_err(|source| RepathError::InvalidRegex {
		pattern: pattern.to_string(),
		source,
	})?;

	let keys: Vec<CaptureKey> = tokens
		.into_iter()
		.filter_map(|token| match token {
			Token::Param(param) => Some(param.key),
			Token::Literal(_) => None,
		})
		.collect();

	if regex.captures_len() - 1 != keys.len() {
		return Err(pattern_error(
			pattern,
			"custom groups must not contain capturing groups, use (?:...)",
		));
	}

	Ok(CompiledMatcher::new(regex, keys))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
	Literal(String),
	Param(Param),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Param {
	key: CaptureKey,
	prefix: Option<char>,
	pattern: String,
	optional: bool,
	repeat: bool,
	/// Prefixed, but followed by something other than the prefix (`/:a-:b`).
	partial: bool,
}

fn pattern_error(pattern: &str, message: impl Into<String>) -> RepathError {
	RepathError::Pattern {
		pattern: pattern.to_string(),
		message: message.into(),
	}
}

fn is_name_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '_'
}

/// Split a DSL pattern into literal and parameter tokens.
fn parse(pattern: &str) -> Result<Vec<Token>> {
	let chars: Vec<char> = pattern.chars().collect();
	let mut tokens = Vec::new();
	let mut literal = String::new();
	let mut unnamed = 0;
	let mut i = 0;

	while i < chars.len() {
		let c = chars[i];

		if c == '\\' {
			let Some(&escaped) = chars.get(i + 1) else {
				return Err(pattern_error(pattern, "trailing escape character"));
			};
			literal.push(escaped);
			i += 2;
			continue;
		}

		// A separator directly before a parameter belongs to that parameter
		let prefix = match (c, chars.get(i + 1)) {
			('/' | '.', Some(':' | '(' | '*')) => Some(c),
			_ => None,
		};
		let start = if prefix.is_some() { i + 1 } else { i };

		let (name, custom, asterisk, mut next) = match chars[start] {
			':' => {
				let name_end = (start + 1..chars.len())
					.find(|&j| !is_name_char(chars[j]))
					.unwrap_or(chars.len());
				if name_end == start + 1 {
					return Err(pattern_error(
						pattern,
						format!("expected a parameter name after ':' at offset {}", start),
					));
				}
				let name: String = chars[start + 1..name_end].iter().collect();
				if chars.get(name_end) == Some(&'(') {
					let (group, end) = read_group(pattern, &chars, name_end)?;
					(Some(name), Some(group), false, end)
				} else {
					(Some(name), None, false, name_end)
				}
			}
			'(' => {
				let (group, end) = read_group(pattern, &chars, start)?;
				(None, Some(group), false, end)
			}
			'*' => (None, None, true, start + 1),
			_ => {
				literal.push(c);
				i += 1;
				continue;
			}
		};

		let mut optional = false;
		let mut repeat = false;
		if !asterisk {
			match chars.get(next) {
				Some('?') => optional = true,
				Some('+') => repeat = true,
				Some('*') => {
					optional = true;
					repeat = true;
				}
				_ => {}
			}
			if optional || repeat {
				next += 1;
			}
		}

		let partial = match (prefix, chars.get(next)) {
			(Some(p), Some(&n)) => n != p,
			_ => false,
		};

		let delimiter = prefix.unwrap_or('/');
		let pattern_source = match custom {
			Some(group) => group,
			None if asterisk => ".*".to_string(),
			None => format!("[^{}]+?", regex::escape(&delimiter.to_string())),
		};

		let key = match name {
			Some(name) => CaptureKey::Named(name),
			None => {
				unnamed += 1;
				CaptureKey::Index(unnamed - 1)
			}
		};

		if !literal.is_empty() {
			tokens.push(Token::Literal(std::mem::take(&mut literal)));
		}
		tokens.push(Token::Param(Param {
			key,
			prefix,
			pattern: pattern_source,
			optional,
			repeat,
			partial,
		}));
		i = next;
	}

	if !literal.is_empty() {
		tokens.push(Token::Literal(literal));
	}

	Ok(tokens)
}

/// Read a parenthesized group starting at `open`. Returns its inner text
/// and the index just past the closing paren.
fn read_group(pattern: &str, chars: &[char], open: usize) -> Result<(String, usize)> {
	let mut depth = 0usize;
	let mut group = String::new();
	let mut j = open;

	while j < chars.len() {
		let c = chars[j];
		match c {
			'\\' => {
				let Some(&escaped) = chars.get(j + 1) else {
					break;
				};
				group.push(c);
				group.push(escaped);
				j += 2;
				continue;
			}
			'(' => {
				depth += 1;
				if depth > 1 {
					group.push(c);
				}
			}
			')' => {
				depth -= 1;
				if depth == 0 {
					if group.is_empty() {
						return Err(pattern_error(
							pattern,
							format!("empty group at offset {}", open),
						));
					}
					return Ok((group, j + 1));
				}
				group.push(c);
			}
			_ => group.push(c),
		}
		j += 1;
	}

	Err(pattern_error(
		pattern,
		format!("unclosed group at offset {}", open),
	))
}

fn tokens_to_regex(tokens: &[Token], options: &MatchOptions) -> String {
	let mut route = String::new();

	for token in tokens {
		match token {
			Token::Literal(text) => route.push_str(&regex::escape(text)),
			Token::Param(param) => {
				let prefix = param
					.prefix
					.map(|p| regex::escape(&p.to_string()))
					.unwrap_or_default();
				let mut capture = format!("(?:{})", param.pattern);
				if param.repeat {
					capture = format!("{capture}(?:{prefix}{capture})*");
				}
				let piece = if param.optional {
					if param.partial {
						format!("{prefix}({capture})?")
					} else {
						format!("(?:{prefix}({capture}))?")
					}
				} else {
					format!("{prefix}({capture})")
				};
				route.push_str(&piece);
			}
		}
	}

	let ends_with_delimiter =
		matches!(tokens.last(), Some(Token::Literal(text)) if text.ends_with('/'));

	if !options.strict {
		if ends_with_delimiter {
			route.pop();
		}
		route.push_str("/?");
	}

	if options.end {
		route.push('$');
	} else if !(options.strict && ends_with_delimiter) {
		route.push_str("(?:/|$)");
	}

	let flags = if options.sensitive { "" } else { "(?i)" };
	format!("{flags}^{route}")
}
