use std::collections::BTreeMap;

/// Inline keyword arguments of a placeholder, e.g. `:foo(name=value)`.
pub type Hash = BTreeMap<String, String>;

/// One piece of a parsed destination template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
	Literal(String),
	Placeholder(Placeholder),
}

/// A `:name` or `:name(key=value, ...)` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
	pub name: String,
	pub hash: Hash,
	/// The token as written, used when it stays unresolved.
	pub raw: String,
}

impl Placeholder {
	/// Whether the placeholder was written with an argument list, even `()`.
	pub fn has_arguments(&self) -> bool {
		self.raw.len() > self.name.len() + 1
	}
}

fn is_name_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '_'
}

/// Split a template into literals and placeholders.
///
/// A `:` not followed by a name character is literal text. An argument list
/// that is unclosed or malformed is left in the output as literal text, and
/// the placeholder is read without arguments.
pub fn parse_template(template: &str) -> Vec<Segment> {
	let mut segments = Vec::new();
	let mut literal = String::new();
	let mut rest = template;

	while let Some(pos) = rest.find(':') {
		literal.push_str(&rest[..pos]);
		let after = &rest[pos + 1..];

		let name_len = after
			.find(|c: char| !is_name_char(c))
			.unwrap_or(after.len());
		if name_len == 0 {
			literal.push(':');
			rest = after;
			continue;
		}

		let mut consumed = name_len;
		let mut hash = Hash::new();
		if let Some(args) = after[name_len..].strip_prefix('(')
			&& let Some(close) = find_closing_paren(args)
			&& let Some(parsed) = parse_hash(&args[..close])
		{
			hash = parsed;
			consumed = name_len + 1 + close + 1;
		}

		if !literal.is_empty() {
			segments.push(Segment::Literal(std::mem::take(&mut literal)));
		}
		segments.push(Segment::Placeholder(Placeholder {
			name: after[..name_len].to_string(),
			hash,
			raw: rest[pos..pos + 1 + consumed].to_string(),
		}));
		rest = &after[consumed..];
	}

	literal.push_str(rest);
	if !literal.is_empty() {
		segments.push(Segment::Literal(literal));
	}

	segments
}

fn find_closing_paren(args: &str) -> Option<usize> {
	let mut quote = None;
	for (i, c) in args.char_indices() {
		match (quote, c) {
			(Some(q), c) if c == q => quote = None,
			(Some(_), _) => {}
			(None, '\'' | '"') => quote = Some(c),
			(None, ')') => return Some(i),
			_ => {}
		}
	}
	None
}

/// Parse `key=value, key2="quoted value"` into a hash. Values stay raw
/// strings apart from stripping one pair of surrounding quotes.
fn parse_hash(args: &str) -> Option<Hash> {
	let mut hash = Hash::new();
	for part in split_args(args) {
		let part = part.trim();
		if part.is_empty() {
			continue;
		}
		let (key, value) = part.split_once('=')?;
		let key = key.trim();
		if key.is_empty() || !key.chars().all(is_name_char) {
			return None;
		}
		hash.insert(key.to_string(), unquote(value.trim()).to_string());
	}
	Some(hash)
}

fn split_args(args: &str) -> Vec<&str> {
	let mut parts = Vec::new();
	let mut quote = None;
	let mut start = 0;
	for (i, c) in args.char_indices() {
		match (quote, c) {
			(Some(q), c) if c == q => quote = None,
			(Some(_), _) => {}
			(None, '\'' | '"') => quote = Some(c),
			(None, ',') => {
				parts.push(&args[start..i]);
				start = i + 1;
			}
			_ => {}
		}
	}
	parts.push(&args[start..]);
	parts
}

fn unquote(value: &str) -> &str {
	for q in ['"', '\''] {
		if value.len() >= 2
			&& let Some(inner) = value.strip_prefix(q).and_then(|v| v.strip_suffix(q))
		{
			return inner;
		}
	}
	value
}

#[cfg(test)]
mod tests {
	use super::*;

	fn placeholder(name: &str, raw: &str) -> Segment {
		Segment::Placeholder(Placeholder {
			name: name.to_string(),
			hash: Hash::new(),
			raw: raw.to_string(),
		})
	}

	fn literal(text: &str) -> Segment {
		Segment::Literal(text.to_string())
	}

	#[test]
	fn test_parse_placeholders_and_literals() {
		assert_eq!(
			parse_template("blog/:stem/index.html"),
			vec![
				literal("blog/"),
				placeholder("stem", ":stem"),
				literal("/index.html")
			]
		);
	}

	#[test]
	fn test_name_stops_at_dot() {
		assert_eq!(
			parse_template(":dirname/:stem.html"),
			vec![
				placeholder("dirname", ":dirname"),
				literal("/"),
				placeholder("stem", ":stem"),
				literal(".html")
			]
		);
	}

	#[test]
	fn test_numeric_placeholder() {
		assert_eq!(
			parse_template(":folder/:0"),
			vec![
				placeholder("folder", ":folder"),
				literal("/"),
				placeholder("0", ":0")
			]
		);
	}

	#[test]
	fn test_lone_colon_is_literal() {
		assert_eq!(parse_template("a: b:"), vec![literal("a: b:")]);
	}

	#[test]
	fn test_hash_arguments() {
		let segments = parse_template(":foo(name=whatever, other = \"a, b\")/:stem");
		match &segments[0] {
			Segment::Placeholder(p) => {
				assert_eq!(p.name, "foo");
				assert_eq!(p.raw, ":foo(name=whatever, other = \"a, b\")");
				assert_eq!(p.hash.get("name").map(String::as_str), Some("whatever"));
				assert_eq!(p.hash.get("other").map(String::as_str), Some("a, b"));
			}
			other => panic!("Expected placeholder, got {:?}", other),
		}
		assert_eq!(segments[1], literal("/"));
	}

	#[test]
	fn test_empty_argument_list() {
		assert_eq!(parse_template(":foo()"), vec![placeholder("foo", ":foo()")]);
	}

	#[test]
	fn test_has_arguments() {
		let has_arguments = |template: &str| match &parse_template(template)[0] {
			Segment::Placeholder(p) => p.has_arguments(),
			other => panic!("Expected placeholder, got {:?}", other),
		};
		assert!(has_arguments(":foo(name=x)"));
		assert!(has_arguments(":foo()"));
		assert!(!has_arguments(":foo"));
		assert!(!has_arguments(":foo(bar)"));
	}

	#[test]
	fn test_malformed_arguments_stay_literal() {
		assert_eq!(
			parse_template(":foo(bar)"),
			vec![placeholder("foo", ":foo"), literal("(bar)")]
		);
		assert_eq!(
			parse_template(":foo(name=x"),
			vec![placeholder("foo", ":foo"), literal("(name=x")]
		);
	}
}
