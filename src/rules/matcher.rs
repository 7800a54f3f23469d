use crate::error::{Result, RepathError};
use crate::file::{Data, File};
use crate::rules::pattern::{
	CaptureKey, CompiledMatcher, MatchOptions, PatternSpec, RawMatch, compile,
};
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;

/// Captured values of the most recent successful match on a rule.
///
/// The map is owned by the rule and reused across attempts: each structural
/// match overwrites the keys of its pattern in capture order, so a name used
/// twice ends up holding the value of its last occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamMap {
	values: BTreeMap<CaptureKey, String>,
}

impl ParamMap {
	pub fn new() -> Self {
		ParamMap::default()
	}

	pub fn get(&self, key: impl Into<CaptureKey>) -> Option<&str> {
		self.values.get(&key.into()).map(String::as_str)
	}

	pub fn insert(&mut self, key: impl Into<CaptureKey>, value: impl Into<String>) -> Option<String> {
		self.values.insert(key.into(), value.into())
	}

	pub fn remove(&mut self, key: impl Into<CaptureKey>) -> Option<String> {
		self.values.remove(&key.into())
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}

	pub fn iter(&self) -> btree_map::Iter<'_, CaptureKey, String> {
		self.values.iter()
	}

	/// Apply one match's captures in order. A group that did not participate
	/// removes its key.
	pub fn apply(&mut self, assignments: Vec<(CaptureKey, Option<String>)>) {
		for (key, value) in assignments {
			match value {
				Some(value) => {
					self.values.insert(key, value);
				}
				None => {
					self.values.remove(&key);
				}
			}
		}
	}

	/// The params as string data, e.g. for merging into `File::data`.
	pub fn to_data(&self) -> Data {
		self.values
			.iter()
			.map(|(key, value)| (key.to_string(), value.clone()))
			.collect()
	}
}

impl<'a> IntoIterator for &'a ParamMap {
	type Item = (&'a CaptureKey, &'a String);
	type IntoIter = btree_map::Iter<'a, CaptureKey, String>;

	fn into_iter(self) -> Self::IntoIter {
		self.values.iter()
	}
}

impl<K: Into<CaptureKey>, V: Into<String>> FromIterator<(K, V)> for ParamMap {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		ParamMap {
			values: iter
				.into_iter()
				.map(|(key, value)| (key.into(), value.into()))
				.collect(),
		}
	}
}

/// Guard run after a structural match. Returning false vetoes the rule.
///
/// It may also enrich the file, e.g. by merging the params into `file.data`;
/// the engine never does that on its own.
pub type Guard = Box<dyn Fn(&mut File, &mut ParamMap, &RawMatch) -> bool + Send + Sync>;

/// Something a rewriter can try against a file.
pub trait Matchable {
	/// Try to match `file`. `Ok(false)` means the rule does not apply.
	fn attempt_match(&mut self, file: &mut File) -> Result<bool>;
}

/// A rewrite rule: pattern, destination structure and optional guard.
pub struct Rule {
	pattern: PatternSpec,
	structure: String,
	guard: Option<Guard>,
	options: MatchOptions,
	matcher: Option<CompiledMatcher>,
	params: ParamMap,
}

impl Rule {
	/// Create a rule. The pattern is compiled on first use, so pattern
	/// errors surface from the first match attempt.
	///
	/// An empty or whitespace-only structure is rejected.
	pub fn new(pattern: impl Into<PatternSpec>, structure: impl Into<String>) -> Result<Self> {
		let structure = structure.into();
		if structure.trim().is_empty() {
			return Err(RepathError::Construction {
				message: "expected structure to be a non-empty string".to_string(),
			});
		}

		Ok(Rule {
			pattern: pattern.into(),
			structure,
			guard: None,
			options: MatchOptions::default(),
			matcher: None,
			params: ParamMap::new(),
		})
	}

	/// Attach a guard.
	pub fn with_guard<F>(mut self, guard: F) -> Self
	where
		F: Fn(&mut File, &mut ParamMap, &RawMatch) -> bool + Send + Sync + 'static,
	{
		self.guard = Some(Box::new(guard));
		self
	}

	/// Set match options. Drops any cached matcher.
	pub fn with_options(mut self, options: MatchOptions) -> Self {
		self.options = options;
		self.matcher = None;
		self
	}

	pub fn pattern(&self) -> &PatternSpec {
		&self.pattern
	}

	pub fn structure(&self) -> &str {
		&self.structure
	}

	pub fn options(&self) -> &MatchOptions {
		&self.options
	}

	pub fn has_guard(&self) -> bool {
		self.guard.is_some()
	}

	pub fn params(&self) -> &ParamMap {
		&self.params
	}

	pub fn params_mut(&mut self) -> &mut ParamMap {
		&mut self.params
	}

	/// The compiled matcher, compiling and caching it on first access.
	pub fn matcher(&mut self) -> Result<&CompiledMatcher> {
		let matcher = match self.matcher.take() {
			Some(matcher) => matcher,
			None => compile(&self.pattern, &self.options)?,
		};
		let matcher: &CompiledMatcher = self.matcher.insert(matcher);
		Ok(matcher)
	}

	/// Replace the compiled matcher, bypassing compilation.
	pub fn set_matcher(&mut self, matcher: CompiledMatcher) {
		self.matcher = Some(matcher);
	}

	/// Capture keys of the compiled matcher.
	pub fn keys(&mut self) -> Result<&[CaptureKey]> {
		Ok(self.matcher()?.keys())
	}
}

impl Matchable for Rule {
	fn attempt_match(&mut self, file: &mut File) -> Result<bool> {
		let (raw, assignments) = {
			let matcher = self.matcher()?;
			match matcher.exec(&file.path) {
				Some(raw) => {
					let assignments = matcher.assignments(&raw);
					(raw, assignments)
				}
				None => {
					tracing::trace!(pattern = %self.pattern, path = %file.path, "no structural match");
					return Ok(false);
				}
			}
		};

		self.params.apply(assignments);

		match &self.guard {
			Some(guard) => {
				let accepted = guard(file, &mut self.params, &raw);
				if !accepted {
					tracing::debug!(pattern = %self.pattern, path = %file.path, "guard vetoed match");
				}
				Ok(accepted)
			}
			None => Ok(true),
		}
	}
}

impl fmt::Debug for Rule {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Rule")
			.field("pattern", &self.pattern)
			.field("structure", &self.structure)
			.field("guard", &self.guard.is_some())
			.field("options", &self.options)
			.field("compiled", &self.matcher.is_some())
			.field("params", &self.params)
			.finish()
	}
}

/// Find the first rule that accepts `file`, in order.
pub fn find_matching_rule<'a>(rules: &'a mut [Rule], file: &mut File) -> Result<Option<&'a mut Rule>> {
	for rule in rules.iter_mut() {
		if rule.attempt_match(file)? {
			return Ok(Some(rule));
		}
	}
	Ok(None)
}
