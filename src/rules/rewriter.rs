use crate::error::Result;
use crate::file::{Data, File, IntoFile};
use crate::rules::matcher::{Matchable, ParamMap, Rule, find_matching_rule};
use crate::rules::pattern::{MatchOptions, PatternSpec, RawMatch};
use crate::template::{HelperOptions, Resolver};

/// Options applied to rules registered through a `Rewriter`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriterOptions {
	/// Match options given to every rule added with `rule`/`rule_with_guard`.
	pub match_options: MatchOptions,
}

/// An ordered list of rewrite rules plus the presets, helpers and shared
/// data their templates render against.
///
/// Rules are tried in registration order and the first one that matches
/// wins. Each rule keeps its params between calls, so a rewriter must not be
/// shared between concurrent callers without external locking.
#[derive(Debug, Default)]
pub struct Rewriter {
	options: RewriterOptions,
	rules: Vec<Rule>,
	resolver: Resolver,
}

impl Rewriter {
	pub fn new() -> Self {
		Rewriter::default()
	}

	pub fn with_options(options: RewriterOptions) -> Self {
		Rewriter {
			options,
			..Default::default()
		}
	}

	/// Create a rewriter from prebuilt rules, keeping their order.
	pub fn from_rules(rules: Vec<Rule>) -> Self {
		Rewriter {
			rules,
			..Default::default()
		}
	}

	pub fn options(&self) -> &RewriterOptions {
		&self.options
	}

	/// Append a rule.
	pub fn rule(
		&mut self,
		pattern: impl Into<PatternSpec>,
		structure: impl Into<String>,
	) -> Result<&mut Self> {
		let rule = Rule::new(pattern, structure)?.with_options(self.options.match_options);
		Ok(self.add_rule(rule))
	}

	/// Append a rule with a guard that can veto the match or enrich the file.
	pub fn rule_with_guard<F>(
		&mut self,
		pattern: impl Into<PatternSpec>,
		structure: impl Into<String>,
		guard: F,
	) -> Result<&mut Self>
	where
		F: Fn(&mut File, &mut ParamMap, &RawMatch) -> bool + Send + Sync + 'static,
	{
		let rule = Rule::new(pattern, structure)?
			.with_options(self.options.match_options)
			.with_guard(guard);
		Ok(self.add_rule(rule))
	}

	/// Append a prebuilt rule as is.
	pub fn add_rule(&mut self, rule: Rule) -> &mut Self {
		self.rules.push(rule);
		self
	}

	/// Register or overwrite a preset.
	pub fn preset(&mut self, name: impl Into<String>, template: impl Into<String>) -> &mut Self {
		self.resolver.preset(name, template);
		self
	}

	/// Register or overwrite a helper.
	pub fn helper<F>(&mut self, name: impl Into<String>, helper: F) -> &mut Self
	where
		F: Fn(&HelperOptions<'_>) -> String + Send + Sync + 'static,
	{
		self.resolver.helper(name, helper);
		self
	}

	/// Set one shared data value.
	pub fn set_data(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
		self.resolver.data_mut().insert(key.into(), value.into());
		self
	}

	pub fn data(&self) -> &Data {
		self.resolver.data()
	}

	pub fn data_mut(&mut self) -> &mut Data {
		self.resolver.data_mut()
	}

	pub fn rules(&self) -> &[Rule] {
		&self.rules
	}

	pub fn rules_mut(&mut self) -> &mut [Rule] {
		&mut self.rules
	}

	pub fn resolver(&self) -> &Resolver {
		&self.resolver
	}

	/// Compile every rule's matcher and expand every preset now, so pattern
	/// and preset errors surface before the first rewrite.
	pub fn compile_all(&mut self) -> Result<()> {
		for rule in &mut self.rules {
			rule.matcher()?;
		}
		for name in self.resolver.presets().keys() {
			self.resolver.expand_preset(name)?;
		}
		Ok(())
	}

	/// Try one rule against a file without rendering anything.
	pub fn is_match<M: Matchable>(&self, rule: &mut M, file: &mut File) -> Result<bool> {
		rule.attempt_match(file)
	}

	/// Rewrite a path with the first matching rule.
	///
	/// Returns the input path unchanged when no rule matches.
	pub fn rewrite(&mut self, input: impl IntoFile, locals: Option<&Data>) -> Result<String> {
		let mut file = input.into_file()?;

		match find_matching_rule(&mut self.rules, &mut file)? {
			Some(rule) => {
				tracing::debug!(
					pattern = %rule.pattern(),
					structure = rule.structure(),
					path = %file.path,
					"rule matched"
				);
				self.resolver
					.render(rule.structure(), &file, rule.params(), locals)
			}
			None => {
				tracing::debug!(path = %file.path, "no rule matched, keeping path");
				Ok(file.path)
			}
		}
	}

	/// Render a structure (or preset name) for a file without matching.
	pub fn format(
		&self,
		structure: &str,
		file: &File,
		params: &ParamMap,
		locals: Option<&Data>,
	) -> Result<String> {
		self.resolver.render(structure, file, params, locals)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::RepathError;
	use regex::Regex;

	#[test]
	fn test_rule_appends_in_order() {
		let mut rewriter = Rewriter::new();
		rewriter.rule("a", "b").unwrap().rule("c", "d").unwrap();
		assert_eq!(rewriter.rules().len(), 2);
		assert_eq!(rewriter.rules()[0].structure(), "b");
		assert_eq!(rewriter.rules()[1].structure(), "d");
	}

	#[test]
	fn test_from_rules() {
		let rewriter = Rewriter::from_rules(vec![
			Rule::new("a", "b").unwrap(),
			Rule::new("c", "d").unwrap(),
		]);
		assert_eq!(rewriter.rules().len(), 2);
	}

	#[test]
	fn test_rule_rejects_empty_structure() {
		let mut rewriter = Rewriter::new();
		let result = rewriter.rule("a", "");
		assert!(matches!(result, Err(RepathError::Construction { .. })));
	}

	#[test]
	fn test_rules_inherit_rewriter_match_options() {
		let mut rewriter = Rewriter::with_options(RewriterOptions {
			match_options: MatchOptions {
				strict: true,
				..Default::default()
			},
		});
		rewriter.rule("foo/bar", ":stem.html").unwrap();
		assert!(rewriter.rules()[0].options().strict);
		assert_eq!(rewriter.rewrite("foo/bar/", None).unwrap(), "foo/bar/");
		assert_eq!(rewriter.rewrite("foo/bar", None).unwrap(), "bar.html");
	}

	#[test]
	fn test_is_match_with_and_without_guard() {
		let rewriter = Rewriter::new();
		let mut rule_a = Rule::new(Regex::new(r"blog/").unwrap(), ":stem/index.html").unwrap();
		let mut rule_b = Rule::new(Regex::new(r"blog/").unwrap(), ":stem/index.html")
			.unwrap()
			.with_guard(|file, _, _| !file.path.contains("drafts"));

		let mut file_a = File::new("blog/drafts/about.hbs");
		let mut file_b = File::new("blog/content/about.hbs");

		assert!(rewriter.is_match(&mut rule_a, &mut file_a).unwrap());
		assert!(!rewriter.is_match(&mut rule_b, &mut file_a).unwrap());
		assert!(rewriter.is_match(&mut rule_a, &mut file_b).unwrap());
		assert!(rewriter.is_match(&mut rule_b, &mut file_b).unwrap());
	}

	#[test]
	fn test_format_without_matching() {
		let mut rewriter = Rewriter::new();
		rewriter.preset("pretty", ":dirname/:stem/index.html");
		let file = File::new("docs/api.md");
		assert_eq!(
			rewriter.format("pretty", &file, &ParamMap::new(), None).unwrap(),
			"docs/api/index.html"
		);
	}

	#[test]
	fn test_compile_all_reports_pattern_and_preset_errors() {
		let mut rewriter = Rewriter::new();
		rewriter.rule("/ok/:id", ":id").unwrap();
		assert!(rewriter.compile_all().is_ok());

		rewriter.rule("/bad/(x", ":stem").unwrap();
		assert!(matches!(
			rewriter.compile_all(),
			Err(RepathError::Pattern { .. })
		));

		let mut rewriter = Rewriter::new();
		rewriter.preset("a", "b").preset("b", "a");
		assert!(matches!(
			rewriter.compile_all(),
			Err(RepathError::PresetCycle { .. })
		));
	}

	#[test]
	fn test_rules_mut_overrides_matcher() {
		use crate::rules::pattern::{CaptureKey, CompiledMatcher};

		let mut rewriter = Rewriter::new();
		rewriter.rule("posts/:id", "post-:id.html").unwrap();
		rewriter.rules_mut()[0].set_matcher(CompiledMatcher::new(
			Regex::new(r"^articles/(\w+)$").unwrap(),
			vec![CaptureKey::Named("id".to_string())],
		));

		assert_eq!(rewriter.rewrite("posts/1", None).unwrap(), "posts/1");
		assert_eq!(rewriter.rewrite("articles/2", None).unwrap(), "post-2.html");
	}

	#[test]
	fn test_resolver_holds_registered_presets_and_helpers() {
		let mut rewriter = Rewriter::new();
		rewriter.preset("blog", ":stem/index.html");
		rewriter.helper("upper", |options| options.file.stem().to_uppercase());

		let resolver = rewriter.resolver();
		assert_eq!(
			resolver.presets().get("blog").map(String::as_str),
			Some(":stem/index.html")
		);
		assert!(resolver.has_helper("upper"));
		assert!(!resolver.has_helper("lower"));
	}

	#[test]
	fn test_set_data_is_visible_to_templates() {
		let mut rewriter = Rewriter::new();
		rewriter.set_data("site", "docs");
		rewriter.rule("*", ":site/:stem.html").unwrap();
		assert_eq!(rewriter.data().get("site").map(String::as_str), Some("docs"));
		assert_eq!(rewriter.rewrite("x/y.md", None).unwrap(), "docs/y.html");
	}
}
