use crate::error::{Result, RepathError};
use crate::file::Data;
use crate::rules::{MatchOptions, PatternSpec, Rewriter, RewriterOptions, Rule};
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Top-level configuration from a `.repath.toml` file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
	/// Treat a trailing `/` as significant when matching path patterns.
	#[serde(default)]
	pub strict: bool,

	/// Match path patterns case-sensitively.
	#[serde(default)]
	pub sensitive: bool,

	/// Anchor path patterns at the end of the path.
	#[serde(default = "default_end")]
	pub end: bool,

	/// Named destination templates, usable as a rule's structure.
	#[serde(default)]
	pub presets: BTreeMap<String, String>,

	/// Shared data available to every template.
	#[serde(default)]
	pub data: Data,

	/// Rewrite rules. First matching rule wins.
	#[serde(default)]
	pub rules: Vec<RuleConfig>,
}

fn default_end() -> bool {
	true
}

impl Default for Config {
	fn default() -> Self {
		Config {
			strict: false,
			sensitive: false,
			end: true,
			presets: BTreeMap::new(),
			data: Data::new(),
			rules: Vec::new(),
		}
	}
}

/// A rewrite rule as written in the config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RuleConfig {
	/// Path pattern, e.g. `/content/:folder/*` (mutually exclusive with regex).
	pub pattern: Option<String>,

	/// Raw regex searched anywhere in the path (mutually exclusive with pattern).
	pub regex: Option<String>,

	/// Destination template or preset name.
	pub structure: String,

	/// Copy the captured params into the file data before rendering.
	#[serde(default)]
	pub merge_params: bool,

	/// Regex that vetoes the rule when it matches the path.
	pub exclude: Option<String>,

	/// Per-rule override of the top-level `strict` flag.
	pub strict: Option<bool>,
}

impl RuleConfig {
	/// Validate that exactly one of `pattern` and `regex` is set and that
	/// the regexes compile.
	pub fn validate(&self) -> Result<()> {
		self.spec()?;
		if let Some(ref exclude) = self.exclude {
			compile_regex(exclude)?;
		}
		Ok(())
	}

	fn spec(&self) -> Result<PatternSpec> {
		match (&self.pattern, &self.regex) {
			(Some(_), Some(_)) => Err(RepathError::MutuallyExclusive {
				option1: "pattern".to_string(),
				option2: "regex".to_string(),
			}),
			(Some(pattern), None) => Ok(PatternSpec::Path(pattern.clone())),
			(None, Some(regex)) => Ok(PatternSpec::Regex(compile_regex(regex)?)),
			(None, None) => Err(RepathError::Construction {
				message: "expected a pattern or a regex".to_string(),
			}),
		}
	}

	/// Build a rule, using `defaults` for options the rule does not set.
	pub fn build(&self, defaults: MatchOptions) -> Result<Rule> {
		let spec = self.spec()?;
		let options = MatchOptions {
			strict: self.strict.unwrap_or(defaults.strict),
			..defaults
		};

		let rule = Rule::new(spec, self.structure.as_str())?.with_options(options);

		let exclude = self.exclude.as_deref().map(compile_regex).transpose()?;
		if exclude.is_none() && !self.merge_params {
			return Ok(rule);
		}

		let merge_params = self.merge_params;
		Ok(rule.with_guard(move |file, params, _| {
			if let Some(ref exclude) = exclude
				&& exclude.is_match(&file.path)
			{
				return false;
			}
			if merge_params {
				file.data.extend(params.to_data());
			}
			true
		}))
	}
}

fn compile_regex(pattern: &str) -> Result<Regex> {
	Regex::new(pattern).map_err(|source| RepathError::InvalidRegex {
		pattern: pattern.to_string(),
		source,
	})
}

impl Config {
	/// Validate all rules in this config.
	pub fn validate(&self) -> Result<()> {
		for rule in &self.rules {
			rule.validate()?;
		}
		Ok(())
	}

	/// Match options from the top-level flags.
	pub fn match_options(&self) -> MatchOptions {
		MatchOptions {
			strict: self.strict,
			end: self.end,
			sensitive: self.sensitive,
		}
	}

	/// Build a rewriter holding this config's rules, presets and data.
	pub fn build_rewriter(&self) -> Result<Rewriter> {
		let match_options = self.match_options();
		let mut rewriter = Rewriter::with_options(RewriterOptions { match_options });

		for rule in &self.rules {
			rewriter.add_rule(rule.build(match_options)?);
		}
		for (name, template) in &self.presets {
			rewriter.preset(name.as_str(), template.as_str());
		}
		rewriter.data_mut().extend(self.data.clone());

		Ok(rewriter)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::parser::parse_config_str;
	use std::path::Path;

	fn rewriter_from(content: &str) -> Rewriter {
		parse_config_str(content, Path::new("test.toml"))
			.unwrap()
			.build_rewriter()
			.unwrap()
	}

	#[test]
	fn test_build_rewriter_from_config() {
		let mut rewriter = rewriter_from(
			r#"
[presets]
blog = ":folder/:stem/index.html"

[[rules]]
pattern = "/content/:folder/*"
structure = "blog"
merge_params = true

[[rules]]
regex = "docs"
structure = "docs/:stem/index.html"
"#,
		);

		assert_eq!(rewriter.rules().len(), 2);
		assert_eq!(
			rewriter.rewrite("/content/posts/first-post.md", None).unwrap(),
			"posts/first-post/index.html"
		);
		assert_eq!(
			rewriter.rewrite("content/docs/api.md", None).unwrap(),
			"docs/api/index.html"
		);
	}

	#[test]
	fn test_exclude_vetoes_rule() {
		let mut rewriter = rewriter_from(
			r#"
[[rules]]
regex = '\.md$'
structure = "blog/:stem/index.html"
exclude = "drafts"
"#,
		);

		assert_eq!(
			rewriter.rewrite("posts/hello.md", None).unwrap(),
			"blog/hello/index.html"
		);
		assert_eq!(
			rewriter.rewrite("drafts/hello.md", None).unwrap(),
			"drafts/hello.md"
		);
	}

	#[test]
	fn test_merge_params_into_file_data() {
		let rule = RuleConfig {
			pattern: Some("posts/:year/*".to_string()),
			structure: ":year/:stem".to_string(),
			merge_params: true,
			..Default::default()
		}
		.build(MatchOptions::default())
		.unwrap();

		let mut rewriter = Rewriter::from_rules(vec![rule]);
		assert_eq!(
			rewriter.rewrite("posts/2013/hello-world.md", None).unwrap(),
			"2013/hello-world"
		);
	}

	#[test]
	fn test_rule_strict_overrides_top_level_flag() {
		let mut rewriter = rewriter_from(
			r#"
[[rules]]
pattern = "foo/bar"
structure = "strict.html"
strict = true

[[rules]]
pattern = "foo/bar"
structure = "loose.html"
"#,
		);

		assert!(rewriter.rules()[0].options().strict);
		assert!(!rewriter.rules()[1].options().strict);
		assert_eq!(rewriter.rewrite("foo/bar", None).unwrap(), "strict.html");
		assert_eq!(rewriter.rewrite("foo/bar/", None).unwrap(), "loose.html");
	}

	#[test]
	fn test_shared_data_from_config() {
		let mut rewriter = rewriter_from(
			r#"
[data]
site = "handbook"

[[rules]]
pattern = "*"
structure = ":site/:stem.html"
"#,
		);
		assert_eq!(rewriter.rewrite("a/b.md", None).unwrap(), "handbook/b.html");
	}
}
