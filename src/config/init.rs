/// Template written by `repath --init`.
pub fn generate_init_template() -> String {
	r#"# repath configuration
#
# Rules are tried in order; the first matching rule rewrites the path.
# Paths that no rule matches are printed unchanged.

# Treat a trailing "/" as significant when matching patterns.
strict = false

# Match patterns case-sensitively.
sensitive = false

[presets]
pretty = ":dirname/:stem/index.html"
blog = ":folder/:stem/index.html"

[data]
site = "my-site"

# Path pattern: ":name" captures a segment, "*" captures the rest.
[[rules]]
pattern = "content/:folder/*.md"
structure = "blog"
exclude = "drafts"

# Raw regex, searched anywhere in the path.
[[rules]]
regex = '\.hbs$'
structure = "pretty"
"#
	.to_string()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::parser::parse_config_str;
	use std::path::Path;

	#[test]
	fn test_init_template_is_valid_config() {
		let config = parse_config_str(&generate_init_template(), Path::new(".repath.toml")).unwrap();
		assert_eq!(config.rules.len(), 2);
		assert_eq!(config.presets.len(), 2);

		let mut rewriter = config.build_rewriter().unwrap();
		assert_eq!(
			rewriter.rewrite("content/posts/hello.md", None).unwrap(),
			"posts/hello/index.html"
		);
		assert_eq!(
			rewriter.rewrite("content/drafts/wip.md", None).unwrap(),
			"content/drafts/wip.md"
		);
		assert_eq!(
			rewriter.rewrite("layouts/default.hbs", None).unwrap(),
			"layouts/default/index.html"
		);
	}
}
