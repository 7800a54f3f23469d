use crate::error::{Result, RepathError};
use crate::file::{Data, File};
use crate::rules::matcher::ParamMap;
use crate::rules::pattern::CaptureKey;
use crate::template::token::{Hash, Placeholder, Segment, parse_template};
use std::collections::BTreeMap;
use std::fmt;

/// Everything a helper can see when it is invoked from a template.
#[derive(Debug, Clone, Copy)]
pub struct HelperOptions<'a> {
	/// The file being rewritten.
	pub file: &'a File,

	/// The rewriter's shared data.
	pub context: &'a Data,

	/// Params of the matched rule.
	pub params: &'a ParamMap,

	/// Inline arguments from the call site, as raw strings.
	pub hash: &'a Hash,
}

/// A named function callable from a template as `:name` or `:name(k=v)`.
pub type Helper = Box<dyn Fn(&HelperOptions<'_>) -> String + Send + Sync>;

/// Renders destination templates against presets, helpers and shared data.
///
/// Placeholder lookup order, highest first:
/// 1. inline hash arguments of the placeholder
/// 2. the helper of that name, if the placeholder has an argument list
/// 3. call-site locals
/// 4. the rule's params
/// 5. `file.data`
/// 6. file attributes (`path`, `dirname`, `basename`, `stem`, `extname`)
/// 7. helpers
/// 8. shared data
///
/// A placeholder found nowhere is left in the output exactly as written.
#[derive(Default)]
pub struct Resolver {
	presets: BTreeMap<String, String>,
	helpers: BTreeMap<String, Helper>,
	data: Data,
}

impl Resolver {
	pub fn new() -> Self {
		Resolver::default()
	}

	/// Register or overwrite a preset.
	pub fn preset(&mut self, name: impl Into<String>, template: impl Into<String>) {
		self.presets.insert(name.into(), template.into());
	}

	/// Register or overwrite a helper.
	pub fn helper<F>(&mut self, name: impl Into<String>, helper: F)
	where
		F: Fn(&HelperOptions<'_>) -> String + Send + Sync + 'static,
	{
		self.helpers.insert(name.into(), Box::new(helper));
	}

	pub fn presets(&self) -> &BTreeMap<String, String> {
		&self.presets
	}

	pub fn has_helper(&self, name: &str) -> bool {
		self.helpers.contains_key(name)
	}

	pub fn data(&self) -> &Data {
		&self.data
	}

	pub fn data_mut(&mut self) -> &mut Data {
		&mut self.data
	}

	/// Follow preset names until reaching a template that is not one.
	pub fn expand_preset<'a>(&'a self, structure: &'a str) -> Result<&'a str> {
		let mut chain = vec![structure];
		let mut current = structure;

		while let Some(next) = self.presets.get(current) {
			let next = next.as_str();
			if chain.contains(&next) {
				chain.push(next);
				return Err(RepathError::PresetCycle {
					chain: chain.join(" -> "),
				});
			}
			chain.push(next);
			current = next;
		}

		Ok(current)
	}

	/// Render `structure` for `file`.
	pub fn render(
		&self,
		structure: &str,
		file: &File,
		params: &ParamMap,
		locals: Option<&Data>,
	) -> Result<String> {
		let template = self.expand_preset(structure)?;
		let mut output = String::with_capacity(template.len());

		for segment in parse_template(template) {
			match segment {
				Segment::Literal(text) => output.push_str(&text),
				Segment::Placeholder(placeholder) => {
					match self.resolve(&placeholder, file, params, locals) {
						Some(value) => output.push_str(&value),
						None => {
							tracing::debug!(
								placeholder = %placeholder.raw,
								path = %file.path,
								"unresolved placeholder left in output"
							);
							output.push_str(&placeholder.raw);
						}
					}
				}
			}
		}

		Ok(output)
	}

	fn resolve(
		&self,
		placeholder: &Placeholder,
		file: &File,
		params: &ParamMap,
		locals: Option<&Data>,
	) -> Option<String> {
		let name = placeholder.name.as_str();

		if let Some(value) = placeholder.hash.get(name) {
			return Some(value.clone());
		}
		// An argument list addresses the helper directly
		if placeholder.has_arguments()
			&& let Some(helper) = self.helpers.get(name)
		{
			return Some(self.call_helper(helper, placeholder, file, params));
		}
		if let Some(value) = locals.and_then(|locals| locals.get(name)) {
			return Some(value.clone());
		}
		if let Some(value) = params
			.get(CaptureKey::parse(name))
			.or_else(|| params.get(CaptureKey::Named(name.to_string())))
		{
			return Some(value.to_string());
		}
		if let Some(value) = file.data.get(name) {
			return Some(value.clone());
		}
		if let Some(value) = file.attribute(name) {
			return Some(value.to_string());
		}
		if let Some(helper) = self.helpers.get(name) {
			return Some(self.call_helper(helper, placeholder, file, params));
		}
		self.data.get(name).cloned()
	}

	fn call_helper(
		&self,
		helper: &Helper,
		placeholder: &Placeholder,
		file: &File,
		params: &ParamMap,
	) -> String {
		helper(&HelperOptions {
			file,
			context: &self.data,
			params,
			hash: &placeholder.hash,
		})
	}
}

impl fmt::Debug for Resolver {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Resolver")
			.field("presets", &self.presets)
			.field("helpers", &self.helpers.keys().collect::<Vec<_>>())
			.field("data", &self.data)
			.finish()
	}
}
