//! Minimal file abstraction matched and rendered by the rewriter.
//!
//! A `File` is a path plus a mutable string map of auxiliary data. The
//! path-derived attributes (`dirname`, `basename`, `stem`, `extname`) are
//! computed from `path` on access, using POSIX semantics, so a guard that
//! edits `path` never leaves them stale.

use crate::error::{Result, RepathError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// String map used for file data, shared rewriter data and render locals.
pub type Data = BTreeMap<String, String>;

/// A file path plus auxiliary data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct File {
	/// The path as given by the caller.
	pub path: String,

	/// Auxiliary data visible to templates. Guards may add to it.
	pub data: Data,
}

impl File {
	/// Create a file with empty data.
	pub fn new(path: impl Into<String>) -> Self {
		File {
			path: path.into(),
			data: Data::new(),
		}
	}

	/// Create a file with the given data.
	pub fn with_data(path: impl Into<String>, data: Data) -> Self {
		File {
			path: path.into(),
			data,
		}
	}

	/// Directory portion of the path (`"."` when there is none).
	pub fn dirname(&self) -> &str {
		dirname(&self.path)
	}

	/// Final path component, extension included.
	pub fn basename(&self) -> &str {
		basename(&self.path)
	}

	/// Extension of the basename including the leading dot, or `""`.
	pub fn extname(&self) -> &str {
		extname(self.basename())
	}

	/// Basename without its extension.
	pub fn stem(&self) -> &str {
		let base = self.basename();
		&base[..base.len() - self.extname().len()]
	}

	/// Look up a path-derived attribute by its template name.
	pub fn attribute(&self, name: &str) -> Option<&str> {
		match name {
			"path" => Some(&self.path),
			"dirname" => Some(self.dirname()),
			"basename" => Some(self.basename()),
			"stem" => Some(self.stem()),
			"extname" => Some(self.extname()),
			_ => None,
		}
	}
}

fn trim_trailing_separators(path: &str) -> &str {
	let trimmed = path.trim_end_matches('/');
	if trimmed.is_empty() && path.starts_with('/') {
		"/"
	} else {
		trimmed
	}
}

fn dirname(path: &str) -> &str {
	let trimmed = trim_trailing_separators(path);
	if trimmed == "/" {
		return "/";
	}
	match trimmed.rfind('/') {
		None => ".",
		Some(idx) => {
			let parent = trimmed[..idx].trim_end_matches('/');
			if parent.is_empty() { "/" } else { parent }
		}
	}
}

fn basename(path: &str) -> &str {
	let trimmed = trim_trailing_separators(path);
	if trimmed == "/" {
		return "";
	}
	match trimmed.rfind('/') {
		Some(idx) => &trimmed[idx + 1..],
		None => trimmed,
	}
}

fn extname(base: &str) -> &str {
	if base == ".." {
		return "";
	}
	match base.rfind('.') {
		Some(0) | None => "",
		Some(idx) => &base[idx..],
	}
}

/// Conversion of path-like input into a `File`.
///
/// Strings and already-built files convert infallibly; `Path`s fail with
/// `TypeArgument` when they are not valid UTF-8.
pub trait IntoFile {
	fn into_file(self) -> Result<File>;
}

impl IntoFile for File {
	fn into_file(self) -> Result<File> {
		Ok(self)
	}
}

impl IntoFile for &File {
	fn into_file(self) -> Result<File> {
		Ok(self.clone())
	}
}

impl IntoFile for &str {
	fn into_file(self) -> Result<File> {
		Ok(File::new(self))
	}
}

impl IntoFile for String {
	fn into_file(self) -> Result<File> {
		Ok(File::new(self))
	}
}

impl IntoFile for &String {
	fn into_file(self) -> Result<File> {
		Ok(File::new(self.as_str()))
	}
}

impl IntoFile for &Path {
	fn into_file(self) -> Result<File> {
		self.to_str()
			.map(File::new)
			.ok_or_else(|| RepathError::TypeArgument {
				message: format!("expected a UTF-8 file path, got {}", self.display()),
			})
	}
}

impl IntoFile for PathBuf {
	fn into_file(self) -> Result<File> {
		self.as_path().into_file()
	}
}

impl IntoFile for &PathBuf {
	fn into_file(self) -> Result<File> {
		self.as_path().into_file()
	}
}
