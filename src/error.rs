use std::path::PathBuf;

/// Library-level structured errors for repath.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum RepathError {
	#[error("Invalid rule: {message}")]
	Construction { message: String },

	#[error("Invalid path pattern {pattern:?}: {message}")]
	Pattern { pattern: String, message: String },

	#[error("Invalid regex pattern in rule: {pattern}")]
	InvalidRegex {
		pattern: String,
		#[source]
		source: regex::Error,
	},

	#[error("Invalid argument: {message}")]
	TypeArgument { message: String },

	#[error("Cyclic preset reference: {chain}")]
	PresetCycle { chain: String },

	#[error("Mutually exclusive options: {option1} and {option2}")]
	MutuallyExclusive { option1: String, option2: String },

	#[error("Config file not found: {path}")]
	ConfigNotFound { path: PathBuf },

	#[error("Failed to read config file: {path}")]
	ConfigReadError {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse config file: {path}")]
	ConfigParseError {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},
}

/// Result type alias using RepathError.
pub type Result<T> = std::result::Result<T, RepathError>;
