//! Configuration loading and parsing for repath.
//!
//! This module handles:
//! - TOML config file parsing
//! - Building a rewriter from rules, presets and shared data
//! - The starter config written by `--init`

pub mod init;
pub mod parser;
pub mod types;

pub use init::generate_init_template;
pub use parser::{parse_config_file, parse_config_str};
pub use types::{Config, RuleConfig};

/// Config file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".repath.toml";
