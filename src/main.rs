use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use repath::Data;
use repath::config::{
	Config, DEFAULT_CONFIG_FILE, generate_init_template, parse_config_file,
};

#[derive(Parser)]
#[command(name = "repath")]
#[command(
	author,
	version,
	about = "Rewrite source file paths into output paths using pattern rules"
)]
#[command(arg_required_else_help = true)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	/// Config file with rules, presets and data (default: ./.repath.toml)
	#[arg(long, short, value_name = "FILE", global = true)]
	config: Option<PathBuf>,

	/// Treat a trailing "/" as significant for rules without their own setting
	#[arg(long)]
	strict: bool,

	/// Extra template value available as ":KEY" (repeatable)
	#[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
	set: Vec<(String, String)>,

	/// Create a template .repath.toml in the current directory
	#[arg(long)]
	init: bool,

	/// Overwrite existing .repath.toml when using --init
	#[arg(long, requires = "init")]
	force: bool,

	/// Log rule matching to stderr (overridden by REPATH_LOG)
	#[arg(long, short, global = true)]
	verbose: bool,

	/// Paths to rewrite, one output line each
	paths: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
	/// Configuration management commands
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},
}

#[derive(Subcommand)]
enum ConfigAction {
	/// Display the effective rules, presets and data
	Show,
	/// Check the config file and compile every rule without rewriting anything
	Validate,
}

fn main() -> ExitCode {
	match run() {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();
	init_logging(cli.verbose);

	// Handle --init
	if cli.init {
		return handle_init(cli.force);
	}

	// Handle subcommands
	if let Some(command) = &cli.command {
		let config_path = config_path(cli.config.as_deref());
		return match command {
			Commands::Config { action } => match action {
				ConfigAction::Show => handle_config_show(&config_path),
				ConfigAction::Validate => handle_config_validate(&config_path),
			},
		};
	}

	// Handle path rewriting
	if !cli.paths.is_empty() {
		return handle_rewrite(&cli);
	}

	// No paths given - this shouldn't happen due to arg_required_else_help
	Ok(ExitCode::SUCCESS)
}

fn init_logging(verbose: bool) {
	let default_level = if verbose { "debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_env("REPATH_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));

	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.try_init();
}

fn parse_key_value(input: &str) -> std::result::Result<(String, String), String> {
	input
		.split_once('=')
		.filter(|(key, _)| !key.is_empty())
		.map(|(key, value)| (key.to_string(), value.to_string()))
		.ok_or_else(|| format!("expected KEY=VALUE, got {input:?}"))
}

fn config_path(explicit: Option<&Path>) -> PathBuf {
	explicit
		.map(Path::to_path_buf)
		.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

fn handle_init(force: bool) -> Result<ExitCode> {
	let config_path = PathBuf::from(DEFAULT_CONFIG_FILE);

	if config_path.exists() && !force {
		anyhow::bail!("{} already exists. Use --force to overwrite.", DEFAULT_CONFIG_FILE);
	}

	std::fs::write(&config_path, generate_init_template())
		.with_context(|| format!("Failed to write {}", config_path.display()))?;

	println!("Created {}", DEFAULT_CONFIG_FILE);
	Ok(ExitCode::SUCCESS)
}

fn handle_rewrite(cli: &Cli) -> Result<ExitCode> {
	let config_path = config_path(cli.config.as_deref());
	let mut config = parse_config_file(&config_path)
		.with_context(|| format!("Failed to load configuration: {}", config_path.display()))?;

	if cli.strict {
		config.strict = true;
	}

	let mut rewriter = config
		.build_rewriter()
		.context("Failed to build rewrite rules")?;

	let locals: Data = cli.set.iter().cloned().collect();
	let locals = (!locals.is_empty()).then_some(&locals);

	for path in &cli.paths {
		let rewritten = rewriter
			.rewrite(path.as_str(), locals)
			.with_context(|| format!("Failed to rewrite: {}", path))?;
		println!("{}", rewritten);
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_config_show(config_path: &Path) -> Result<ExitCode> {
	if !config_path.exists() {
		println!("No configuration file found.");
		return Ok(ExitCode::SUCCESS);
	}

	let config = parse_config_file(config_path)
		.with_context(|| format!("Failed to load configuration: {}", config_path.display()))?;

	print_config(config_path, &config);
	Ok(ExitCode::SUCCESS)
}

fn print_config(config_path: &Path, config: &Config) {
	println!("# Source: {}", config_path.display());
	println!("# strict: {}", config.strict);
	println!("# sensitive: {}", config.sensitive);
	println!("# end: {}", config.end);
	println!("# rules: {}", config.rules.len());
	println!();

	if !config.presets.is_empty() {
		println!("  Presets:");
		for (name, template) in &config.presets {
			println!("    {} = {}", name, template);
		}
		println!();
	}

	if !config.data.is_empty() {
		println!("  Data:");
		for (key, value) in &config.data {
			println!("    {} = {}", key, value);
		}
		println!();
	}

	for (i, rule) in config.rules.iter().enumerate() {
		println!("  Rule {}:", i + 1);
		if let Some(ref pattern) = rule.pattern {
			println!("    pattern: {}", pattern);
		}
		if let Some(ref regex) = rule.regex {
			println!("    regex: {}", regex);
		}
		println!("    structure: {}", rule.structure);
		if let Some(ref exclude) = rule.exclude {
			println!("    exclude: {}", exclude);
		}
		if rule.merge_params {
			println!("    merge_params: true");
		}
		if let Some(strict) = rule.strict {
			println!("    strict: {}", strict);
		}
		println!();
	}
}

fn handle_config_validate(config_path: &Path) -> Result<ExitCode> {
	if !config_path.exists() {
		println!("No configuration file found.");
		return Ok(ExitCode::SUCCESS);
	}

	let checked = parse_config_file(config_path)
		.and_then(|config| config.build_rewriter())
		.and_then(|mut rewriter| rewriter.compile_all().map(|_| rewriter));

	match checked {
		Ok(rewriter) => {
			println!(
				"Configuration is valid: {} ({} rules)",
				config_path.display(),
				rewriter.rules().len()
			);
			Ok(ExitCode::SUCCESS)
		}
		Err(e) => {
			eprintln!("Configuration error: {}", e);
			Ok(ExitCode::FAILURE)
		}
	}
}
