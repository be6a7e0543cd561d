//! Main entry point for the flooring order tool.
//!
//! Loads configuration, wires the configured partition backend and the
//! reference data into an engine, then runs a single command against it.

use clap::Parser;
use flooring_config::Config;
use flooring_core::{EngineBuilder, FlooringEngine};
use std::path::PathBuf;

mod commands;

use commands::Command;

/// Command-line arguments for the flooring order tool.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config/flooring.toml", env = "FLOORING_CONFIG")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	// Logs go to stderr so command output stays clean
	fmt()
		.with_env_filter(env_filter)
		.with_target(true)
		.with_writer(std::io::stderr)
		.init();

	let config = Config::from_file(&args.config)?;
	tracing::debug!(path = %args.config.display(), "Loaded configuration");

	let mut engine = build_engine(config)?;
	let mut stdout = std::io::stdout().lock();
	commands::run(&mut engine, args.command, &mut stdout)
}

/// Builds the engine with every available partition backend registered.
fn build_engine(config: Config) -> Result<FlooringEngine, Box<dyn std::error::Error>> {
	let engine = EngineBuilder::new(config)
		.with_factories(flooring_storage::get_all_implementations())
		.build()?;
	Ok(engine)
}
