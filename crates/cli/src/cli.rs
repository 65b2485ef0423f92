//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use chirp::Overrides;

#[derive(Parser, Debug)]
#[command(name = "chirp")]
#[command(about = "Posts a scripted message to a chat channel on a schedule")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v debug, -vv trace)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Load environment variables from this file instead of ./.env
	#[arg(long, global = true, value_name = "FILE")]
	pub env_file: Option<PathBuf>,

	/// Target channel URL (overrides CHIRP_URL)
	#[arg(long, global = true, value_name = "URL")]
	pub url: Option<String>,

	/// Liveness port (overrides PORT)
	#[arg(long, global = true, value_name = "PORT")]
	pub port: Option<u16>,

	/// Cron expression for the task cadence (overrides CHIRP_SCHEDULE)
	#[arg(long, global = true, value_name = "EXPR")]
	pub schedule: Option<String>,

	/// Selector retry ceiling (overrides CHIRP_MAX_ATTEMPTS)
	#[arg(long, global = true, value_name = "N")]
	pub max_attempts: Option<u32>,

	/// Run the browser with a visible window
	#[arg(long, global = true)]
	pub headful: bool,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Start the scheduler and the liveness endpoint
	Run,
	/// Execute a single task now and exit nonzero unless it sends
	Once,
	/// Resolve configuration, validate the schedule, and print the result
	Check,
}

impl Cli {
	/// Flag-level overrides for config resolution.
	pub fn overrides(&self) -> Overrides {
		Overrides {
			url: self.url.clone(),
			port: self.port,
			schedule: self.schedule.clone(),
			max_attempts: self.max_attempts,
			headful: self.headful,
		}
	}
}
