//! Subcommand dispatch.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use tracing::{error, info};

use chirp::{Config, EphemeralSessionManager, Scheduler, TaskOutcome, TaskRunner, server};

use crate::cli::{Cli, Commands};

pub async fn dispatch(cli: Cli) -> anyhow::Result<()> {
	load_env(cli.env_file.as_deref())?;
	let config = Config::from_env(&cli.overrides())?;

	match cli.command {
		Commands::Run => run(config).await,
		Commands::Once => once(config).await,
		Commands::Check => check(&config),
	}
}

/// Daemon mode: liveness endpoint plus the scheduler loop.
async fn run(config: Config) -> anyhow::Result<()> {
	let scheduler = Scheduler::parse(&config.schedule)?;
	let listener = server::bind(config.port)
		.await
		.with_context(|| format!("cannot bind liveness port {}", config.port))?;
	tokio::spawn(async move {
		if let Err(err) = server::serve(listener).await {
			error!(target = "chirp.http", error = %err, "liveness server exited");
		}
	});

	let manager = Arc::new(EphemeralSessionManager::new(config.clone()));
	let runner = Arc::new(TaskRunner::new(config, manager));
	scheduler.run(runner).await;
	Ok(())
}

/// Single immediate run; the exit code reports whether the message went out.
async fn once(config: Config) -> anyhow::Result<()> {
	let manager = Arc::new(EphemeralSessionManager::new(config.clone()));
	let runner = TaskRunner::new(config, manager);
	match runner.tick().await {
		TaskOutcome::Sent => Ok(()),
		outcome => bail!("run finished without sending: {outcome:?}"),
	}
}

/// Prints the resolved settings (secret masked) and validates the schedule.
fn check(config: &Config) -> anyhow::Result<()> {
	let scheduler = Scheduler::parse(&config.schedule)?;
	println!("{}", serde_json::to_string_pretty(&config.report())?);
	match scheduler.next_after_now() {
		Some(next) => info!(target = "chirp", next = %next, "configuration ok"),
		None => info!(target = "chirp", "configuration ok; schedule has no upcoming firings"),
	}
	Ok(())
}

/// Loads environment variables from a file before config resolution.
///
/// An explicit `--env-file` must exist; the implicit `./.env` is optional.
/// Variables already present in the process environment win either way.
fn load_env(path: Option<&Path>) -> anyhow::Result<()> {
	match path {
		Some(path) => {
			dotenvy::from_path(path).with_context(|| format!("cannot load env file {}", path.display()))?;
		}
		None => {
			let _ = dotenvy::dotenv();
		}
	}
	Ok(())
}
