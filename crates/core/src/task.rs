//! Per-tick task sequencing and failure isolation.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::session::{Session, SessionManager};
use crate::steps::{self, StepStatus};

/// Result of one scheduled run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
	/// Message dispatched.
	Sent,
	/// Run did not happen or stopped early; the reason feeds the log line.
	Skipped(String),
	/// Run started and failed; the rendered error feeds the log line.
	Failed(String),
}

/// Runs the login-and-post sequence against fresh sessions.
///
/// [`TaskRunner::tick`] never returns an error: every failure inside a run
/// is folded into the outcome so the schedule keeps going.
pub struct TaskRunner {
	config: Config,
	manager: Arc<dyn SessionManager>,
	running: Mutex<()>,
}

impl TaskRunner {
	pub fn new(config: Config, manager: Arc<dyn SessionManager>) -> Self {
		Self {
			config,
			manager,
			running: Mutex::new(()),
		}
	}

	/// Executes one run unless a previous run is still in flight.
	pub async fn tick(&self) -> TaskOutcome {
		let Ok(_guard) = self.running.try_lock() else {
			warn!(target = "chirp.task", "previous run still in flight; skipping tick");
			return TaskOutcome::Skipped("previous run still in flight".to_string());
		};

		info!(target = "chirp.task", "run started");
		let outcome = match self.run_once().await {
			Ok(outcome) => outcome,
			Err(err) => {
				error!(target = "chirp.task", error = %err, "run failed");
				TaskOutcome::Failed(err.to_string())
			}
		};
		info!(target = "chirp.task", outcome = ?outcome, "run finished");
		outcome
	}

	/// One acquire-to-release pass. The session is released on every path
	/// out of the steps, including errors.
	async fn run_once(&self) -> Result<TaskOutcome> {
		let session = self.manager.acquire().await?;
		let result = self.run_steps(&session).await;
		session.release().await;
		result
	}

	async fn run_steps(&self, session: &Session) -> Result<TaskOutcome> {
		let driver = session.driver();

		if session.probe_authenticated().await {
			info!(target = "chirp.task", "already logged in");
		} else if steps::login(driver, &self.config).await? == StepStatus::SelectorMissing {
			return Ok(TaskOutcome::Skipped("login form never appeared".to_string()));
		}

		match steps::send_message(driver, &self.config).await? {
			StepStatus::Completed => Ok(TaskOutcome::Sent),
			StepStatus::SelectorMissing => {
				Ok(TaskOutcome::Skipped("channel list never appeared".to_string()))
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use async_trait::async_trait;
	use tokio::sync::Notify;

	use super::*;
	use crate::browser::{FakeDriverBuilder, FakeSessionManager};
	use crate::config::{Selectors, Timing};
	use crate::error::ChirpError;

	fn test_config() -> Config {
		Config {
			url: "https://chat.example.com/channels/general".to_string(),
			email: "bot@example.com".to_string(),
			password: "hunter2".to_string(),
			port: 4567,
			schedule: "*/2 * * * *".to_string(),
			max_attempts: 3,
			headless: true,
			selectors: Selectors::default(),
			timing: Timing {
				login_settle: Duration::ZERO,
				palette_settle: Duration::ZERO,
				type_delay: Duration::ZERO,
				..Timing::default()
			},
		}
	}

	fn marker() -> String {
		Selectors::default().logged_in_marker
	}

	#[tokio::test]
	async fn acquire_failure_becomes_a_failed_outcome() {
		let manager = Arc::new(FakeSessionManager::new(marker()));
		let runner = TaskRunner::new(test_config(), manager);

		let outcome = runner.tick().await;

		match outcome {
			TaskOutcome::Failed(reason) => assert!(reason.contains("no scripted session")),
			other => panic!("expected Failed, got {other:?}"),
		}
	}

	#[tokio::test]
	async fn probe_true_skips_login() {
		let manager = Arc::new(FakeSessionManager::new(marker()));
		let (driver, controller) = FakeDriverBuilder::new().exists(true).find_found().build();
		manager.push(driver);
		let runner = TaskRunner::new(test_config(), manager);

		let outcome = runner.tick().await;

		assert_eq!(outcome, TaskOutcome::Sent);
		assert!(controller.typed_into().is_empty(), "no credentials when already logged in");
	}

	#[tokio::test]
	async fn probe_false_logs_in_before_sending() {
		let manager = Arc::new(FakeSessionManager::new(marker()));
		let (driver, controller) = FakeDriverBuilder::new()
			.exists(false)
			.find_found()
			.find_found()
			.build();
		manager.push(driver);
		let runner = TaskRunner::new(test_config(), manager);

		let outcome = runner.tick().await;

		assert_eq!(outcome, TaskOutcome::Sent);
		assert_eq!(controller.typed_into().len(), 2, "email and password");
	}

	#[tokio::test]
	async fn step_error_still_releases_the_session() {
		let manager = Arc::new(FakeSessionManager::new(marker()));
		let (driver, controller) = FakeDriverBuilder::new()
			.find_found()
			.fail_input("node detached")
			.build();
		manager.push(driver);
		let runner = TaskRunner::new(test_config(), manager);

		let outcome = runner.tick().await;

		assert!(matches!(outcome, TaskOutcome::Failed(_)), "got {outcome:?}");
		assert_eq!(controller.close_count(), 1, "teardown must run exactly once");
	}

	#[tokio::test]
	async fn missing_login_form_skips_the_run_and_releases() {
		let manager = Arc::new(FakeSessionManager::new(marker()));
		let (driver, controller) = FakeDriverBuilder::new().find_missing(3).build();
		manager.push(driver);
		let runner = TaskRunner::new(test_config(), manager);

		let outcome = runner.tick().await;

		assert_eq!(outcome, TaskOutcome::Skipped("login form never appeared".to_string()));
		assert_eq!(controller.close_count(), 1);
		assert!(controller.keys_pressed().is_empty());
	}

	/// Manager that parks inside `acquire` until the test opens the gate.
	struct StallManager {
		entered: Notify,
		gate: Notify,
	}

	#[async_trait]
	impl SessionManager for StallManager {
		async fn acquire(&self) -> crate::error::Result<Session> {
			self.entered.notify_one();
			self.gate.notified().await;
			Err(ChirpError::BrowserLaunch("stalled".to_string()))
		}
	}

	#[tokio::test]
	async fn overlapping_tick_is_skipped() {
		let manager = Arc::new(StallManager {
			entered: Notify::new(),
			gate: Notify::new(),
		});
		let runner = Arc::new(TaskRunner::new(test_config(), manager.clone()));

		let background = {
			let runner = runner.clone();
			tokio::spawn(async move { runner.tick().await })
		};
		manager.entered.notified().await;

		let outcome = runner.tick().await;
		assert_eq!(outcome, TaskOutcome::Skipped("previous run still in flight".to_string()));

		manager.gate.notify_one();
		let first = background.await.unwrap();
		assert!(matches!(first, TaskOutcome::Failed(_)), "got {first:?}");
	}
}
