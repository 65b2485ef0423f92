//! Credential entry and submission.

use tokio::time::sleep;
use tracing::{info, warn};

use crate::browser::PageDriver;
use crate::config::Config;
use crate::error::Result;
use crate::locate::locate;
use crate::steps::StepStatus;

/// Fills the login form and submits it.
///
/// The email field is the readiness signal; if it never appears the step
/// stops with [`StepStatus::SelectorMissing`] and touches nothing else. The
/// post-submit navigation wait is bounded, and a timeout is tolerated
/// because the app can complete login without a full navigation.
pub async fn login(driver: &dyn PageDriver, config: &Config) -> Result<StepStatus> {
	info!(target = "chirp.task", "logging in");

	if !locate(driver, &config.selectors.email_input, config.max_attempts, &config.timing).await {
		warn!(target = "chirp.task", selector = %config.selectors.email_input, "login form never appeared");
		return Ok(StepStatus::SelectorMissing);
	}

	driver.type_into(&config.selectors.email_input, &config.email).await?;
	driver.type_into(&config.selectors.password_input, &config.password).await?;
	sleep(config.timing.login_settle).await;
	driver.press_key("Enter").await?;

	match driver.wait_for_navigation(config.timing.navigation).await {
		Ok(()) => info!(target = "chirp.task", "login submitted"),
		Err(err) => warn!(target = "chirp.task", error = %err, "no navigation after login; continuing"),
	}

	Ok(StepStatus::Completed)
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use super::*;
	use crate::browser::{DriverCall, FakeDriverBuilder};
	use crate::config::{Selectors, Timing};

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

	#[tokio::test]
	async fn fills_both_fields_then_submits() {
		let config = test_config();
		let (driver, controller) = FakeDriverBuilder::new().find_found().build();

		let status = login(&driver, &config).await.unwrap();

		assert_eq!(status, StepStatus::Completed);
		assert_eq!(
			controller.typed_into(),
			vec![
				(config.selectors.email_input.clone(), config.email.clone()),
				(config.selectors.password_input.clone(), config.password.clone()),
			]
		);
		assert_eq!(controller.keys_pressed(), vec!["Enter".to_string()]);
		assert_eq!(
			controller.calls().last(),
			Some(&DriverCall::WaitForNavigation),
			"submission must wait for the page to settle"
		);
	}

	#[tokio::test]
	async fn missing_form_stops_before_typing() {
		let config = test_config();
		let (driver, controller) = FakeDriverBuilder::new().find_missing(3).build();

		let status = login(&driver, &config).await.unwrap();

		assert_eq!(status, StepStatus::SelectorMissing);
		assert!(controller.typed_into().is_empty(), "no credentials on a dead page");
		assert!(controller.keys_pressed().is_empty());
	}

	#[tokio::test]
	async fn navigation_timeout_is_tolerated() {
		let config = test_config();
		let (driver, _controller) = FakeDriverBuilder::new().find_found().nav_times_out().build();

		let status = login(&driver, &config).await.unwrap();

		assert_eq!(status, StepStatus::Completed);
	}

	#[tokio::test]
	async fn input_failure_propagates() {
		let config = test_config();
		let (driver, _controller) = FakeDriverBuilder::new()
			.find_found()
			.fail_input("node detached")
			.build();

		let err = login(&driver, &config).await.unwrap_err();
		assert!(err.to_string().contains("node detached"));
	}
}
