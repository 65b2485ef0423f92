//! Browser session lifecycle: acquire, probe, release.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::browser::chrome::{ChromeDriver, LaunchOptions};
use crate::browser::{PageDriver, WaitUntil};
use crate::config::Config;
use crate::error::Result;

/// One live browser session pointed at the target channel.
///
/// At most one session exists per run; the step scripts borrow its driver
/// and [`Session::release`] consumes it, so teardown cannot run twice.
pub struct Session {
	driver: Box<dyn PageDriver>,
	logged_in_marker: String,
}

impl Session {
	/// Wraps a driver that is already on the target page.
	pub fn new(driver: Box<dyn PageDriver>, logged_in_marker: impl Into<String>) -> Self {
		Self {
			driver,
			logged_in_marker: logged_in_marker.into(),
		}
	}

	/// Driver handle for the step scripts.
	pub fn driver(&self) -> &dyn PageDriver {
		self.driver.as_ref()
	}

	/// Checks for the post-login marker without waiting.
	///
	/// A probe failure reads as logged-out.
	pub async fn probe_authenticated(&self) -> bool {
		match self.driver.exists(&self.logged_in_marker).await {
			Ok(present) => present,
			Err(err) => {
				warn!(target = "chirp.session", error = %err, "auth probe failed; assuming logged out");
				false
			}
		}
	}

	/// Tears the session down, swallowing teardown failures.
	pub async fn release(self) {
		if let Err(err) = self.driver.close().await {
			warn!(target = "chirp.session", error = %err, "session teardown failed");
		}
		debug!(target = "chirp.session", "session released");
	}
}

/// Strategy seam for producing sessions.
#[async_trait]
pub trait SessionManager: Send + Sync {
	/// Establishes a fresh session on the target page.
	async fn acquire(&self) -> Result<Session>;
}

/// Launches a throwaway browser per run and navigates to the target URL.
pub struct EphemeralSessionManager {
	config: Config,
}

impl EphemeralSessionManager {
	pub fn new(config: Config) -> Self {
		Self { config }
	}
}

#[async_trait]
impl SessionManager for EphemeralSessionManager {
	async fn acquire(&self) -> Result<Session> {
		let timing = &self.config.timing;
		let options = LaunchOptions {
			headless: self.config.headless,
			navigation_timeout: timing.navigation,
			network_quiet: timing.network_quiet,
			poll_interval: timing.poll_interval,
		};

		info!(target = "chirp.session", headless = self.config.headless, "launching browser");
		let driver = ChromeDriver::launch(options).await?;

		if let Err(err) = driver.goto(&self.config.url, WaitUntil::NetworkIdle).await {
			// The browser is already up; reap it before surfacing the error.
			let _ = driver.close().await;
			return Err(err);
		}
		info!(target = "chirp.session", url = %self.config.url, "page ready");

		Ok(Session::new(
			Box::new(driver),
			self.config.selectors.logged_in_marker.clone(),
		))
	}
}
