//! Chromium-backed [`PageDriver`] over CDP.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig, HeadlessMode};
use chromiumoxide::cdp::browser_protocol::input::{DispatchKeyEventParams, DispatchKeyEventType};
use chromiumoxide::error::CdpError;
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::browser::{PageDriver, WaitUntil};
use crate::error::{ChirpError, Result};

/// Chromium flags for running inside minimal containers.
const LAUNCH_ARGS: &[&str] = &[
	"--disable-setuid-sandbox",
	"--single-process",
	"--no-zygote",
	"--disable-blink-features=AutomationControlled",
];

/// Launch-time options for [`ChromeDriver`].
#[derive(Debug, Clone)]
pub struct LaunchOptions {
	pub headless: bool,
	/// Ceiling for navigations and reloads.
	pub navigation_timeout: Duration,
	/// Quiet window appended after load to approximate network idle.
	pub network_quiet: Duration,
	/// Poll interval for selector waits.
	pub poll_interval: Duration,
}

impl Default for LaunchOptions {
	fn default() -> Self {
		Self {
			headless: true,
			navigation_timeout: Duration::from_secs(90),
			network_quiet: Duration::from_millis(500),
			poll_interval: Duration::from_millis(250),
		}
	}
}

/// One Chromium process with a single page.
///
/// The CDP event handler runs on its own task for the lifetime of the
/// browser; [`ChromeDriver::close`] reaps both.
pub struct ChromeDriver {
	browser: Mutex<Option<Browser>>,
	page: Page,
	handler_task: Mutex<Option<JoinHandle<()>>>,
	options: LaunchOptions,
}

impl ChromeDriver {
	/// Launches a fresh Chromium and opens a blank page.
	pub async fn launch(options: LaunchOptions) -> Result<Self> {
		let mode = if options.headless { HeadlessMode::New } else { HeadlessMode::False };
		let mut builder = BrowserConfig::builder().headless_mode(mode).no_sandbox();
		for arg in LAUNCH_ARGS {
			builder = builder.arg(*arg);
		}
		let config = builder.build().map_err(ChirpError::BrowserLaunch)?;

		debug!(target = "chirp.browser", headless = options.headless, "launching chromium");
		let (browser, mut handler) = Browser::launch(config)
			.await
			.map_err(|err| ChirpError::BrowserLaunch(err.to_string()))?;

		let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

		let page = match browser.new_page("about:blank").await {
			Ok(page) => page,
			Err(err) => {
				handler_task.abort();
				return Err(ChirpError::BrowserLaunch(format!("failed to open page: {err}")));
			}
		};

		Ok(Self {
			browser: Mutex::new(Some(browser)),
			page,
			handler_task: Mutex::new(Some(handler_task)),
			options,
		})
	}

	/// Post-navigation settle for the requested readiness level.
	///
	/// CDP has no first-class network-idle signal here, so idle is
	/// approximated by a quiet window after the load settles.
	async fn settle(&self, wait: WaitUntil) -> Result<()> {
		self.wait_for_navigation(self.options.navigation_timeout).await?;
		if wait == WaitUntil::NetworkIdle {
			tokio::time::sleep(self.options.network_quiet).await;
		}
		Ok(())
	}
}

fn driver_err(err: CdpError) -> ChirpError {
	ChirpError::Driver(err.to_string())
}

/// Text payload carried by a key event, mirroring what a real keystroke
/// would insert.
fn key_text(key: &str) -> Option<&str> {
	match key {
		"Enter" => Some("\r"),
		key if key.chars().count() == 1 => Some(key),
		_ => None,
	}
}

#[async_trait]
impl PageDriver for ChromeDriver {
	async fn goto(&self, url: &str, wait: WaitUntil) -> Result<()> {
		debug!(target = "chirp.browser", %url, "navigating");
		match tokio::time::timeout(self.options.navigation_timeout, self.page.goto(url)).await {
			Ok(Ok(_)) => self.settle(wait).await,
			Ok(Err(err)) => Err(ChirpError::Navigation {
				url: url.to_string(),
				source: err.into(),
			}),
			Err(_) => Err(ChirpError::Timeout {
				ms: self.options.navigation_timeout.as_millis() as u64,
				what: format!("navigation to {url}"),
			}),
		}
	}

	async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<bool> {
		// CDP reports a missing node as an error, so any failure counts as
		// absent until the deadline passes.
		let deadline = tokio::time::Instant::now() + timeout;
		loop {
			if self.page.find_element(selector).await.is_ok() {
				return Ok(true);
			}
			if tokio::time::Instant::now() >= deadline {
				return Ok(false);
			}
			tokio::time::sleep(self.options.poll_interval).await;
		}
	}

	async fn exists(&self, selector: &str) -> Result<bool> {
		Ok(self.page.find_element(selector).await.is_ok())
	}

	async fn type_into(&self, selector: &str, text: &str) -> Result<()> {
		let element = self
			.page
			.find_element(selector)
			.await
			.map_err(|err| ChirpError::Driver(format!("{selector}: {err}")))?;
		element.focus().await.map_err(driver_err)?;
		element.type_str(text).await.map_err(driver_err)?;
		Ok(())
	}

	async fn press_key(&self, key: &str) -> Result<()> {
		let mut down = DispatchKeyEventParams::builder()
			.r#type(DispatchKeyEventType::KeyDown)
			.key(key);
		if let Some(text) = key_text(key) {
			down = down.text(text);
		}
		let down = down.build().map_err(ChirpError::Driver)?;
		self.page.execute(down).await.map_err(driver_err)?;

		let up = DispatchKeyEventParams::builder()
			.r#type(DispatchKeyEventType::KeyUp)
			.key(key)
			.build()
			.map_err(ChirpError::Driver)?;
		self.page.execute(up).await.map_err(driver_err)?;
		Ok(())
	}

	async fn type_chars(&self, text: &str, delay: Duration) -> Result<()> {
		for ch in text.chars() {
			let ch = ch.to_string();
			let params = DispatchKeyEventParams::builder()
				.r#type(DispatchKeyEventType::Char)
				.key(ch.clone())
				.text(ch)
				.build()
				.map_err(ChirpError::Driver)?;
			self.page.execute(params).await.map_err(driver_err)?;
			tokio::time::sleep(delay).await;
		}
		Ok(())
	}

	async fn wait_for_navigation(&self, timeout: Duration) -> Result<()> {
		match tokio::time::timeout(timeout, self.page.wait_for_navigation()).await {
			Ok(Ok(_)) => Ok(()),
			Ok(Err(err)) => Err(driver_err(err)),
			Err(_) => Err(ChirpError::Timeout {
				ms: timeout.as_millis() as u64,
				what: "navigation".to_string(),
			}),
		}
	}

	async fn reload(&self, wait: WaitUntil) -> Result<()> {
		debug!(target = "chirp.browser", "reloading page");
		match tokio::time::timeout(self.options.navigation_timeout, self.page.reload()).await {
			Ok(Ok(_)) => {
				if wait == WaitUntil::NetworkIdle {
					tokio::time::sleep(self.options.network_quiet).await;
				}
				Ok(())
			}
			Ok(Err(err)) => Err(driver_err(err)),
			Err(_) => Err(ChirpError::Timeout {
				ms: self.options.navigation_timeout.as_millis() as u64,
				what: "page reload".to_string(),
			}),
		}
	}

	async fn close(&self) -> Result<()> {
		let mut guard = self.browser.lock().await;
		let Some(mut browser) = guard.take() else {
			return Ok(());
		};
		if let Err(err) = browser.close().await {
			warn!(target = "chirp.browser", error = %err, "browser close returned error");
		}
		if let Err(err) = browser.wait().await {
			warn!(target = "chirp.browser", error = %err, "browser did not exit cleanly");
		}
		if let Some(task) = self.handler_task.lock().await.take() {
			task.abort();
		}
		Ok(())
	}
}
