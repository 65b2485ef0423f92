//! Browser driver seam.
//!
//! Everything above this module drives the page through [`PageDriver`], so
//! the step scripts and the task runner run against a scripted fake in tests
//! while production uses the Chromium-backed driver.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

pub mod chrome;
pub mod fake;

pub use chrome::{ChromeDriver, LaunchOptions};
pub use fake::{DriverCall, FakeDriver, FakeDriverBuilder, FakeDriverController, FakeSessionManager};

/// How long a navigation waits before the page counts as ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
	/// DOM parsed; subresources may still be loading.
	DomContentLoaded,
	/// Load event fired.
	Load,
	/// Load event fired and the network stayed quiet for a short window.
	NetworkIdle,
}

/// Minimal page surface the step scripts need.
///
/// Errors are reserved for page and protocol failures; a missing element is
/// reported through the `bool` returns, never as an error.
#[async_trait]
pub trait PageDriver: Send + Sync {
	/// Navigates to `url` and waits according to `wait`.
	async fn goto(&self, url: &str, wait: WaitUntil) -> Result<()>;

	/// Waits up to `timeout` for `selector` to appear.
	async fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<bool>;

	/// Single immediate existence check, no waiting.
	async fn exists(&self, selector: &str) -> Result<bool>;

	/// Focuses `selector` and types `text` into it.
	async fn type_into(&self, selector: &str, text: &str) -> Result<()>;

	/// Sends one key press (down then up) to the focused element.
	async fn press_key(&self, key: &str) -> Result<()>;

	/// Types `text` one character at a time, pausing `delay` between keys.
	async fn type_chars(&self, text: &str, delay: Duration) -> Result<()>;

	/// Waits for the next navigation to finish, bounded by `timeout`.
	async fn wait_for_navigation(&self, timeout: Duration) -> Result<()>;

	/// Full page reload, waiting according to `wait`.
	async fn reload(&self, wait: WaitUntil) -> Result<()>;

	/// Tears the page and its browser down. Idempotent.
	async fn close(&self) -> Result<()>;
}
