//! Scripted [`PageDriver`] for exercising steps and the task runner without
//! a browser.
//!
//! [`FakeDriverBuilder`] queues per-call outcomes and yields the driver
//! together with a [`FakeDriverController`] that records every call for
//! inspection.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::browser::{PageDriver, WaitUntil};
use crate::error::{ChirpError, Result};
use crate::session::{Session, SessionManager};

/// One recorded driver call, in invocation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
	Goto(String),
	WaitForSelector(String),
	Exists(String),
	TypeInto { selector: String, text: String },
	PressKey(String),
	TypeChars(String),
	WaitForNavigation,
	Reload,
	Close,
}

/// Scripted outcome for one `wait_for_selector` call.
#[derive(Debug, Clone)]
enum FindOutcome {
	Found,
	Missing,
	Fail(String),
}

#[derive(Default)]
struct State {
	calls: Vec<DriverCall>,
	finds: VecDeque<FindOutcome>,
	exists: VecDeque<bool>,
	fail_goto: Option<String>,
	fail_reload: Option<String>,
	fail_input: Option<String>,
	nav_times_out: bool,
	close_count: usize,
}

/// Builder for a [`FakeDriver`] with scripted responses.
#[derive(Default)]
pub struct FakeDriverBuilder {
	state: State,
}

impl FakeDriverBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Queues a successful `wait_for_selector` outcome.
	pub fn find_found(mut self) -> Self {
		self.state.finds.push_back(FindOutcome::Found);
		self
	}

	/// Queues `n` expired `wait_for_selector` outcomes.
	pub fn find_missing(mut self, n: usize) -> Self {
		for _ in 0..n {
			self.state.finds.push_back(FindOutcome::Missing);
		}
		self
	}

	/// Queues a `wait_for_selector` call that fails with a driver error.
	pub fn find_fail(mut self, message: &str) -> Self {
		self.state.finds.push_back(FindOutcome::Fail(message.to_string()));
		self
	}

	/// Queues the outcome of the next `exists` probe.
	pub fn exists(mut self, present: bool) -> Self {
		self.state.exists.push_back(present);
		self
	}

	/// Makes the next `goto` fail.
	pub fn fail_goto(mut self, message: &str) -> Self {
		self.state.fail_goto = Some(message.to_string());
		self
	}

	/// Makes the next `reload` fail.
	pub fn fail_reload(mut self, message: &str) -> Self {
		self.state.fail_reload = Some(message.to_string());
		self
	}

	/// Makes the next input operation (type or key press) fail.
	pub fn fail_input(mut self, message: &str) -> Self {
		self.state.fail_input = Some(message.to_string());
		self
	}

	/// Makes the next `wait_for_navigation` expire.
	pub fn nav_times_out(mut self) -> Self {
		self.state.nav_times_out = true;
		self
	}

	pub fn build(self) -> (FakeDriver, FakeDriverController) {
		let state = Arc::new(Mutex::new(self.state));
		(
			FakeDriver { state: state.clone() },
			FakeDriverController { state },
		)
	}
}

/// Test driver that replays scripted outcomes and records every call.
///
/// Unscripted `wait_for_selector` calls report the selector as missing and
/// unscripted `exists` probes report absence, so an exhausted script fails
/// safe instead of panicking.
pub struct FakeDriver {
	state: Arc<Mutex<State>>,
}

/// Inspection handle over a [`FakeDriver`]'s recorded activity.
pub struct FakeDriverController {
	state: Arc<Mutex<State>>,
}

impl FakeDriverController {
	/// Every driver call so far, in order.
	pub fn calls(&self) -> Vec<DriverCall> {
		self.state.lock().calls.clone()
	}

	pub fn close_count(&self) -> usize {
		self.state.lock().close_count
	}

	pub fn find_count(&self) -> usize {
		self.count(|call| matches!(call, DriverCall::WaitForSelector(_)))
	}

	pub fn reload_count(&self) -> usize {
		self.count(|call| matches!(call, DriverCall::Reload))
	}

	pub fn typed_into(&self) -> Vec<(String, String)> {
		self.state
			.lock()
			.calls
			.iter()
			.filter_map(|call| match call {
				DriverCall::TypeInto { selector, text } => Some((selector.clone(), text.clone())),
				_ => None,
			})
			.collect()
	}

	pub fn keys_pressed(&self) -> Vec<String> {
		self.state
			.lock()
			.calls
			.iter()
			.filter_map(|call| match call {
				DriverCall::PressKey(key) => Some(key.clone()),
				_ => None,
			})
			.collect()
	}

	fn count(&self, pred: impl Fn(&DriverCall) -> bool) -> usize {
		self.state.lock().calls.iter().filter(|call| pred(call)).count()
	}
}

#[async_trait]
impl PageDriver for FakeDriver {
	async fn goto(&self, url: &str, _wait: WaitUntil) -> Result<()> {
		let mut state = self.state.lock();
		state.calls.push(DriverCall::Goto(url.to_string()));
		match state.fail_goto.take() {
			Some(message) => Err(ChirpError::Navigation {
				url: url.to_string(),
				source: anyhow::anyhow!(message),
			}),
			None => Ok(()),
		}
	}

	async fn wait_for_selector(&self, selector: &str, _timeout: Duration) -> Result<bool> {
		let mut state = self.state.lock();
		state.calls.push(DriverCall::WaitForSelector(selector.to_string()));
		match state.finds.pop_front() {
			Some(FindOutcome::Found) => Ok(true),
			Some(FindOutcome::Missing) | None => Ok(false),
			Some(FindOutcome::Fail(message)) => Err(ChirpError::Driver(message)),
		}
	}

	async fn exists(&self, selector: &str) -> Result<bool> {
		let mut state = self.state.lock();
		state.calls.push(DriverCall::Exists(selector.to_string()));
		Ok(state.exists.pop_front().unwrap_or(false))
	}

	async fn type_into(&self, selector: &str, text: &str) -> Result<()> {
		let mut state = self.state.lock();
		state.calls.push(DriverCall::TypeInto {
			selector: selector.to_string(),
			text: text.to_string(),
		});
		match state.fail_input.take() {
			Some(message) => Err(ChirpError::Driver(message)),
			None => Ok(()),
		}
	}

	async fn press_key(&self, key: &str) -> Result<()> {
		let mut state = self.state.lock();
		state.calls.push(DriverCall::PressKey(key.to_string()));
		match state.fail_input.take() {
			Some(message) => Err(ChirpError::Driver(message)),
			None => Ok(()),
		}
	}

	async fn type_chars(&self, text: &str, _delay: Duration) -> Result<()> {
		let mut state = self.state.lock();
		state.calls.push(DriverCall::TypeChars(text.to_string()));
		match state.fail_input.take() {
			Some(message) => Err(ChirpError::Driver(message)),
			None => Ok(()),
		}
	}

	async fn wait_for_navigation(&self, timeout: Duration) -> Result<()> {
		let mut state = self.state.lock();
		state.calls.push(DriverCall::WaitForNavigation);
		if std::mem::take(&mut state.nav_times_out) {
			return Err(ChirpError::Timeout {
				ms: timeout.as_millis() as u64,
				what: "navigation".to_string(),
			});
		}
		Ok(())
	}

	async fn reload(&self, _wait: WaitUntil) -> Result<()> {
		let mut state = self.state.lock();
		state.calls.push(DriverCall::Reload);
		match state.fail_reload.take() {
			Some(message) => Err(ChirpError::Driver(message)),
			None => Ok(()),
		}
	}

	async fn close(&self) -> Result<()> {
		let mut state = self.state.lock();
		state.calls.push(DriverCall::Close);
		state.close_count += 1;
		Ok(())
	}
}

/// [`SessionManager`] that hands out scripted drivers in order.
///
/// Once the queue is empty, `acquire` fails the way a broken launch would.
pub struct FakeSessionManager {
	drivers: Mutex<VecDeque<FakeDriver>>,
	marker: String,
}

impl FakeSessionManager {
	pub fn new(marker: impl Into<String>) -> Self {
		Self {
			drivers: Mutex::new(VecDeque::new()),
			marker: marker.into(),
		}
	}

	/// Queues a driver for the next `acquire`.
	pub fn push(&self, driver: FakeDriver) {
		self.drivers.lock().push_back(driver);
	}
}

#[async_trait]
impl SessionManager for FakeSessionManager {
	async fn acquire(&self) -> Result<Session> {
		match self.drivers.lock().pop_front() {
			Some(driver) => Ok(Session::new(Box::new(driver), self.marker.clone())),
			None => Err(ChirpError::BrowserLaunch("no scripted session available".to_string())),
		}
	}
}
