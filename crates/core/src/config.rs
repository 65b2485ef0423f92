//! Runtime configuration resolved once at startup.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde_json::{Value, json};

use crate::error::{ChirpError, Result};

/// Default liveness port.
pub const DEFAULT_PORT: u16 = 4567;
/// Default cadence: every two minutes.
pub const DEFAULT_SCHEDULE: &str = "*/2 * * * *";
/// Default selector retry ceiling.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// CSS selectors for the chat application's login and channel UI.
///
/// These track the target app's markup and break when it changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selectors {
	pub email_input: String,
	pub password_input: String,
	pub channel_list: String,
	pub logged_in_marker: String,
}

impl Default for Selectors {
	fn default() -> Self {
		Self {
			email_input: "input[name=\"email\"]".to_string(),
			password_input: "input[name=\"password\"]".to_string(),
			channel_list: "ul[aria-label=\"Channels\"]".to_string(),
			logged_in_marker: "div[aria-label=\"User area\"]".to_string(),
		}
	}
}

/// Delay and timeout table for browser interaction.
///
/// The values are coupled to the target app's client-side latency;
/// tightening them makes selector discovery flaky.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
	/// Per-attempt ceiling for selector discovery.
	pub element_wait: Duration,
	/// Ceiling for any navigation, including the post-login settle.
	pub navigation: Duration,
	/// Pause between filling credentials and submitting them.
	pub login_settle: Duration,
	/// Pause after the palette opens and between the two Enter presses.
	pub palette_settle: Duration,
	/// Delay between characters when typing the palette token.
	pub type_delay: Duration,
	/// Quiet window used to approximate network idle after load.
	pub network_quiet: Duration,
	/// Poll interval while waiting for a selector.
	pub poll_interval: Duration,
}

impl Default for Timing {
	fn default() -> Self {
		Self {
			element_wait: Duration::from_secs(10),
			navigation: Duration::from_secs(90),
			login_settle: Duration::from_millis(500),
			palette_settle: Duration::from_millis(1000),
			type_delay: Duration::from_millis(100),
			network_quiet: Duration::from_millis(500),
			poll_interval: Duration::from_millis(250),
		}
	}
}

/// Flag-level overrides applied on top of the environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
	pub url: Option<String>,
	pub port: Option<u16>,
	pub schedule: Option<String>,
	pub max_attempts: Option<u32>,
	pub headful: bool,
}

/// Immutable settings for one process lifetime.
#[derive(Clone)]
pub struct Config {
	/// Target channel URL.
	pub url: String,
	/// Login email.
	pub email: String,
	/// Login secret. Redacted from all rendered output.
	pub password: String,
	/// Liveness listen port.
	pub port: u16,
	/// Cron expression for the task cadence.
	pub schedule: String,
	/// Locator retry ceiling, at least 1.
	pub max_attempts: u32,
	/// Headless browser launch.
	pub headless: bool,
	pub selectors: Selectors,
	pub timing: Timing,
}

impl Config {
	/// Resolves configuration from the process environment plus overrides.
	///
	/// Fails fast on missing credentials, a missing target URL, or values
	/// that do not parse.
	pub fn from_env(overrides: &Overrides) -> Result<Self> {
		Self::resolve(|key| std::env::var(key).ok(), overrides)
	}

	fn resolve<F>(lookup: F, overrides: &Overrides) -> Result<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let email = require(&lookup, "EMAIL")?;
		let password = require(&lookup, "PASSWORD")?;
		let url = overrides
			.url
			.clone()
			.or_else(|| lookup("CHIRP_URL").filter(|v| !v.trim().is_empty()))
			.ok_or_else(|| ChirpError::Config("CHIRP_URL is not set and --url was not given".to_string()))?;

		let port = match overrides.port {
			Some(port) => port,
			None => parse_or(&lookup, "PORT", DEFAULT_PORT)?,
		};
		let schedule = overrides
			.schedule
			.clone()
			.or_else(|| lookup("CHIRP_SCHEDULE").filter(|v| !v.trim().is_empty()))
			.unwrap_or_else(|| DEFAULT_SCHEDULE.to_string());
		let max_attempts = match overrides.max_attempts {
			Some(n) => n,
			None => parse_or(&lookup, "CHIRP_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?,
		};
		if max_attempts == 0 {
			return Err(ChirpError::Config("CHIRP_MAX_ATTEMPTS must be at least 1".to_string()));
		}
		let headless = if overrides.headful {
			false
		} else {
			parse_or(&lookup, "CHIRP_HEADLESS", true)?
		};

		Ok(Self {
			url,
			email,
			password,
			port,
			schedule,
			max_attempts,
			headless,
			selectors: Selectors::default(),
			timing: Timing::default(),
		})
	}

	/// Structured render of the resolved settings with the secret masked.
	pub fn report(&self) -> Value {
		json!({
			"url": self.url,
			"email": self.email,
			"password": "<redacted>",
			"port": self.port,
			"schedule": self.schedule,
			"max_attempts": self.max_attempts,
			"headless": self.headless,
		})
	}
}

impl fmt::Debug for Config {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Config")
			.field("url", &self.url)
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.field("port", &self.port)
			.field("schedule", &self.schedule)
			.field("max_attempts", &self.max_attempts)
			.field("headless", &self.headless)
			.finish_non_exhaustive()
	}
}

fn require<F>(lookup: &F, key: &str) -> Result<String>
where
	F: Fn(&str) -> Option<String>,
{
	match lookup(key) {
		Some(value) if !value.trim().is_empty() => Ok(value),
		_ => Err(ChirpError::Config(format!("{key} is not set"))),
	}
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
	F: Fn(&str) -> Option<String>,
	T: FromStr,
{
	match lookup(key) {
		Some(raw) => raw
			.trim()
			.parse::<T>()
			.map_err(|_| ChirpError::Config(format!("{key} has invalid value {raw:?}"))),
		None => Ok(default),
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use super::*;

	fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
		pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
	}

	fn resolve(vars: &HashMap<String, String>, overrides: &Overrides) -> Result<Config> {
		Config::resolve(|key| vars.get(key).cloned(), overrides)
	}

	fn full_env() -> HashMap<String, String> {
		env(&[
			("EMAIL", "bot@example.com"),
			("PASSWORD", "hunter2"),
			("CHIRP_URL", "https://chat.example.com/channels/general"),
		])
	}

	#[test]
	fn missing_email_is_a_config_error() {
		let vars = env(&[("PASSWORD", "hunter2"), ("CHIRP_URL", "https://chat.example.com")]);
		let err = resolve(&vars, &Overrides::default()).unwrap_err();
		assert!(matches!(err, ChirpError::Config(_)), "got {err:?}");
		assert!(err.to_string().contains("EMAIL"));
	}

	#[test]
	fn missing_url_is_a_config_error() {
		let vars = env(&[("EMAIL", "bot@example.com"), ("PASSWORD", "hunter2")]);
		let err = resolve(&vars, &Overrides::default()).unwrap_err();
		assert!(err.to_string().contains("CHIRP_URL"));
	}

	#[test]
	fn blank_password_is_rejected() {
		let mut vars = full_env();
		vars.insert("PASSWORD".to_string(), "  ".to_string());
		let err = resolve(&vars, &Overrides::default()).unwrap_err();
		assert!(err.to_string().contains("PASSWORD"));
	}

	#[test]
	fn defaults_apply_when_env_is_minimal() {
		let config = resolve(&full_env(), &Overrides::default()).unwrap();
		assert_eq!(config.port, DEFAULT_PORT);
		assert_eq!(config.schedule, DEFAULT_SCHEDULE);
		assert_eq!(config.max_attempts, DEFAULT_MAX_ATTEMPTS);
		assert!(config.headless);
	}

	#[test]
	fn env_values_override_defaults() {
		let mut vars = full_env();
		vars.insert("PORT".to_string(), "8080".to_string());
		vars.insert("CHIRP_SCHEDULE".to_string(), "*/5 * * * *".to_string());
		vars.insert("CHIRP_MAX_ATTEMPTS".to_string(), "5".to_string());
		vars.insert("CHIRP_HEADLESS".to_string(), "false".to_string());
		let config = resolve(&vars, &Overrides::default()).unwrap();
		assert_eq!(config.port, 8080);
		assert_eq!(config.schedule, "*/5 * * * *");
		assert_eq!(config.max_attempts, 5);
		assert!(!config.headless);
	}

	#[test]
	fn overrides_beat_env() {
		let mut vars = full_env();
		vars.insert("PORT".to_string(), "8080".to_string());
		let overrides = Overrides {
			url: Some("https://other.example.com".to_string()),
			port: Some(9000),
			schedule: Some("*/10 * * * *".to_string()),
			max_attempts: Some(2),
			headful: true,
		};
		let config = resolve(&vars, &overrides).unwrap();
		assert_eq!(config.url, "https://other.example.com");
		assert_eq!(config.port, 9000);
		assert_eq!(config.schedule, "*/10 * * * *");
		assert_eq!(config.max_attempts, 2);
		assert!(!config.headless, "--headful must force a visible browser");
	}

	#[test]
	fn invalid_port_is_rejected() {
		let mut vars = full_env();
		vars.insert("PORT".to_string(), "not-a-port".to_string());
		let err = resolve(&vars, &Overrides::default()).unwrap_err();
		assert!(err.to_string().contains("PORT"));
	}

	#[test]
	fn zero_attempts_is_rejected() {
		let mut vars = full_env();
		vars.insert("CHIRP_MAX_ATTEMPTS".to_string(), "0".to_string());
		let err = resolve(&vars, &Overrides::default()).unwrap_err();
		assert!(err.to_string().contains("at least 1"));
	}

	#[test]
	fn debug_and_report_redact_the_secret() {
		let config = resolve(&full_env(), &Overrides::default()).unwrap();
		let debug = format!("{config:?}");
		assert!(!debug.contains("hunter2"), "secret leaked: {debug}");
		assert!(debug.contains("<redacted>"));
		let report = config.report().to_string();
		assert!(!report.contains("hunter2"), "secret leaked: {report}");
	}

	#[test]
	fn default_selectors_match_the_chat_ui() {
		let selectors = Selectors::default();
		assert_eq!(selectors.email_input, "input[name=\"email\"]");
		assert_eq!(selectors.password_input, "input[name=\"password\"]");
		assert_eq!(selectors.channel_list, "ul[aria-label=\"Channels\"]");
		assert_eq!(selectors.logged_in_marker, "div[aria-label=\"User area\"]");
	}
}
