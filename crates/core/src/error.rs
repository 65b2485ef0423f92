//! Error types shared across the crate.

use thiserror::Error;

/// Alias used by every fallible operation in this crate.
pub type Result<T> = std::result::Result<T, ChirpError>;

/// Errors produced while driving the browser or running scheduled tasks.
///
/// There is no element-not-found variant; the locator and the step scripts
/// report a missing selector as an expected state, not an error.
#[derive(Debug, Error)]
pub enum ChirpError {
	#[error("browser launch failed: {0}")]
	BrowserLaunch(String),

	#[error("navigation to {url} failed: {source}")]
	Navigation {
		url: String,
		#[source]
		source: anyhow::Error,
	},

	#[error("timed out after {ms}ms waiting for {what}")]
	Timeout { ms: u64, what: String },

	#[error("browser driver error: {0}")]
	Driver(String),

	#[error("invalid configuration: {0}")]
	Config(String),

	#[error("invalid schedule expression: {0}")]
	Schedule(String),

	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
}
