//! Step scripts executed against a live session.

pub mod login;
pub mod message;

pub use login::login;
pub use message::send_message;

/// Outcome of a step that ran without a driver error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
	/// Every interaction in the script ran.
	Completed,
	/// A required element never appeared; the step stopped early.
	SelectorMissing,
}
