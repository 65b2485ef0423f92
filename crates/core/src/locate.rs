//! Bounded element discovery with reload-based recovery.

use tracing::{debug, warn};

use crate::browser::{PageDriver, WaitUntil};
use crate::config::Timing;

/// Waits for `selector`, reloading the page between attempts.
///
/// Makes at most `max_attempts` wait calls and `max_attempts - 1` reloads,
/// with a constant per-attempt ceiling and no backoff. Driver failures
/// during a wait or a reload count as a failed attempt instead of aborting
/// the search; the only terminal states are found and not-found.
pub async fn locate(driver: &dyn PageDriver, selector: &str, max_attempts: u32, timing: &Timing) -> bool {
	let max_attempts = max_attempts.max(1);
	for attempt in 1..=max_attempts {
		match driver.wait_for_selector(selector, timing.element_wait).await {
			Ok(true) => {
				debug!(target = "chirp.locate", selector, attempt, "selector present");
				return true;
			}
			Ok(false) => {
				warn!(target = "chirp.locate", selector, attempt, max_attempts, "selector not found");
			}
			Err(err) => {
				warn!(target = "chirp.locate", selector, attempt, max_attempts, error = %err, "wait failed");
			}
		}
		if attempt < max_attempts {
			if let Err(err) = driver.reload(WaitUntil::DomContentLoaded).await {
				warn!(target = "chirp.locate", error = %err, "reload failed");
			}
		}
	}
	false
}
