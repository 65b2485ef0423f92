//! Cron-driven task cadence.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use cron::Schedule;
use tracing::{debug, info, warn};

use crate::error::{ChirpError, Result};
use crate::task::TaskRunner;

/// Parsed cron cadence.
///
/// Standard five-field expressions are accepted and normalized to the
/// seconds-first form; six- and seven-field expressions pass through.
#[derive(Debug)]
pub struct Scheduler {
	schedule: Schedule,
	expression: String,
}

impl Scheduler {
	/// Parses `expression`, rejecting anything that is not a valid cron
	/// schedule.
	pub fn parse(expression: &str) -> Result<Self> {
		let normalized = normalize_expression(expression);
		let schedule = Schedule::from_str(&normalized)
			.map_err(|err| ChirpError::Schedule(format!("{expression:?}: {err}")))?;
		Ok(Self {
			schedule,
			expression: expression.trim().to_string(),
		})
	}

	/// The expression as configured.
	pub fn expression(&self) -> &str {
		&self.expression
	}

	/// Next fire time strictly after now.
	pub fn next_after_now(&self) -> Option<DateTime<Utc>> {
		self.schedule.upcoming(Utc).next()
	}

	/// Fires runner ticks on the cadence.
	///
	/// Each firing spawns the tick so the timer keeps cadence regardless of
	/// how long a run takes; overlap protection lives in the runner.
	pub async fn run(&self, runner: Arc<TaskRunner>) {
		info!(target = "chirp", schedule = %self.expression, "scheduler started");
		loop {
			let Some(next) = self.next_after_now() else {
				warn!(target = "chirp", "schedule has no upcoming firings; scheduler stopping");
				return;
			};
			let wait = (next - Utc::now()).to_std().unwrap_or_default();
			debug!(target = "chirp", next = %next, wait_secs = wait.as_secs(), "sleeping until next run");
			tokio::time::sleep(wait).await;

			let runner = runner.clone();
			tokio::spawn(async move {
				runner.tick().await;
			});
		}
	}
}

/// Prepends a seconds field to five-field expressions so both the classic
/// crontab form and the seconds-first form are accepted.
fn normalize_expression(expression: &str) -> String {
	let trimmed = expression.trim();
	if trimmed.split_whitespace().count() == 5 {
		format!("0 {trimmed}")
	} else {
		trimmed.to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn five_field_expressions_gain_a_seconds_field() {
		assert_eq!(normalize_expression("*/2 * * * *"), "0 */2 * * * *");
		assert_eq!(normalize_expression("  0 4 * * 1  "), "0 0 4 * * 1");
	}

	#[test]
	fn six_field_expressions_pass_through() {
		assert_eq!(normalize_expression("30 */2 * * * *"), "30 */2 * * * *");
	}

	#[test]
	fn default_schedule_parses() {
		let scheduler = Scheduler::parse(crate::config::DEFAULT_SCHEDULE).unwrap();
		assert_eq!(scheduler.expression(), "*/2 * * * *");
		assert!(scheduler.next_after_now().is_some());
	}

	#[test]
	fn every_two_minutes_means_120_second_gaps() {
		let scheduler = Scheduler::parse("*/2 * * * *").unwrap();
		let mut upcoming = scheduler.schedule.upcoming(Utc);
		let first = upcoming.next().unwrap();
		let second = upcoming.next().unwrap();
		assert_eq!((second - first).num_seconds(), 120);
	}

	#[test]
	fn garbage_is_rejected() {
		let err = Scheduler::parse("every other tuesday").unwrap_err();
		assert!(matches!(err, ChirpError::Schedule(_)), "got {err:?}");
	}

	#[test]
	fn empty_expression_is_rejected() {
		assert!(Scheduler::parse("").is_err());
	}
}
