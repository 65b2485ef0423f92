//! Core library for the chirp keepalive bot.
//!
//! Drives a Chromium session through login and a scripted channel message on
//! a cron cadence, with a liveness HTTP endpoint on the side. The browser
//! sits behind [`browser::PageDriver`], so the orchestration runs against a
//! scripted fake in tests.

pub mod browser;
pub mod config;
pub mod error;
pub mod locate;
pub mod schedule;
pub mod server;
pub mod session;
pub mod steps;
pub mod task;

pub use browser::{ChromeDriver, PageDriver, WaitUntil};
pub use config::{Config, Overrides, Selectors, Timing};
pub use error::{ChirpError, Result};
pub use schedule::Scheduler;
pub use session::{EphemeralSessionManager, Session, SessionManager};
pub use steps::StepStatus;
pub use task::{TaskOutcome, TaskRunner};
