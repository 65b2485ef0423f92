//! Command-palette message dispatch.

use tokio::time::sleep;
use tracing::{info, warn};

use crate::browser::PageDriver;
use crate::config::Config;
use crate::error::Result;
use crate::locate::locate;
use crate::steps::StepStatus;

/// Keystroke that opens the app's command palette.
const PALETTE_KEY: &str = "/";
/// Palette token that selects the scripted message command.
const COMMAND_TOKEN: &str = "da";

/// Posts the scripted message through the command palette.
///
/// The channel list is the readiness signal. The key sequence is fixed:
/// `/` opens the palette, the token narrows it with a per-character delay,
/// the first Enter picks the highlighted entry and the second submits the
/// composed message.
pub async fn send_message(driver: &dyn PageDriver, config: &Config) -> Result<StepStatus> {
	if !locate(driver, &config.selectors.channel_list, config.max_attempts, &config.timing).await {
		warn!(target = "chirp.task", selector = %config.selectors.channel_list, "channel list never appeared");
		return Ok(StepStatus::SelectorMissing);
	}
	info!(target = "chirp.task", "channel ready, sending message");

	driver.press_key(PALETTE_KEY).await?;
	driver.type_chars(COMMAND_TOKEN, config.timing.type_delay).await?;
	sleep(config.timing.palette_settle).await;
	driver.press_key("Enter").await?;
	sleep(config.timing.palette_settle).await;
	driver.press_key("Enter").await?;

	info!(target = "chirp.task", "message sent");
	Ok(StepStatus::Completed)
}
