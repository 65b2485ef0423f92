//! Command-line front end for the chirp keepalive bot.

pub mod cli;
pub mod commands;
pub mod logging;
