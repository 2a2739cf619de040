//! Command-line adapter.
//!
//! Each invocation behaves like one visit to the web client: it navigates to
//! the page a command belongs to (so route guards apply), fills that page's
//! form from arguments and reports what the page would show.

mod app;
mod args;
mod error;

pub use app::{App, Outcome};
pub use args::{CattleCommand, Cli, Command, ComplaintCommand, InaphCommand, PasswordSource};
pub use error::CliError;
