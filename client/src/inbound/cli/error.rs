//! Errors that abort a command.
//!
//! Submission failures are not errors here: they are shown to the user and
//! reported through [`super::Outcome::Failed`].

use std::io;
use std::path::PathBuf;

use crate::domain::forms::InputError;
use crate::domain::routing::NavigationError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error("no password given: use --password-stdin or set LIFETAG_PASSWORD")]
    MissingPassword,
    #[error("failed to read password: {0}")]
    ReadPassword(#[source] io::Error),
    #[error("cannot read photo {}: {message}", path.display())]
    Photo { path: PathBuf, message: String },
}
