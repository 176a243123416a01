//! Command dispatch: bridges CLI args -> core wrappers -> output formatting.

pub mod account;
pub mod bucket;
pub mod collection;
pub mod config_cmd;
pub mod document;
pub mod file;
pub mod util;

use livewrite_core::Facade;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, facade: &Facade, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Document(args) => document::handle(facade, args, global).await,
        Command::Collection(args) => collection::handle(facade, args, global).await,
        Command::Bucket(args) => bucket::handle(facade, args, global).await,
        Command::File(args) => file::handle(facade, args, global).await,
        Command::Account(args) => account::handle(facade, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
