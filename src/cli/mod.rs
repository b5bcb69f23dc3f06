//! Interactive and scripted shell over a [`SettlementSession`](crate::session::SettlementSession).

pub mod commands;
pub mod core;
pub mod help;
pub mod output;
pub mod registry;
mod shell;

pub use self::core::{CliError, CliMode, CommandError, ShellContext, SCRIPT_ENV};
pub use shell::run_cli;
