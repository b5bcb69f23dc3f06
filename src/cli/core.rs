use std::io;
use std::path::PathBuf;

use dialoguer::{theme::ColorfulTheme, Confirm};
use rustyline::error::ReadlineError;
use strsim::levenshtein;
use thiserror::Error;

use crate::cli::commands;
use crate::cli::output::{self, OutputPreferences};
use crate::cli::registry::CommandRegistry;
use crate::config::ConfigManager;
use crate::errors::SettlementError;
use crate::session::SettlementSession;
use crate::storage::json_backend::JsonFileStore;

/// Environment variable that switches the shell into non-interactive mode.
pub const SCRIPT_ENV: &str = "VILLA_SPLIT_CLI_SCRIPT";

const SUGGESTION_DISTANCE: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Settlement(#[from] SettlementError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

pub type CommandResult = Result<(), CommandError>;

/// Errors that end the shell itself.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Settlement(#[from] SettlementError),
    #[error(transparent)]
    Readline(#[from] ReadlineError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("Command failed: {0}")]
    Command(String),
}

impl From<CommandError> for CliError {
    fn from(err: CommandError) -> Self {
        CliError::Command(err.to_string())
    }
}

pub struct ShellContext {
    pub mode: CliMode,
    pub session: SettlementSession,
    pub registry: CommandRegistry,
    pub config_path: Option<PathBuf>,
    pub running: bool,
    theme: ColorfulTheme,
}

impl ShellContext {
    /// Opens the session from the default data directory.
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let config_manager = ConfigManager::new_default()?;
        let config = config_manager.load()?;
        let store = JsonFileStore::new_default()?;
        let session = SettlementSession::open(Box::new(store), config)?;
        let mut context = Self::with_session(mode, session);
        context.config_path = Some(config_manager.path().to_path_buf());
        Ok(context)
    }

    pub fn with_session(mode: CliMode, session: SettlementSession) -> Self {
        output::set_preferences(OutputPreferences {
            plain_mode: mode == CliMode::Script,
        });
        if mode == CliMode::Script {
            colored::control::set_override(false);
        }
        Self {
            mode,
            session,
            registry: commands::registry(),
            config_path: None,
            running: true,
            theme: ColorfulTheme::default(),
        }
    }

    pub fn prompt(&self) -> String {
        format!("villa-split [{} units]> ", self.session.roster().len())
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(handler) = self.registry.handler(command) {
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn closest_command(&self, input: &str) -> Option<&'static str> {
        let needle = input.to_lowercase();
        self.registry
            .names()
            .map(|name| (levenshtein(name, &needle), name))
            .filter(|(distance, _)| *distance <= SUGGESTION_DISTANCE)
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, name)| name)
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));
        if let Some(best) = self.closest_command(input) {
            output::info(format!("Suggestion: `{}`?", best));
        }
    }

    /// Asks before destructive actions; script mode always proceeds.
    pub(crate) fn confirm(&self, prompt: &str) -> Result<bool, CommandError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(CommandError::from)
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        self.confirm("Exit shell?").map_err(CliError::from)
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::info("Use `help <command>` for usage details.");
                Ok(())
            }
            other => {
                output::error(other);
                Ok(())
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = crate::cli::shell::parse_command_line(line)
            .map_err(|err| CommandError::InvalidArguments(err.to_string()))?;
        let Some(first) = tokens.first() else {
            return Ok(LoopControl::Continue);
        };
        let command = first.to_lowercase();
        let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();
        self.dispatch(&command, first, &args)
    }
}
