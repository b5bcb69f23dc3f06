mod history;
mod settlement;
mod system;
mod units;

use crate::cli::core::CommandError;
use crate::cli::registry::CommandRegistry;

pub fn registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    for entry in units::definitions()
        .into_iter()
        .chain(settlement::definitions())
        .chain(history::definitions())
        .chain(system::definitions())
    {
        registry.register(entry);
    }
    registry
}

/// Fails with the command's usage line unless exactly `expected` arguments
/// were given.
pub(crate) fn expect_args(args: &[&str], expected: usize, usage: &str) -> Result<(), CommandError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(CommandError::InvalidArguments(format!("usage: {}", usage)))
    }
}

/// Parses a 1-based history position into a log index.
pub(crate) fn parse_position(raw: &str) -> Result<usize, CommandError> {
    match raw.trim().parse::<usize>() {
        Ok(position) if position >= 1 => Ok(position - 1),
        _ => Err(CommandError::InvalidArguments(format!(
            "`{}` is not a history number (use the numbers shown by `history`)",
            raw
        ))),
    }
}
