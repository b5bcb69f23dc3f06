use crate::cli::commands::expect_args;
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandEntry;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new("units", "List the housing units", "units", cmd_units),
        CommandEntry::new(
            "add-unit",
            "Add a housing unit to the roster",
            "add-unit <name>",
            cmd_add_unit,
        ),
        CommandEntry::new(
            "remove-unit",
            "Remove a housing unit and its readings",
            "remove-unit <name>",
            cmd_remove_unit,
        ),
    ]
}

fn cmd_units(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    expect_args(args, 0, "units")?;
    let roster = context.session.roster();
    output::section(format!("Units ({})", roster.len()));
    if roster.is_empty() {
        output::info("No units configured. Use `add-unit <name>` to add one.");
    } else {
        output::block(roster.display_list());
    }
    Ok(())
}

/// Names containing spaces must be quoted so they arrive as one argument.
fn unit_name(args: &[&str], usage: &str) -> Result<String, CommandError> {
    match args {
        [name] if !name.trim().is_empty() => Ok(name.to_string()),
        _ => Err(CommandError::InvalidArguments(format!(
            "usage: {} (quote names that contain spaces)",
            usage
        ))),
    }
}

fn cmd_add_unit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let name = unit_name(args, "add-unit <name>")?;
    let added = context.session.add_unit(&name)?;
    output::success(format!("Unit `{}` added.", added));
    Ok(())
}

fn cmd_remove_unit(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let name = unit_name(args, "remove-unit <name>")?;
    if !context.confirm(&format!("Remove unit `{}` and its readings?", name))? {
        output::info("Removal cancelled.");
        return Ok(());
    }
    context.session.remove_unit(&name)?;
    output::success(format!("Unit `{}` removed.", name));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_name_takes_a_single_argument() {
        assert_eq!(
            unit_name(&["Unit   4"], "add-unit <name>").expect("quoted name"),
            "Unit   4"
        );
        assert!(matches!(
            unit_name(&["Unit", "4"], "add-unit <name>"),
            Err(CommandError::InvalidArguments(_))
        ));
        assert!(unit_name(&[], "add-unit <name>").is_err());
        assert!(unit_name(&["  "], "add-unit <name>").is_err());
    }
}
