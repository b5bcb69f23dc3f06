use crate::cli::commands::{expect_args, parse_position};
use crate::cli::core::{CommandResult, ShellContext};
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::report;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "history",
            "List saved settlements, newest first",
            "history",
            cmd_history,
        ),
        CommandEntry::new(
            "history-apply",
            "Load a saved settlement's units and inputs into the form",
            "history-apply <n>",
            cmd_history_apply,
        ),
        CommandEntry::new(
            "history-delete",
            "Delete a saved settlement",
            "history-delete <n>",
            cmd_history_delete,
        ),
    ]
}

fn cmd_history(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    expect_args(args, 0, "history")?;
    let history = context.session.history();
    output::section(format!(
        "History ({}/{})",
        history.len(),
        history.capacity()
    ));
    output::block(report::render_history(
        history,
        &context.session.amount_format(),
    ));
    Ok(())
}

fn cmd_history_apply(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    expect_args(args, 1, "history-apply <n>")?;
    let index = parse_position(args[0])?;
    let timestamp = context.session.history().get(index)?.timestamp.clone();
    if !context.confirm(&format!(
        "Replace the current units and inputs with the {} settlement?",
        timestamp
    ))? {
        output::info("Nothing changed.");
        return Ok(());
    }
    context.session.apply_history(index)?;
    output::success(format!(
        "Inputs from {} restored. Run `calculate` to settle them again.",
        timestamp
    ));
    Ok(())
}

fn cmd_history_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    expect_args(args, 1, "history-delete <n>")?;
    let index = parse_position(args[0])?;
    let timestamp = context.session.history().get(index)?.timestamp.clone();
    if !context.confirm(&format!("Delete the {} settlement?", timestamp))? {
        output::info("Nothing deleted.");
        return Ok(());
    }
    context.session.delete_history(index)?;
    output::success(format!("Settlement from {} deleted.", timestamp));
    Ok(())
}
