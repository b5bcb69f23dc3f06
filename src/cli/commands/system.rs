use crate::cli::commands::expect_args;
use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::help;
use crate::cli::output;
use crate::cli::registry::CommandEntry;
use crate::utils::build_info;

pub(crate) fn definitions() -> Vec<CommandEntry> {
    vec![
        CommandEntry::new(
            "config",
            "Show the active configuration",
            "config",
            cmd_config,
        ),
        CommandEntry::new("version", "Show build metadata", "version", cmd_version),
        CommandEntry::new(
            "help",
            "Show available commands",
            "help [command]",
            cmd_help,
        ),
        CommandEntry::new("exit", "Exit the shell", "exit", cmd_exit),
    ]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    expect_args(args, 0, "config")?;
    let config = context.session.config();
    let settings = &config.allocator;
    let path = context
        .config_path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "(in memory)".to_string());

    output::section("Configuration");
    help::print_rows(&[
        ("Config file", path),
        ("Default units", config.default_units.join(", ")),
        ("Currency label", config.currency_label.clone()),
        (
            "Grouping separator",
            format!("'{}'", config.grouping_separator),
        ),
        ("Granularity", settings.granularity.to_string()),
        (
            "Error precision",
            format!("{} decimal places", settings.error_precision),
        ),
        ("Negative usage", format!("{:?}", settings.negative_usage)),
        ("History capacity", config.history_capacity.to_string()),
        (
            "Export directory",
            config.resolve_export_dir().display().to_string(),
        ),
    ]);
    Ok(())
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let meta = build_info::current();
    output::section(format!("Villa Split {}", meta.version));
    help::print_rows(&meta.rows());
    Ok(())
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first().map(|name| name.to_lowercase()) {
        if let Some(entry) = context.registry.get(&name) {
            help::print_command(entry);
        } else {
            context.suggest_command(args[0]);
        }
        return Ok(());
    }

    help::print_overview(&context.registry);
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
