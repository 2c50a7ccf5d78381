mod cli;
mod commands;
mod config;
mod error;
mod markers;
mod render;
mod ui;

use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

use crate::cli::{Cli, normalize_args};
use crate::config::MarkutConfig;
use crate::error::UsageError;
use crate::ui::prelude::{Level, emit};

fn print_usage(subcommand: Option<&str>) {
    let mut command = Cli::command();
    command.build();
    let target = match subcommand {
        Some(name) => command.find_subcommand_mut(name),
        None => Some(&mut command),
    };
    if let Some(target) = target {
        let _ = target.print_help();
        println!();
    }
}

fn report_error(err: &anyhow::Error) {
    if let Some(usage) = err.downcast_ref::<UsageError>() {
        print_usage(usage.usage_for());
        emit(
            Level::Error,
            "markut.usage",
            &format!("ERROR: {usage}"),
            None,
        );
        return;
    }

    emit(Level::Error, "markut.error", &format!("ERROR: {err:#}"), None);
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(1),
            };
        }
    };

    ui::init(cli.format, !cli.no_color);
    ui::set_debug_mode(cli.debug);

    let Some(command) = cli.command else {
        report_error(&anyhow::Error::new(UsageError::MissingSubcommand));
        return ExitCode::from(1);
    };

    let result = MarkutConfig::load(cli.config.as_deref())
        .and_then(|config| commands::handle_command(command, &config));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::from(1)
        }
    }
}
