use clap::Parser;

mod cli;
mod commands;
mod logging;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let level = match (&cli.command, cli.verbose) {
        (_, true) => "debug",
        (cli::Command::Serve(_), false) => "info",
        _ => "warn",
    };
    logging::init_logging(level, cli.log_format);
    commands::run_command(cli)
}
