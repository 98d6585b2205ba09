// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, set up logging, hand over to `ui`.
// - A `[FATAL]` setup error ends the process with exit code 1.

use std::process::ExitCode;

use clap::Parser;
use mass_disposer::{cli::Cli, logging, ui};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match ui::run(&cli)? {
        ui::Exit::Fatal => Ok(ExitCode::FAILURE),
        ui::Exit::Completed(_) | ui::Exit::Declined => Ok(ExitCode::SUCCESS),
    }
}
