use anyhow::Result;
use camcorder_import::cli::Cli;
use camcorder_import::component::CamcorderImport;
use camcorder_import::component::camcorder_import::{ImportReport, exit_code_for};
use camcorder_import::config::Config;
use camcorder_import::init;
use camcorder_import::signal::setup_cancel_signal;
use clap::Parser;
use console::style;
use log::{error, info};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init::init(cli.verbose);

    let outcome = run(cli);
    if let Err(e) = &outcome {
        error!("Program error: {e:#}");
        eprintln!("{} {e:#}", style("Error:").red().bold());
    }

    let code = exit_code_for(&outcome);
    info!("Program exited with status {code}");
    ExitCode::from(code)
}

fn run(cli: Cli) -> Result<ImportReport> {
    let config = Config::from_cli(&cli);
    let cancel_signal = setup_cancel_signal()?;

    CamcorderImport::new(config, cancel_signal).run(cli.roots)
}
