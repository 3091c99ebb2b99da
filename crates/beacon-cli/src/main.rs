//! Beacon CLI binary entrypoint.
//!
//! This is the main entry point for the `beacon` command-line tool.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use beacon_alerts::{AlertLayer, SendOutcome};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use beacon_cli::app::App;
use beacon_cli::cli::{Cli, Commands};
use beacon_cli::commands::{CheckCommand, SendCommand, WatchCommand};

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    // The router must exist before tracing starts so the alert layer can use it
    let app = match App::load(&cli.config) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&cli, &app);

    match run(&cli, &app) {
        Ok(code) => code,
        Err(e) => {
            app.shutdown();
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(cli: &Cli, app: &App) {
    let alerts = cli
        .alert_tracing
        .then(|| AlertLayer::new(Arc::clone(app.router())));

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(alerts)
        .init();
}

fn run(cli: &Cli, app: &App) -> anyhow::Result<ExitCode> {
    let mut stdout = io::stdout().lock();

    let code = match &cli.command {
        Commands::Check(args) => {
            CheckCommand::new(app).execute(&mut stdout, args)?;
            ExitCode::SUCCESS
        }
        Commands::Send(args) => match SendCommand::new(app).execute(&mut stdout, args)? {
            SendOutcome::Failed { .. } | SendOutcome::NoChannel => ExitCode::FAILURE,
            _ => ExitCode::SUCCESS,
        },
        Commands::Watch(args) => {
            WatchCommand::new(app).execute(&mut stdout, args)?;
            ExitCode::SUCCESS
        }
    };
    Ok(code)
}
