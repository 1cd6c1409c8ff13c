use anyhow::Result;
use clap::Parser;
use std::io;
use std::sync::Arc;
use tracing::debug;

mod commands;
mod display;
mod handler;
mod logging;
mod prompt;
mod settings;

use commands::Cli;
use common::Diagnostics;
use connection::ReqwestTransport;
use handler::{App, exit_code};
use prompt::{AssumeYes, Confirm, LinePrompt};
use settings::SettingsFile;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("Error: {:#}", err);
        std::process::exit(exit_code(&err));
    }
}

async fn run(cli: Cli) -> Result<()> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => settings::default_path()?,
    };
    let mut settings = SettingsFile::open(path)?;

    logging::init(&settings.settings().display.log_level, cli.verbose);
    debug!("Loaded settings from {}", settings.path().display());

    let transport = Arc::new(ReqwestTransport::new()?);
    let mut confirm: Box<dyn Confirm> = if cli.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(LinePrompt::stdio())
    };
    let mut stdout = io::stdout();

    let mut app = App {
        transport,
        diagnostics: Diagnostics::new(),
        settings: &mut settings,
        confirm: confirm.as_mut(),
        out: &mut stdout,
    };
    app.execute(cli.command).await
}
