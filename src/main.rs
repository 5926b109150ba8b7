//! `chezdeck` binary entry point.
use anyhow::Result;
use clap::Parser;

use chezdeck::cli::{Cli, Command};
use chezdeck::client::{Client, ClientOptions};
use chezdeck::commands::{self, Output};
use chezdeck::logging;
use chezdeck::service::Service;

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();
    logging::init_subscriber(args.verbose, args.command.name());

    if let Command::Completions(opts) = &args.command {
        commands::version::completions(opts.shell);
        return Ok(());
    }

    let config = commands::load_config(&args.global)?;
    if let Command::Version = args.command {
        commands::version::run(&Client::new(ClientOptions::from(&config)));
        return Ok(());
    }

    let service = Service::from_config(&config);
    commands::run(&args.command, &service, Output::new(args.global.json))
}
