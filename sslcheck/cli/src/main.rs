#![deny(unused_crate_dependencies)]

use clap::Parser;
use config::{Cli, Commands};

mod check;
mod config;
mod connection;
mod error;
mod get;
mod inspect;
mod logging;
mod tls;

pub(crate) use error::{CliError, CliResult};

fn main() -> miette::Result<()> {
    // Identity keys are loaded with the process-wide provider, see `preferred_provider`.
    rustls::crypto::CryptoProvider::install_default(rustls::crypto::aws_lc_rs::default_provider())
        .expect("Failed to install crypto provider");

    let cli = Cli::parse();
    logging::init_tracing_registry(cli.log_level.as_deref());

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::RuntimeError)?;

    let res: CliResult<()> = rt.block_on(async move {
        match cli.commands {
            Commands::Inspect(args) => inspect::inspect(&args)?,
            Commands::Check(args) => check::check(&args).await?,
            Commands::Get(args) => get::get(&args).await?,
        }

        Ok(())
    });

    res.map_err(Into::into)
}
