#![deny(missing_docs)]

use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand, ValueHint};
use http::Uri;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub(super) struct Cli {
    /// Tracing filter for log output, e.g. `debug` or `sslcheck_tls_util=trace`.
    ///
    /// Overrides `RUST_LOG`.
    #[arg(long, global = true, env = "SSLCHECK_LOG")]
    pub(super) log_level: Option<String>,

    #[command(subcommand)]
    pub(super) commands: Commands,
}

#[derive(Debug, Subcommand)]
pub(super) enum Commands {
    /// Build the TLS context and print a summary of its trust and identity material.
    Inspect(Box<InspectArgs>),

    /// Connect to a server, perform a TLS handshake and print the negotiated parameters.
    Check(Box<ConnectArgs>),

    /// Send an HTTP GET request over TLS and print the response body.
    Get(Box<ConnectArgs>),
}

/// Sources of trust and identity material for the TLS context.
#[derive(Args, Debug)]
pub(super) struct TlsArgs {
    /// PEM file with CA certificates to trust instead of the system roots.
    #[arg(long, alias = "CAcerts", env = "SSLCHECK_CA_CERTS", value_hint = ValueHint::FilePath)]
    pub ca_certs: Option<PathBuf>,

    /// Keystore with the identity to present to peers.
    #[arg(
        long,
        env = "SSLCHECK_KEYSTORE",
        value_hint = ValueHint::FilePath,
        requires = "keystore_password"
    )]
    pub keystore: Option<PathBuf>,

    /// Password of the keystore.
    #[arg(long, env = "SSLCHECK_KEYSTORE_PASSWORD", hide_env_values = true)]
    pub keystore_password: Option<String>,

    /// Storage format of the keystore: PKCS12 (default) or PEM.
    #[arg(long, env = "SSLCHECK_KEYSTORE_TYPE")]
    pub keystore_type: Option<String>,
}

/// Arguments of the `inspect` command.
#[derive(Args, Debug)]
pub(super) struct InspectArgs {
    #[clap(flatten)]
    pub tls: TlsArgs,
}

/// Arguments of the commands that connect to a server.
#[derive(Args, Debug)]
pub(super) struct ConnectArgs {
    #[clap(flatten)]
    pub tls: TlsArgs,

    /// Timeout for establishing the connection and completing the TLS handshake.
    #[arg(long, default_value = "10s", value_parser = humantime::parse_duration)]
    pub timeout: Duration,

    /// Target URL, e.g. `https://example.com/` or `example.com:443`. Only `https` is supported.
    #[arg(value_parser = parse_url)]
    pub url: Uri,
}

fn parse_url(value: &str) -> Result<Uri, String> {
    if value.trim().is_empty() {
        return Err("url may not be blank".to_string());
    }

    let uri = value.trim().parse::<Uri>().map_err(|error| error.to_string())?;
    if uri.host().is_none() {
        return Err(format!("url `{value}` has no host"));
    }
    if let Some(scheme) = uri.scheme_str().filter(|scheme| *scheme != "https") {
        return Err(format!("unsupported scheme `{scheme}`, only `https` is supported"));
    }

    Ok(uri)
}
