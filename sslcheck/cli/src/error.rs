use std::{io, path::PathBuf, time::Duration};

use http::{StatusCode, Uri};
use miette::Diagnostic;
use sslcheck_tls_util::error::{AssembleError, KeystoreError, PemImportError};
use thiserror::Error;

pub(crate) type CliResult<T, E = CliError> = core::result::Result<T, E>;

const GENERAL_HELP: &str = r#"

- Run again with `--log-level debug` to see how the TLS context was assembled.

- Use `sslcheck inspect` with the same options to review the trust and identity material.

"#;

#[derive(Debug, Error, Diagnostic)]
pub(crate) enum CliError {
    #[error("Failed to import CA certificates from `{0}`: {1}")]
    #[diagnostic(help(
        "The file must contain at least one `-----BEGIN CERTIFICATE-----` block.{GENERAL_HELP}"
    ))]
    CaCertificates(PathBuf, #[source] PemImportError),

    #[error("Failed to load keystore: {0}")]
    #[diagnostic(help(
        "Check the keystore path, password and `--keystore-type` (PKCS12 or PEM).{GENERAL_HELP}"
    ))]
    Keystore(#[from] KeystoreError),

    #[error("Failed to assemble the TLS context: {0}")]
    #[diagnostic(help("{GENERAL_HELP}"))]
    Assemble(#[from] AssembleError),

    #[error("Url `{0}` does not contain a valid TLS server name")]
    #[diagnostic(help("Use a DNS name or an IP address as the host."))]
    InvalidServerName(Uri),

    #[error("Url `{0}` has no port and its scheme has no default port")]
    #[diagnostic(help("Add the port explicitly, e.g. `example.com:443`."))]
    MissingPort(Uri),

    #[error("Failed to connect to `{0}`: {1}")]
    #[diagnostic(help("Check that the server is reachable.{GENERAL_HELP}"))]
    Connect(String, #[source] io::Error),

    #[error("TLS handshake with `{0}` failed: {1}")]
    #[diagnostic(help(
        "If the server certificate is not trusted, pass its CA with `--ca-certs`.{GENERAL_HELP}"
    ))]
    Handshake(String, #[source] io::Error),

    #[error("Connecting to `{0}` timed out after {elapsed}", elapsed = humantime::format_duration(*.1))]
    #[diagnostic(help("Increase the timeout with `--timeout`."))]
    Timeout(String, Duration),

    #[error("HTTP request failed: {0}")]
    #[diagnostic(help("{GENERAL_HELP}"))]
    Http(#[from] hyper::Error),

    #[error("Failed to build HTTP request: {0}")]
    #[diagnostic(help("Check the url."))]
    HttpRequest(#[from] http::Error),

    #[error("Unexpected status code {0} received while processing GET request")]
    UnexpectedStatus(StatusCode),

    #[error("Failed to create the async runtime: {0}")]
    RuntimeError(#[source] io::Error),
}
