use std::{sync::Arc, time::Duration};

use http::Uri;
use sslcheck_tls_util::{TlsContext, UriExt};
use tokio::net::TcpStream;
use tokio_rustls::{client::TlsStream, TlsConnector};
use tracing::Level;

use crate::error::{CliError, CliResult};

/// Connects to the host of the given [`Uri`] and performs a TLS handshake.
///
/// `alpn_protocols` replaces the ALPN protocols of the context's client config.
#[tracing::instrument(level = Level::DEBUG, skip(context), err(level = Level::DEBUG))]
pub(crate) async fn connect_tls(
    context: &TlsContext,
    url: &Uri,
    alpn_protocols: Vec<Vec<u8>>,
    timeout: Duration,
) -> CliResult<TlsStream<TcpStream>> {
    let server_name = url
        .get_server_name()
        .ok_or_else(|| CliError::InvalidServerName(url.clone()))?;
    let port = url
        .port_or_default()
        .ok_or_else(|| CliError::MissingPort(url.clone()))?;
    let host = url
        .host()
        .unwrap_or_default()
        .trim_matches(|c| c == '[' || c == ']');
    let target = format!("{host}:{port}");

    let mut config = (*context.client_config()).clone();
    config.alpn_protocols = alpn_protocols;
    let connector = TlsConnector::from(Arc::new(config));

    let handshake = async {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|error| CliError::Connect(target.clone(), error))?;

        connector
            .connect(server_name, stream)
            .await
            .map_err(|error| CliError::Handshake(target.clone(), error))
    };

    tokio::time::timeout(timeout, handshake)
        .await
        .map_err(|_| CliError::Timeout(target.clone(), timeout))?
}
