use bytes::Bytes;
use http::{header::HOST, Request, StatusCode};
use http_body_util::{BodyExt, Empty};
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;

use crate::{
    config::ConnectArgs,
    connection::connect_tls,
    error::{CliError, CliResult},
    tls,
};

/// Name of HTTP/1.1 in the ALPN protocol.
const HTTP_1_1_ALPN_NAME: &[u8] = b"http/1.1";

/// Sends a GET request to the given url and prints the response body.
///
/// Fails when the response status is not `200 OK`.
pub(crate) async fn get(args: &ConnectArgs) -> CliResult<()> {
    let material = tls::resolve(&args.tls)?;

    let stream = connect_tls(
        &material.context,
        &args.url,
        vec![HTTP_1_1_ALPN_NAME.to_vec()],
        args.timeout,
    )
    .await?;

    let (mut sender, connection) = http1::handshake(TokioIo::new(stream)).await?;
    tokio::spawn(async move {
        if let Err(error) = connection.await {
            tracing::warn!(%error, "HTTP connection failed.");
        }
    });

    let path = args
        .url
        .path_and_query()
        .map(|path| path.as_str())
        .unwrap_or("/");
    let authority = args
        .url
        .authority()
        .map(|authority| authority.as_str())
        .unwrap_or_default();

    let request = Request::get(path)
        .header(HOST, authority)
        .body(Empty::<Bytes>::new())?;

    sender.ready().await?;
    let response = sender.send_request(request).await?;

    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await?.to_bytes();
    let body = String::from_utf8_lossy(&body);

    if status != StatusCode::OK {
        tracing::error!(
            %status,
            ?headers,
            %body,
            "Unexpected response received."
        );

        return Err(CliError::UnexpectedStatus(status));
    }

    tracing::debug!(%body, "Raw result.");
    print!("{body}");

    Ok(())
}
