use sslcheck_tls_util::ParsedCertificate;
use tokio::io::AsyncWriteExt;

use crate::{config::ConnectArgs, connection::connect_tls, error::CliResult, tls};

/// ALPN protocols offered by `sslcheck check`.
const CHECK_ALPN_PROTOCOLS: [&[u8]; 2] = [b"h2", b"http/1.1"];

/// Performs a TLS handshake with the given server and prints the negotiated parameters.
pub(crate) async fn check(args: &ConnectArgs) -> CliResult<()> {
    let material = tls::resolve(&args.tls)?;

    let alpn_protocols = CHECK_ALPN_PROTOCOLS.iter().map(|p| p.to_vec()).collect();
    let mut stream =
        connect_tls(&material.context, &args.url, alpn_protocols, args.timeout).await?;

    {
        let (_, connection) = stream.get_ref();

        if let Some(version) = connection.protocol_version() {
            println!("Protocol: {version:?}");
        }
        if let Some(suite) = connection.negotiated_cipher_suite() {
            println!("Cipher suite: {:?}", suite.suite());
        }
        match connection.alpn_protocol() {
            Some(protocol) => println!("ALPN: {}", String::from_utf8_lossy(protocol)),
            None => println!("ALPN: none"),
        }

        println!("Peer certificates:");
        for (index, der) in connection
            .peer_certificates()
            .unwrap_or_default()
            .iter()
            .enumerate()
        {
            match ParsedCertificate::try_from(der.clone()) {
                Ok(cert) => {
                    println!("  [{index}] {} (issuer: {})", cert.subject(), cert.issuer())
                }
                Err(error) => println!("  [{index}] <unparsable certificate: {error}>"),
            }
        }
    }

    if let Err(error) = stream.shutdown().await {
        tracing::debug!(%error, "Failed to shut down the TLS stream cleanly.");
    }

    Ok(())
}
