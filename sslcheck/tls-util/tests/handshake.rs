//! Loopback TLS handshakes using contexts assembled from the fixtures in `tests/fixtures`.
//!
//! Fixture keystores use the password `changeit`. `server.p12` and `client.p12` are signed by the
//! root in `ca.pem`, `server.p12` is valid for `localhost`.

use std::{io, path::PathBuf, sync::Arc};

use rcgen::{BasicConstraints, CertificateParams, DnType, DnValue, IsCa, KeyPair, KeyUsagePurpose};
use rustls::{
    crypto::{aws_lc_rs, CryptoProvider},
    pki_types::{CertificateDer, ServerName},
    ClientConfig, ServerConfig,
};
use sslcheck_tls_util::{
    assemble_with_provider, load_keystore, ParsedCertificate, TlsContext, TrustContainer,
    TrustSource,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};
use tokio_rustls::{TlsAcceptor, TlsConnector};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn provider() -> Arc<CryptoProvider> {
    Arc::new(aws_lc_rs::default_provider())
}

fn fixture_trust() -> TrustContainer {
    TrustContainer::from_pem_file(&fixture("ca.pem")).unwrap()
}

fn context(trust: Option<&TrustContainer>, keystore: Option<&str>) -> TlsContext {
    let store = keystore.map(|name| load_keystore(&fixture(name), "changeit", None).unwrap());

    assemble_with_provider(provider(), trust, store.as_ref(), Some("changeit")).unwrap()
}

/// Generates a self-signed root that is trusted by nobody.
fn unrelated_root() -> ParsedCertificate {
    let key_pair = KeyPair::generate().unwrap();

    let mut params = CertificateParams::new(vec!["unrelated root".to_string()]).unwrap();
    params
        .distinguished_name
        .push(DnType::CommonName, DnValue::Utf8String("unrelated root".into()));
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![KeyUsagePurpose::KeyCertSign];

    let cert = params.self_signed(&key_pair).unwrap();
    ParsedCertificate::from_der(cert.der().to_vec()).unwrap()
}

/// Runs one exchange between the given configs over a loopback TCP connection.
///
/// Returns the certificates presented by the client, as seen by the server.
async fn talk(
    server: Arc<ServerConfig>,
    client: Arc<ClientConfig>,
    server_name: &str,
) -> io::Result<Option<Vec<CertificateDer<'static>>>> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let server_addr = listener.local_addr()?;
    let acceptor = TlsAcceptor::from(server);

    let server_task = tokio::spawn(async move {
        let stream = listener.accept().await?.0;
        let mut stream = acceptor.accept(stream).await?;

        let mut message = String::new();
        stream.read_to_string(&mut message).await?;
        let peer_certs = stream.get_ref().1.peer_certificates().map(<[_]>::to_vec);

        Ok::<_, io::Error>((message, peer_certs))
    });

    let connector = TlsConnector::from(client);
    let server_name = ServerName::try_from(server_name.to_string()).unwrap();
    let client_result = async {
        let stream = TcpStream::connect(server_addr).await?;
        let mut stream = connector.connect(server_name, stream).await?;

        stream.write_all(b"hello there").await?;
        stream.shutdown().await
    }
    .await;

    let server_result = server_task.await.unwrap();
    client_result?;

    let (message, peer_certs) = server_result?;
    assert_eq!(message, "hello there");

    Ok(peer_certs)
}

#[tokio::test]
async fn server_trusted_by_explicit_root() {
    let trust = fixture_trust();
    let server = context(Some(&trust), Some("server.p12"));
    let client = context(Some(&trust), None);

    let peer_certs = talk(
        server.server_config().unwrap(),
        client.client_config(),
        "localhost",
    )
    .await
    .unwrap();

    assert!(peer_certs.is_none());
}

#[tokio::test]
async fn mutual_authentication() {
    let trust = fixture_trust();
    let server = context(Some(&trust), Some("server.p12"));
    let client = context(Some(&trust), Some("client.p12"));

    let peer_certs = talk(
        server.server_config().unwrap(),
        client.client_config(),
        "localhost",
    )
    .await
    .unwrap()
    .expect("client should present its certificate");

    let client_cert = ParsedCertificate::try_from(peer_certs[0].clone()).unwrap();
    assert!(client_cert.subject().contains("CN=client"));
}

#[tokio::test]
async fn pem_identity_serves_handshakes() {
    let trust = fixture_trust();
    let store = load_keystore(&fixture("server-identity.pem"), "unused", Some("PEM")).unwrap();
    let server =
        assemble_with_provider(provider(), Some(&trust), Some(&store), Some("unused")).unwrap();
    let client = context(Some(&trust), None);

    talk(
        server.server_config().unwrap(),
        client.client_config(),
        "localhost",
    )
    .await
    .unwrap();
}

/// Explicit trust replaces the default trust, a server signed by any other root is rejected.
#[tokio::test]
async fn explicit_trust_is_not_a_union() {
    let server = context(Some(&fixture_trust()), Some("server.p12"));

    let unrelated = TrustContainer::build([unrelated_root()]);
    let client = context(Some(&unrelated), None);
    assert_eq!(
        client.trust_source(),
        TrustSource::Explicit { anchors: 1 }
    );

    talk(
        server.server_config().unwrap(),
        client.client_config(),
        "localhost",
    )
    .await
    .unwrap_err();
}

#[tokio::test]
async fn system_trust_rejects_private_root() {
    let server = context(Some(&fixture_trust()), Some("server.p12"));
    let client = context(None, None);
    assert!(matches!(client.trust_source(), TrustSource::System { .. }));

    talk(
        server.server_config().unwrap(),
        client.client_config(),
        "localhost",
    )
    .await
    .unwrap_err();
}

#[tokio::test]
async fn server_name_must_match() {
    let trust = fixture_trust();
    let server = context(Some(&trust), Some("server.p12"));
    let client = context(Some(&trust), None);

    talk(
        server.server_config().unwrap(),
        client.client_config(),
        "not-localhost.test",
    )
    .await
    .unwrap_err();
}

#[test]
fn bundle_with_header_text() {
    let container = TrustContainer::from_pem_file(&fixture("bundle.pem")).unwrap();

    assert_eq!(container.labels().collect::<Vec<_>>(), ["1", "2"]);
    assert!(container.get("1").unwrap().is_ca());
    assert!(container.get("2").unwrap().subject().contains("CN=server"));
}
