use std::{fmt, sync::Arc};

use rustls::{
    client::ResolvesClientCert,
    crypto::{aws_lc_rs, CryptoProvider},
    pki_types::CertificateDer,
    server::{ClientHello, ResolvesServerCert, WebPkiClientVerifier},
    sign::CertifiedKey,
    ClientConfig, RootCertStore, ServerConfig, SignatureScheme,
};
use tracing::Level;

use crate::{error::AssembleError, keystore::IdentityStore, trust_store::TrustContainer};

/// Where the trust anchors of a [`TlsContext`] come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustSource {
    /// Anchors come only from a [`TrustContainer`].
    Explicit { anchors: usize },
    /// Anchors come from the platform's certificate store.
    System { anchors: usize },
}

impl TrustSource {
    pub fn anchors(&self) -> usize {
        match self {
            Self::Explicit { anchors } | Self::System { anchors } => *anchors,
        }
    }
}

/// Fully initialized TLS configuration, ready to be handed to a TLS transport.
///
/// Always has a client side. Has a server side only when it was assembled with an identity.
#[derive(Clone)]
pub struct TlsContext {
    provider: Arc<CryptoProvider>,
    trust: TrustSource,
    identities: Vec<String>,
    client_config: Arc<ClientConfig>,
    server_config: Option<Arc<ServerConfig>>,
}

impl TlsContext {
    pub fn provider(&self) -> &Arc<CryptoProvider> {
        &self.provider
    }

    pub fn trust_source(&self) -> TrustSource {
        self.trust
    }

    /// Aliases of the identities this context can present to peers.
    pub fn identity_aliases(&self) -> &[String] {
        &self.identities
    }

    pub fn client_config(&self) -> Arc<ClientConfig> {
        self.client_config.clone()
    }

    pub fn server_config(&self) -> Option<Arc<ServerConfig>> {
        self.server_config.clone()
    }
}

impl fmt::Debug for TlsContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsContext")
            .field("trust", &self.trust)
            .field("identities", &self.identities)
            .field("cipher_suites", &self.provider.cipher_suites.len())
            .field("server", &self.server_config.is_some())
            .finish_non_exhaustive()
    }
}

/// Presents the first identity whose key can sign with one of the schemes offered by the peer.
#[derive(Debug)]
struct IdentityResolver {
    aliases: Vec<String>,
    identities: Vec<Arc<CertifiedKey>>,
}

impl IdentityResolver {
    fn select(&self, sigschemes: &[SignatureScheme]) -> Option<Arc<CertifiedKey>> {
        self.identities
            .iter()
            .find(|identity| identity.key.choose_scheme(sigschemes).is_some())
            .cloned()
    }
}

impl ResolvesClientCert for IdentityResolver {
    fn resolve(
        &self,
        _root_hint_subjects: &[&[u8]],
        sigschemes: &[SignatureScheme],
    ) -> Option<Arc<CertifiedKey>> {
        self.select(sigschemes)
    }

    fn has_certs(&self) -> bool {
        !self.identities.is_empty()
    }
}

impl ResolvesServerCert for IdentityResolver {
    fn resolve(&self, client_hello: ClientHello<'_>) -> Option<Arc<CertifiedKey>> {
        self.select(client_hello.signature_schemes())
    }
}

/// Returns the process-wide default [`CryptoProvider`], or the built-in `aws-lc-rs` provider
/// when none was installed with [`CryptoProvider::install_default`].
pub fn preferred_provider() -> Arc<CryptoProvider> {
    match CryptoProvider::get_default() {
        Some(provider) => {
            tracing::debug!("Using the process-wide default crypto provider.");
            provider.clone()
        }
        None => {
            tracing::debug!("No process-wide crypto provider installed, falling back to aws-lc-rs.");
            Arc::new(aws_lc_rs::default_provider())
        }
    }
}

/// Assembles a [`TlsContext`] using [`preferred_provider`].
///
/// See [`assemble_with_provider`].
pub fn assemble(
    trust: Option<&TrustContainer>,
    identity: Option<&IdentityStore>,
    identity_password: Option<&str>,
) -> Result<TlsContext, AssembleError> {
    if identity.is_some() && is_blank(identity_password) {
        return Err(AssembleError::BlankIdentityPassword);
    }

    assemble_with_provider(preferred_provider(), trust, identity, identity_password)
}

/// Assembles a [`TlsContext`] from optional trust and identity material.
///
/// 1. Without `trust`, the platform's root certificates are trusted.
/// 2. With `trust`, only its certificates are trusted, platform roots are not added.
/// 3. With `identity`, `identity_password` must not be blank. It is checked before the store is
///    touched. The recovered keys are presented for client authentication and used for the server
///    side.
///
/// No network I/O happens here.
#[tracing::instrument(level = Level::DEBUG, skip(provider, identity_password), ret, err(level = Level::DEBUG))]
pub fn assemble_with_provider(
    provider: Arc<CryptoProvider>,
    trust: Option<&TrustContainer>,
    identity: Option<&IdentityStore>,
    identity_password: Option<&str>,
) -> Result<TlsContext, AssembleError> {
    let identity = match (identity, identity_password) {
        (Some(identity), Some(password)) if !password.trim().is_empty() => {
            Some((identity, password))
        }
        (Some(..), _) => return Err(AssembleError::BlankIdentityPassword),
        (None, _) => None,
    };

    provider
        .secure_random
        .fill(&mut [0; 32])
        .map_err(|error| AssembleError::RandomSource(error.into()))?;

    let (root_store, trust_source) = match trust {
        Some(container) => {
            let root_store = container.root_store()?;
            let anchors = root_store.len();
            (root_store, TrustSource::Explicit { anchors })
        }
        None => {
            let root_store = system_root_store();
            let anchors = root_store.len();
            (root_store, TrustSource::System { anchors })
        }
    };
    let root_store = Arc::new(root_store);

    let resolver = match identity {
        Some((store, password)) => {
            let resolver = identity_resolver(&provider, store, password)?;
            if resolver.identities.is_empty() {
                tracing::warn!(
                    path = ?store.path(),
                    "Identity keystore contains no private key entries, no identity will be presented."
                );
                None
            } else {
                Some(Arc::new(resolver))
            }
        }
        None => None,
    };

    let client_builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(AssembleError::ProtocolVersions)?
        .with_root_certificates(root_store.clone());
    let client_config = match resolver.clone() {
        Some(resolver) => client_builder.with_client_cert_resolver(resolver),
        None => client_builder.with_no_client_auth(),
    };

    let server_config = match resolver.clone() {
        Some(resolver) => {
            let verifier = match trust_source {
                TrustSource::Explicit { anchors } if anchors > 0 => {
                    WebPkiClientVerifier::builder_with_provider(root_store, provider.clone())
                        .allow_unauthenticated()
                        .build()?
                }
                _ => WebPkiClientVerifier::no_client_auth(),
            };

            let server_config = ServerConfig::builder_with_provider(provider.clone())
                .with_safe_default_protocol_versions()
                .map_err(AssembleError::ProtocolVersions)?
                .with_client_cert_verifier(verifier)
                .with_cert_resolver(resolver);

            Some(Arc::new(server_config))
        }
        None => None,
    };

    let identities = resolver
        .map(|resolver| resolver.aliases.clone())
        .unwrap_or_default();

    Ok(TlsContext {
        provider,
        trust: trust_source,
        identities,
        client_config: Arc::new(client_config),
        server_config,
    })
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |value| value.trim().is_empty())
}

/// Recovers the private keys of the given store and loads them with the given provider.
fn identity_resolver(
    provider: &CryptoProvider,
    store: &IdentityStore,
    password: &str,
) -> Result<IdentityResolver, AssembleError> {
    let recovered = store
        .recover_keys(password)
        .map_err(AssembleError::KeyRecovery)?;
    let aliases = recovered
        .iter()
        .map(|identity| identity.alias.clone())
        .collect();

    let identities = recovered
        .into_iter()
        .map(|identity| {
            let key = provider
                .key_provider
                .load_private_key(identity.key)
                .map_err(|error| AssembleError::InvalidIdentityKey {
                    error,
                    alias: identity.alias.clone(),
                })?;
            let chain = identity
                .chain
                .into_iter()
                .map(|cert| cert.into_der())
                .collect::<Vec<CertificateDer<'static>>>();

            Ok(Arc::new(CertifiedKey::new(chain, key)))
        })
        .collect::<Result<Vec<_>, AssembleError>>()?;

    Ok(IdentityResolver {
        aliases,
        identities,
    })
}

/// Builds a [`RootCertStore`] from the platform's certificate store.
///
/// Does not fail, certificates that cannot be loaded or parsed are logged and skipped.
fn system_root_store() -> RootCertStore {
    let result = rustls_native_certs::load_native_certs();
    for error in &result.errors {
        tracing::warn!(%error, "Failed to load a system root certificate.");
    }

    let mut root_store = RootCertStore::empty();
    let (added, ignored) = root_store.add_parsable_certificates(result.certs);

    if ignored > 0 {
        tracing::warn!(
            added,
            "Ignored {ignored} invalid system root certificate(s) when building a root cert store."
        );
    }
    if added == 0 {
        tracing::warn!("No system root certificates were found.");
    }

    root_store
}
