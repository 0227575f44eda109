//! Builds TLS configurations from PEM certificate bundles and password protected keystores.
//!
//! The pipeline has four steps, each usable on its own:
//!
//! 1. [`import_certificates`] parses certificates from a PEM file.
//! 2. [`TrustContainer::build`] registers parsed certificates under sequential labels.
//! 3. [`load_keystore`] opens a PKCS#12 or PEM keystore.
//! 4. [`assemble`] combines optional trust and identity material into a [`TlsContext`].
//!
//! All operations are synchronous and keep no state between calls.

mod certificate;
mod context;
pub mod error;
mod keystore;
mod read_pem;
mod trust_store;
mod uri_ext;

pub use certificate::ParsedCertificate;
pub use context::{assemble, assemble_with_provider, preferred_provider, TlsContext, TrustSource};
pub use error::ErrorKind;
pub use keystore::{load_keystore, IdentityEntry, IdentityStore, KeystoreFormat, RecoveredIdentity};
pub use read_pem::{import_certificates, import_certificates_from_reader};
pub use trust_store::TrustContainer;
pub use uri_ext::UriExt;
