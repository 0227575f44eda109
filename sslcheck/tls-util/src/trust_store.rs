use std::path::Path;

use rustls::RootCertStore;

use crate::{
    certificate::ParsedCertificate,
    error::{AssembleError, PemImportError},
    read_pem::import_certificates,
};

/// In-memory set of trusted certificates, each registered under a synthetic label.
///
/// Labels are `"1"`, `"2"`, ... in the order the certificates were given. The container is
/// read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrustContainer {
    entries: Vec<(String, ParsedCertificate)>,
}

impl TrustContainer {
    /// Builds a container from the given certificates.
    ///
    /// Never fails, an empty input gives an empty container.
    pub fn build<I: IntoIterator<Item = ParsedCertificate>>(certificates: I) -> Self {
        let entries = certificates
            .into_iter()
            .enumerate()
            .map(|(index, cert)| ((index + 1).to_string(), cert))
            .collect();

        Self { entries }
    }

    /// Imports all certificates from the given PEM file and builds a container from them.
    pub fn from_pem_file(path: &Path) -> Result<Self, PemImportError> {
        import_certificates(path).map(Self::build)
    }

    pub fn get(&self, label: &str) -> Option<&ParsedCertificate> {
        self.entries
            .iter()
            .find_map(|(entry_label, cert)| (entry_label == label).then_some(cert))
    }

    /// Iterates over `(label, certificate)` pairs in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParsedCertificate)> {
        self.entries
            .iter()
            .map(|(label, cert)| (label.as_str(), cert))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(label, _)| label.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds a [`RootCertStore`] containing exactly the certificates from this container.
    ///
    /// Unlike [`RootCertStore::add_parsable_certificates`], fails on the first certificate that
    /// cannot be used as a trust anchor.
    pub fn root_store(&self) -> Result<RootCertStore, AssembleError> {
        let mut root_store = RootCertStore::empty();

        for (label, cert) in &self.entries {
            root_store
                .add(cert.der().clone())
                .map_err(|error| AssembleError::InvalidTrustAnchor {
                    error,
                    label: label.clone(),
                })?;
        }

        Ok(root_store)
    }
}
