use std::{
    fmt,
    io::{BufReader, Cursor},
    path::{Path, PathBuf},
    str::FromStr,
};

use p12_keystore::{KeyStore, KeyStoreEntry};
use rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls_pemfile::Item;
use tracing::Level;

use crate::{certificate::ParsedCertificate, error::KeystoreError};

/// Storage formats understood by [`load_keystore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeystoreFormat {
    /// PKCS#12 / PFX, password protected.
    #[default]
    Pkcs12,
    /// PEM file with a certificate chain and exactly one unencrypted private key.
    Pem,
}

impl KeystoreFormat {
    /// Resolves an optional format name, blank or missing names select the default format.
    pub fn from_name(name: Option<&str>) -> Result<Self, KeystoreError> {
        match name.map(str::trim) {
            None | Some("") => Ok(Self::default()),
            Some(name) => name.parse(),
        }
    }
}

impl FromStr for KeystoreFormat {
    type Err = KeystoreError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_uppercase().as_str() {
            "PKCS12" | "PKCS#12" | "P12" | "PFX" => Ok(Self::Pkcs12),
            "PEM" => Ok(Self::Pem),
            _ => Err(KeystoreError::UnsupportedFormat(name.to_string())),
        }
    }
}

impl fmt::Display for KeystoreFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pkcs12 => f.write_str("PKCS12"),
            Self::Pem => f.write_str("PEM"),
        }
    }
}

/// A private key entry of an [`IdentityStore`], without the key itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityEntry {
    alias: String,
    chain: Vec<ParsedCertificate>,
}

impl IdentityEntry {
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Certificate chain, end-entity certificate first.
    pub fn chain(&self) -> &[ParsedCertificate] {
        &self.chain
    }
}

/// A private key entry with its key material recovered.
pub struct RecoveredIdentity {
    pub alias: String,
    pub chain: Vec<ParsedCertificate>,
    pub key: PrivateKeyDer<'static>,
}

impl fmt::Debug for RecoveredIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecoveredIdentity")
            .field("alias", &self.alias)
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

/// Password protected keystore loaded from disk.
///
/// Certificate chains are readable right after [`load_keystore`]. Private keys are recovered
/// separately with [`IdentityStore::recover_keys`], so that a wrong key password can be told
/// apart from a wrong store password.
pub struct IdentityStore {
    path: PathBuf,
    format: KeystoreFormat,
    contents: Vec<u8>,
    entries: Vec<IdentityEntry>,
    trusted: Vec<(String, ParsedCertificate)>,
}

impl IdentityStore {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> KeystoreFormat {
        self.format
    }

    /// Private key entries, in the order they appear in the keystore.
    pub fn entries(&self) -> &[IdentityEntry] {
        &self.entries
    }

    /// Certificate-only entries, as `(alias, certificate)` pairs.
    pub fn trusted_certificates(&self) -> &[(String, ParsedCertificate)] {
        &self.trusted
    }

    /// Recovers all private keys using the given key password.
    #[tracing::instrument(level = Level::DEBUG, skip(self, password), fields(path = ?self.path), err(level = Level::DEBUG))]
    pub fn recover_keys(&self, password: &str) -> Result<Vec<RecoveredIdentity>, KeystoreError> {
        if password.trim().is_empty() {
            return Err(KeystoreError::BlankPassword);
        }

        match self.format {
            KeystoreFormat::Pkcs12 => {
                let keystore = open_pkcs12(&self.path, &self.contents, password)?;
                read_pkcs12_entries(&self.path, &keystore).map(|(identities, _)| identities)
            }
            KeystoreFormat::Pem => {
                read_pem_identity(&self.path, &self.contents).map(|identity| vec![identity])
            }
        }
    }
}

impl fmt::Debug for IdentityStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityStore")
            .field("path", &self.path)
            .field("format", &self.format)
            .field("entries", &self.entries)
            .field("trusted", &self.trusted.len())
            .finish_non_exhaustive()
    }
}

/// Loads a keystore from the given file.
///
/// `format` selects the storage format by name, [`KeystoreFormat::Pkcs12`] is used when it is
/// missing or blank.
#[tracing::instrument(level = Level::DEBUG, skip(password), ret, err(level = Level::DEBUG))]
pub fn load_keystore(
    path: &Path,
    password: &str,
    format: Option<&str>,
) -> Result<IdentityStore, KeystoreError> {
    if path.as_os_str().to_string_lossy().trim().is_empty() {
        return Err(KeystoreError::BlankPath);
    }
    if password.trim().is_empty() {
        return Err(KeystoreError::BlankPassword);
    }
    if !path.is_file() {
        return Err(KeystoreError::FileNotFound(path.to_path_buf()));
    }

    let format = KeystoreFormat::from_name(format)?;
    let contents = std::fs::read(path).map_err(|error| KeystoreError::ReadFileError {
        error,
        path: path.to_path_buf(),
    })?;

    let (entries, trusted) = match format {
        KeystoreFormat::Pkcs12 => {
            let keystore = open_pkcs12(path, &contents, password)?;
            let (identities, trusted) = read_pkcs12_entries(path, &keystore)?;
            (identities.into_iter().map(strip_key).collect(), trusted)
        }
        KeystoreFormat::Pem => {
            let identity = read_pem_identity(path, &contents)?;
            (vec![strip_key(identity)], Vec::new())
        }
    };

    Ok(IdentityStore {
        path: path.to_path_buf(),
        format,
        contents,
        entries,
        trusted,
    })
}

fn strip_key(identity: RecoveredIdentity) -> IdentityEntry {
    IdentityEntry {
        alias: identity.alias,
        chain: identity.chain,
    }
}

fn open_pkcs12(path: &Path, contents: &[u8], password: &str) -> Result<KeyStore, KeystoreError> {
    KeyStore::from_pkcs12(contents, password).map_err(|error| match error {
        p12_keystore::error::Error::MacError(..) => {
            KeystoreError::WrongPassword(path.to_path_buf())
        }
        error => KeystoreError::InvalidPkcs12 {
            error,
            path: path.to_path_buf(),
        },
    })
}

type Pkcs12Entries = (Vec<RecoveredIdentity>, Vec<(String, ParsedCertificate)>);

fn read_pkcs12_entries(path: &Path, keystore: &KeyStore) -> Result<Pkcs12Entries, KeystoreError> {
    let parse = |der: &[u8]| {
        ParsedCertificate::from_der(der).map_err(|error| KeystoreError::InvalidCertificate {
            error,
            path: path.to_path_buf(),
        })
    };

    let mut identities = Vec::new();
    let mut trusted = Vec::new();

    for (alias, entry) in keystore.entries() {
        match entry {
            KeyStoreEntry::PrivateKeyChain(chain) => {
                let certs = chain
                    .chain()
                    .iter()
                    .map(|cert| parse(cert.as_der()))
                    .collect::<Result<Vec<_>, _>>()?;
                if certs.is_empty() {
                    return Err(KeystoreError::NoCertFound(path.to_path_buf()));
                }

                identities.push(RecoveredIdentity {
                    alias: alias.clone(),
                    chain: certs,
                    key: PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(chain.key().to_vec())),
                });
            }
            KeyStoreEntry::Certificate(cert) => {
                trusted.push((alias.clone(), parse(cert.as_der())?));
            }
        }
    }

    Ok((identities, trusted))
}

/// Reads a certificate chain and a private key from PEM contents.
///
/// 1. PEM items of other types are ignored.
/// 2. At least one certificate is required.
/// 3. Exactly one private key is required.
fn read_pem_identity(path: &Path, contents: &[u8]) -> Result<RecoveredIdentity, KeystoreError> {
    let mut reader = BufReader::new(Cursor::new(contents));
    let mut chain = Vec::new();
    let mut found_key = None;

    for entry in rustls_pemfile::read_all(&mut reader) {
        let key = match entry {
            Ok(Item::X509Certificate(cert)) => {
                let cert = ParsedCertificate::try_from(cert).map_err(|error| {
                    KeystoreError::InvalidCertificate {
                        error,
                        path: path.to_path_buf(),
                    }
                })?;
                chain.push(cert);
                continue;
            }
            Ok(Item::Pkcs1Key(key)) => PrivateKeyDer::Pkcs1(key),
            Ok(Item::Pkcs8Key(key)) => PrivateKeyDer::Pkcs8(key),
            Ok(Item::Sec1Key(key)) => PrivateKeyDer::Sec1(key),
            Ok(..) => continue,
            Err(error) => {
                return Err(KeystoreError::InvalidPem {
                    error,
                    path: path.to_path_buf(),
                })
            }
        };

        if found_key.replace(key).is_some() {
            return Err(KeystoreError::MultipleKeysFound(path.to_path_buf()));
        }
    }

    if chain.is_empty() {
        return Err(KeystoreError::NoCertFound(path.to_path_buf()));
    }
    let key = found_key.ok_or_else(|| KeystoreError::NoKeyFound(path.to_path_buf()))?;

    let alias = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "1".to_string());

    Ok(RecoveredIdentity { alias, chain, key })
}
