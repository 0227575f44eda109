use std::{io, path::PathBuf};

use thiserror::Error;
use x509_parser::{error::X509Error, nom};

/// Coarse classification shared by all errors of this crate.
///
/// Lets callers react to a failure without matching on every variant, e.g. prompt for the
/// password again on [`ErrorKind::AuthenticationFailure`] but abort on
/// [`ErrorKind::MalformedInput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Referenced file does not exist or cannot be read.
    NotFound,
    /// Required value is blank, or an invalid combination of values was given.
    InvalidArgument,
    /// Content does not conform to the expected format.
    MalformedInput,
    /// Structurally valid keystore, but the password is wrong.
    AuthenticationFailure,
    /// Crypto provider, verifier or key material could not be initialized.
    InitializationFailure,
}

/// Errors that can occur when importing certificates from a PEM source.
#[derive(Error, Debug)]
pub enum PemImportError {
    #[error("failed to open PEM file `{path}`: {error}")]
    OpenFileError {
        #[source]
        error: io::Error,
        path: PathBuf,
    },
    #[error("failed to read PEM source: {0}")]
    ReadError(#[source] io::Error),
    #[error("the source does not contain a `BEGIN CERTIFICATE` marker")]
    NoCertFound,
    #[error("`BEGIN CERTIFICATE` marker at line {0} has no matching `END CERTIFICATE`")]
    UnterminatedBlock(usize),
    #[error("unexpected `END CERTIFICATE` marker at line {0}")]
    UnexpectedEnd(usize),
    #[error("certificate block ending at line {line} is not valid base64: {error}")]
    Base64Error {
        #[source]
        error: base64::DecodeError,
        line: usize,
    },
    #[error("certificate block ending at line {line} is not a valid X.509 certificate: {error}")]
    InvalidCertificate {
        #[source]
        error: CertificateDecodeError,
        line: usize,
    },
}

impl PemImportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::OpenFileError { .. } => ErrorKind::NotFound,
            Self::ReadError(error) if error.kind() == io::ErrorKind::InvalidData => {
                ErrorKind::MalformedInput
            }
            Self::ReadError(..) => ErrorKind::NotFound,
            Self::NoCertFound
            | Self::UnterminatedBlock(..)
            | Self::UnexpectedEnd(..)
            | Self::Base64Error { .. }
            | Self::InvalidCertificate { .. } => ErrorKind::MalformedInput,
        }
    }
}

/// Errors that can occur when decoding a single DER certificate.
#[derive(Error, Debug)]
pub enum CertificateDecodeError {
    #[error("failed to parse the x509 certificate: {0}")]
    ParseDerError(#[from] nom::Err<X509Error>),
    #[error("{0} trailing byte(s) after the certificate")]
    TrailingData(usize),
}

/// Errors that can occur when loading an [`IdentityStore`](crate::IdentityStore).
#[derive(Error, Debug)]
pub enum KeystoreError {
    #[error("keystore path may not be blank")]
    BlankPath,
    #[error("keystore password may not be blank")]
    BlankPassword,
    #[error("keystore file `{0}` does not exist")]
    FileNotFound(PathBuf),
    #[error("failed to read keystore file `{path}`: {error}")]
    ReadFileError {
        #[source]
        error: io::Error,
        path: PathBuf,
    },
    #[error("unsupported keystore format `{0}`")]
    UnsupportedFormat(String),
    #[error("wrong password for keystore `{0}`")]
    WrongPassword(PathBuf),
    #[error("keystore `{path}` is not a valid PKCS#12 file: {error}")]
    InvalidPkcs12 {
        #[source]
        error: p12_keystore::error::Error,
        path: PathBuf,
    },
    #[error("failed to parse PEM keystore `{path}`: {error}")]
    InvalidPem {
        #[source]
        error: io::Error,
        path: PathBuf,
    },
    #[error("keystore `{path}` contains an invalid certificate: {error}")]
    InvalidCertificate {
        #[source]
        error: CertificateDecodeError,
        path: PathBuf,
    },
    #[error("no certificate was found in keystore `{0}`")]
    NoCertFound(PathBuf),
    #[error("no private key was found in keystore `{0}`")]
    NoKeyFound(PathBuf),
    #[error("multiple private keys were found in PEM keystore `{0}`")]
    MultipleKeysFound(PathBuf),
}

impl KeystoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BlankPath | Self::BlankPassword => ErrorKind::InvalidArgument,
            Self::FileNotFound(..) | Self::ReadFileError { .. } => ErrorKind::NotFound,
            Self::WrongPassword(..) => ErrorKind::AuthenticationFailure,
            Self::UnsupportedFormat(..)
            | Self::InvalidPkcs12 { .. }
            | Self::InvalidPem { .. }
            | Self::InvalidCertificate { .. }
            | Self::NoCertFound(..)
            | Self::NoKeyFound(..)
            | Self::MultipleKeysFound(..) => ErrorKind::MalformedInput,
        }
    }
}

/// Errors that can occur when assembling a [`TlsContext`](crate::TlsContext).
#[derive(Error, Debug)]
pub enum AssembleError {
    #[error("identity keystore password may not be blank")]
    BlankIdentityPassword,
    #[error("certificate `{label}` was rejected as a trust anchor: {error}")]
    InvalidTrustAnchor {
        #[source]
        error: rustls::Error,
        label: String,
    },
    #[error("failed to recover identity keys: {0}")]
    KeyRecovery(#[source] KeystoreError),
    #[error("private key of identity `{alias}` could not be loaded: {error}")]
    InvalidIdentityKey {
        #[source]
        error: rustls::Error,
        alias: String,
    },
    #[error("crypto provider does not support the default protocol versions: {0}")]
    ProtocolVersions(#[source] rustls::Error),
    #[error("crypto provider random source failed: {0}")]
    RandomSource(#[source] rustls::Error),
    #[error("failed to build client verifier: {0}")]
    VerifierBuildError(#[from] rustls::server::VerifierBuilderError),
}

impl AssembleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BlankIdentityPassword => ErrorKind::InvalidArgument,
            Self::InvalidTrustAnchor { .. }
            | Self::KeyRecovery(..)
            | Self::InvalidIdentityKey { .. }
            | Self::ProtocolVersions(..)
            | Self::RandomSource(..)
            | Self::VerifierBuildError(..) => ErrorKind::InitializationFailure,
        }
    }
}
