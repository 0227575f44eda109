use std::fmt;

use rustls::pki_types::CertificateDer;
use x509_parser::parse_x509_certificate;

use crate::error::CertificateDecodeError;

/// A single X.509 certificate that was successfully parsed.
///
/// Holds the original DER bytes, plus a few fields extracted for diagnostics. Can only be
/// created from DER that parses as exactly one certificate.
#[derive(Clone, PartialEq, Eq)]
pub struct ParsedCertificate {
    der: CertificateDer<'static>,
    subject: String,
    issuer: String,
    serial: String,
    is_ca: bool,
}

impl ParsedCertificate {
    /// Parses the given DER bytes as one X.509 certificate.
    ///
    /// Trailing bytes after the certificate are rejected.
    pub fn from_der(der: impl Into<Vec<u8>>) -> Result<Self, CertificateDecodeError> {
        let der = CertificateDer::from(der.into());

        let (subject, issuer, serial, is_ca) = {
            let (rest, cert) = parse_x509_certificate(der.as_ref())?;
            if !rest.is_empty() {
                return Err(CertificateDecodeError::TrailingData(rest.len()));
            }

            (
                cert.subject().to_string(),
                cert.issuer().to_string(),
                cert.raw_serial_as_string(),
                cert.is_ca(),
            )
        };

        Ok(Self {
            der,
            subject,
            issuer,
            serial,
            is_ca,
        })
    }

    pub fn der(&self) -> &CertificateDer<'static> {
        &self.der
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Serial number as colon separated hex.
    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn is_ca(&self) -> bool {
        self.is_ca
    }

    pub fn into_der(self) -> CertificateDer<'static> {
        self.der
    }
}

impl fmt::Debug for ParsedCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsedCertificate")
            .field("subject", &self.subject)
            .field("issuer", &self.issuer)
            .field("serial", &self.serial)
            .field("is_ca", &self.is_ca)
            .finish()
    }
}

impl TryFrom<CertificateDer<'_>> for ParsedCertificate {
    type Error = CertificateDecodeError;

    fn try_from(der: CertificateDer<'_>) -> Result<Self, Self::Error> {
        Self::from_der(der.as_ref())
    }
}
