//! Imported certificates.

use super::Entry;
use crate::location::{Family, Kind};
use serde::{Deserialize, Serialize};

/// A certificate as the device reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub public_key: String,
    /// Device-encrypted private key
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub private_key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub format: String,
}

impl Entry for Certificate {
    const KIND: Kind = Kind::Certificate;
    const FAMILY: Family = Family::DeviceConfig;

    fn name(&self) -> &str {
        &self.name
    }

    // Certificates are only ever re-imported, never edited.
    fn copy_from(&mut self, _other: &Self) {}
}

/// Certificate material to import. The two formats are exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateImport {
    /// PEM certificate with an optional PEM private key
    Pem {
        certificate: String,
        private_key: String,
        passphrase: String,
    },
    /// PKCS#12 bundle
    Pkcs12 {
        certificate: String,
        passphrase: String,
    },
}

impl CertificateImport {
    /// Format name as the device reports it.
    pub fn format(&self) -> &'static str {
        match self {
            Self::Pem { .. } => "pem",
            Self::Pkcs12 { .. } => "pkcs12",
        }
    }

    /// Passphrase protecting the private key.
    pub fn passphrase(&self) -> &str {
        match self {
            Self::Pem { passphrase, .. } | Self::Pkcs12 { passphrase, .. } => passphrase,
        }
    }
}
