//! TLS policy of the leasing-service client.

use std::fs;
use std::path::{Path, PathBuf};

use reqwest::blocking::Client;
use reqwest::Certificate;

use crate::config::LeasingServiceOptions;
use crate::store::StoreError;

/// Certificate verification applied to the leasing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyMode {
    /// Accept any certificate (self-signed services).
    None,
    /// Verify the peer against the trusted roots.
    Peer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPolicy {
    pub verify: VerifyMode,
    /// Extra CA bundle in PEM format.
    pub ca_file: Option<PathBuf>,
}

impl TlsPolicy {
    pub fn from_options(options: &LeasingServiceOptions) -> Self {
        let verify = if options.allow_self_signed || !options.ssl_verify {
            VerifyMode::None
        } else {
            VerifyMode::Peer
        };
        let ca_file = options
            .ssl_cert
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(expand_home);

        Self { verify, ca_file }
    }

    /// Build a blocking client applying this policy.
    pub fn build_client(&self) -> Result<Client, StoreError> {
        let mut builder = Client::builder();

        if self.verify == VerifyMode::None {
            tracing::debug!("TLS certificate verification disabled for the leasing service");
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(path) = &self.ca_file {
            let pem = fs::read(path).map_err(|e| StoreError::io(path, e))?;
            let cert = Certificate::from_pem(&pem).map_err(|e| {
                StoreError::Tls(format!("invalid CA bundle '{}': {}", path.display(), e))
            })?;
            builder = builder.add_root_certificate(cert);
        }

        builder
            .build()
            .map_err(|e| StoreError::Tls(format!("failed to build HTTP client: {}", e)))
    }
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| Path::new(path).to_path_buf()),
        None => PathBuf::from(path),
    }
}
