//! Web configuration file for the scrape endpoint.
//!
//! Uses the YAML layout shared by Prometheus exporters:
//!
//! ```yaml
//! tls_server_config:
//!   cert_file: server.pem
//!   key_file: server-key.pem
//! basic_auth_users:
//!   prometheus: $2y$10$...
//! ```
//!
//! Passwords are bcrypt hashes. Relative certificate paths resolve against the
//! directory holding the configuration file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hyper::header::HeaderValue;
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;
use serde::Deserialize;
use tokio_rustls::TlsAcceptor;
use tracing::debug;

use crate::error::WebConfigError;

/// Parsed `--web.config.file` contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WebConfig {
    /// Serve over TLS when present.
    #[serde(default)]
    pub tls_server_config: Option<TlsServerConfig>,
    /// User name to bcrypt hash. Empty disables authentication.
    #[serde(default)]
    pub basic_auth_users: HashMap<String, String>,
}

/// Server certificate and key, PEM encoded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TlsServerConfig {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
}

impl WebConfig {
    /// Read and validate a configuration file. An empty file enables nothing.
    pub fn load(path: &Path) -> Result<Self, WebConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| WebConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut config: WebConfig =
            serde_yaml::from_str(&content).map_err(|source| WebConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;

        if let Some(tls) = config.tls_server_config.as_mut() {
            let base = path.parent().unwrap_or_else(|| Path::new(""));
            tls.cert_file = base.join(&tls.cert_file);
            tls.key_file = base.join(&tls.key_file);
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), WebConfigError> {
        if let Some(tls) = &self.tls_server_config {
            if tls.cert_file.as_os_str().is_empty() {
                return Err(WebConfigError::Invalid("cert_file is empty".to_string()));
            }
            if tls.key_file.as_os_str().is_empty() {
                return Err(WebConfigError::Invalid("key_file is empty".to_string()));
            }
        }
        if let Some((user, _)) = self
            .basic_auth_users
            .iter()
            .find(|(user, hash)| user.is_empty() || user.contains(':') || hash.is_empty())
        {
            return Err(WebConfigError::Invalid(format!(
                "invalid basic auth entry for user '{}'",
                user
            )));
        }
        Ok(())
    }

    /// Build the TLS acceptor, if TLS is configured.
    pub fn tls_acceptor(&self) -> Result<Option<TlsAcceptor>, WebConfigError> {
        self.tls_server_config
            .as_ref()
            .map(TlsServerConfig::acceptor)
            .transpose()
    }

    /// Build the basic auth checker, if any user is configured.
    pub fn basic_auth(&self) -> Option<BasicAuth> {
        if self.basic_auth_users.is_empty() {
            None
        } else {
            Some(BasicAuth {
                users: self.basic_auth_users.clone(),
            })
        }
    }
}

impl TlsServerConfig {
    fn acceptor(&self) -> Result<TlsAcceptor, WebConfigError> {
        let tls_error = |path: &Path, reason: String| WebConfigError::Tls {
            path: path.display().to_string(),
            reason,
        };

        let certs = CertificateDer::pem_file_iter(&self.cert_file)
            .map_err(|e| tls_error(&self.cert_file, format!("{:?}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| tls_error(&self.cert_file, format!("{:?}", e)))?;
        if certs.is_empty() {
            return Err(tls_error(
                &self.cert_file,
                "no certificate found".to_string(),
            ));
        }

        let key = PrivateKeyDer::from_pem_file(&self.key_file)
            .map_err(|e| tls_error(&self.key_file, format!("{:?}", e)))?;

        let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
        let config = ServerConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .and_then(|builder| builder.with_no_client_auth().with_single_cert(certs, key))
            .map_err(|e| tls_error(&self.cert_file, e.to_string()))?;

        Ok(TlsAcceptor::from(Arc::new(config)))
    }
}

/// Checks `Authorization: Basic` headers against bcrypt hashes.
#[derive(Debug, Clone)]
pub struct BasicAuth {
    users: HashMap<String, String>,
}

impl BasicAuth {
    /// Whether the header carries credentials of a configured user.
    pub fn authorize(&self, header: Option<&HeaderValue>) -> bool {
        let Some(encoded) = header
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Basic "))
        else {
            return false;
        };
        let Some(decoded) = BASE64
            .decode(encoded.trim())
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
        else {
            return false;
        };
        let Some((user, password)) = decoded.split_once(':') else {
            return false;
        };
        let Some(hash) = self.users.get(user) else {
            return false;
        };

        bcrypt::verify(password, hash).unwrap_or_else(|e| {
            debug!(user = user, error = %e, "Invalid bcrypt hash in web config");
            false
        })
    }
}
