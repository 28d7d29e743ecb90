//! Shared HTTP plumbing for OpenAI-compatible endpoints.

use reqwest::{Certificate, Client, Response};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

use crate::config;
use crate::types::{MemoryError, Result};

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Build an HTTP client that also trusts the bundle named by `SSL_CERT_FILE`
/// when that file exists.
pub fn build_client() -> Result<Client> {
    build_client_with_roots(&config::ssl_cert_file())
}

/// Build an HTTP client that adds every certificate in `cert_path` to the
/// default trust roots
pub fn build_client_with_roots(cert_path: &Path) -> Result<Client> {
    let mut builder = Client::builder();

    for cert in load_root_certificates(cert_path) {
        builder = builder.add_root_certificate(cert);
    }

    Ok(builder.build()?)
}

/// Read a PEM bundle. A missing or unreadable bundle yields no certificates.
pub fn load_root_certificates(cert_path: &Path) -> Vec<Certificate> {
    if !cert_path.is_file() {
        debug!("No CA bundle at {}", cert_path.display());
        return Vec::new();
    }

    let pem = match std::fs::read(cert_path) {
        Ok(pem) => pem,
        Err(e) => {
            warn!("Could not read CA bundle {}: {}", cert_path.display(), e);
            return Vec::new();
        }
    };

    match Certificate::from_pem_bundle(&pem) {
        Ok(certs) => {
            debug!(
                "Adding {} root certificates from {}",
                certs.len(),
                cert_path.display()
            );
            certs
        }
        Err(e) => {
            warn!("Ignoring unreadable CA bundle {}: {}", cert_path.display(), e);
            Vec::new()
        }
    }
}

/// Join a base URL and an endpoint path without doubling slashes
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Read the body of a response, turning non-success statuses into
/// `MemoryError::Api`.
pub async fn read_body(response: Response) -> Result<String> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(error) => error.error.message,
            Err(_) => body,
        };
        return Err(MemoryError::Api {
            status: status.as_u16(),
            message,
        });
    }

    Ok(body)
}
