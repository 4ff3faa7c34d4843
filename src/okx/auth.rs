//! Authentication utilities for the OKX v5 API

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::common::errors::{ClientError, Result};
use crate::config::types::ApiCredentials;

type HmacSha256 = Hmac<Sha256>;

/// Generate the HMAC-SHA256 signature OKX expects in `OK-ACCESS-SIGN`
///
/// # Arguments
/// * `secret` - API secret key (used as raw bytes)
/// * `timestamp` - ISO-8601 UTC timestamp with milliseconds
/// * `method` - HTTP method (GET, POST, etc.)
/// * `request_path` - API endpoint path including any query string
/// * `body` - Request body (empty string for GET requests)
pub fn sign_request(
    secret: &str,
    timestamp: &str,
    method: &str,
    request_path: &str,
    body: &str,
) -> Result<String> {
    let message = format!("{}{}{}{}", timestamp, method.to_uppercase(), request_path, body);

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ClientError::Authentication(format!("Failed to create HMAC: {}", e)))?;
    mac.update(message.as_bytes());
    let result = mac.finalize();

    Ok(BASE64.encode(result.into_bytes()))
}

/// Format a timestamp the way OKX wants it: `2020-12-08T09:08:57.715Z`
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Generate authentication headers for one request
pub fn generate_auth_headers(
    credentials: &ApiCredentials,
    simulated: bool,
    method: &str,
    request_path: &str,
    body: &str,
) -> Result<AuthHeaders> {
    let timestamp = format_timestamp(Utc::now());
    let signature = sign_request(
        &credentials.api_secret,
        &timestamp,
        method,
        request_path,
        body,
    )?;

    Ok(AuthHeaders {
        api_key: credentials.api_key.clone(),
        signature,
        timestamp,
        passphrase: credentials.passphrase.clone(),
        simulated,
    })
}

/// Authentication headers for API requests
#[derive(Debug, Clone)]
pub struct AuthHeaders {
    pub api_key: String,
    pub signature: String,
    pub timestamp: String,
    pub passphrase: String,
    /// Adds `x-simulated-trading: 1` for the demo environment
    pub simulated: bool,
}

impl AuthHeaders {
    /// Add authentication headers to a reqwest RequestBuilder
    pub fn apply_to_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request
            .header("OK-ACCESS-KEY", &self.api_key)
            .header("OK-ACCESS-SIGN", &self.signature)
            .header("OK-ACCESS-TIMESTAMP", &self.timestamp)
            .header("OK-ACCESS-PASSPHRASE", &self.passphrase)
            .header("Content-Type", "application/json");
        if self.simulated {
            request.header("x-simulated-trading", "1")
        } else {
            request
        }
    }
}
