// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! AWS Signature Version 4 request signing.
//!
//! ```text
//! canonical request = METHOD \n URI \n QUERY \n HEADERS \n SIGNED \n sha256(payload)
//! string to sign    = AWS4-HMAC-SHA256 \n amz-date \n scope \n sha256(canonical request)
//! signing key       = HMAC chain over date, region, service, "aws4_request"
//! ```
//!
//! Only what the connections API needs is covered: no query strings and a
//! fixed set of signed headers.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::credentials::Credentials;
use crate::error::{Result, WebsocketError};

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
pub const AMZ_DATE_HEADER: &str = "x-amz-date";
pub const SECURITY_TOKEN_HEADER: &str = "x-amz-security-token";
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// The parts of a request covered by the signature.
#[derive(Debug, Clone, Copy)]
pub struct RequestToSign<'a> {
    pub method: &'a str,
    /// Value of the `Host` header, port included when non-default
    pub host: &'a str,
    /// Request path as sent, before canonical encoding
    pub path: &'a str,
    pub payload: &'a [u8],
}

/// Signs requests for one service in one region.
#[derive(Debug, Clone)]
pub struct Signer {
    credentials: Credentials,
    region: String,
    service: String,
}

impl Signer {
    pub fn new(
        credentials: Credentials,
        region: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            region: region.into(),
            service: service.into(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Headers to add to the request so it carries a valid signature at `time`.
    pub fn sign(
        &self,
        request: &RequestToSign<'_>,
        time: DateTime<Utc>,
    ) -> Result<Vec<(&'static str, String)>> {
        let amz_date = time.format("%Y%m%dT%H%M%SZ").to_string();
        let date = time.format("%Y%m%d").to_string();

        let mut headers = vec![("host", request.host.trim().to_string())];
        headers.push((AMZ_DATE_HEADER, amz_date.clone()));
        if let Some(token) = self.credentials.session_token() {
            headers.push((SECURITY_TOKEN_HEADER, token.to_string()));
        }
        headers.sort_by(|a, b| a.0.cmp(b.0));

        let canonical_headers: String = headers
            .iter()
            .map(|(name, value)| format!("{name}:{value}\n"))
            .collect();
        let signed_headers = headers
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(";");

        let canonical_request = format!(
            "{}\n{}\n\n{}\n{}\n{}",
            request.method,
            canonical_uri(request.path),
            canonical_headers,
            signed_headers,
            sha256_hex(request.payload),
        );

        let scope = format!("{date}/{}/{}/aws4_request", self.region, self.service);
        let string_to_sign = format!(
            "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
            sha256_hex(canonical_request.as_bytes())
        );

        let signature = hex::encode(hmac_sha256(
            &self.signing_key(&date)?,
            string_to_sign.as_bytes(),
        )?);

        let authorization = format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            self.credentials.access_key_id()
        );

        let mut added = vec![(AMZ_DATE_HEADER, amz_date), (AUTHORIZATION_HEADER, authorization)];
        if let Some(token) = self.credentials.session_token() {
            added.push((SECURITY_TOKEN_HEADER, token.to_string()));
        }
        Ok(added)
    }

    fn signing_key(&self, date: &str) -> Result<Vec<u8>> {
        let secret = format!("AWS4{}", self.credentials.secret_access_key());
        let key = hmac_sha256(secret.as_bytes(), date.as_bytes())?;
        let key = hmac_sha256(&key, self.region.as_bytes())?;
        let key = hmac_sha256(&key, self.service.as_bytes())?;
        hmac_sha256(&key, b"aws4_request")
    }
}

/// Each path segment URI-encoded, `/` separators kept.
pub fn canonical_uri(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .map_err(|e| WebsocketError::Config(format!("invalid signing key: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}
