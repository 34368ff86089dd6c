// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Blocking client for the managed connections API.
//!
//! ```text
//! POST   /{stage}/@connections/{id}   send a message
//! GET    /{stage}/@connections/{id}   connection status
//! DELETE /{stage}/@connections/{id}   close the connection
//! ```

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;
use urlencoding::encode;

use crate::credentials::Credentials;
use crate::error::{Result, WebsocketError};
use crate::signing::{RequestToSign, Signer};

const SERVICE: &str = "execute-api";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// State of a live connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub connected_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    pub identity: ConnectionIdentity,
}

/// Who opened the connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionIdentity {
    pub source_ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Talks to the clients connected to one websocket API stage.
#[derive(Debug, Clone)]
pub struct ConnectionsClient {
    endpoint: Url,
    stage: String,
    signer: Signer,
    timeout: Duration,
    agent: ureq::Agent,
}

impl ConnectionsClient {
    /// Client for `https://{api_id}.execute-api.{region}.amazonaws.com/{stage}`.
    pub fn new(
        api_id: &str,
        region: &str,
        stage: &str,
        credentials: Credentials,
    ) -> Result<Self> {
        if api_id.is_empty() || region.is_empty() || stage.is_empty() {
            return Err(WebsocketError::Config(
                "api id, region and stage must not be empty".to_string(),
            ));
        }

        let endpoint = Url::parse(&format!("https://{api_id}.{SERVICE}.{region}.amazonaws.com"))?;
        Ok(Self {
            endpoint,
            stage: stage.to_string(),
            signer: Signer::new(credentials, region, SERVICE),
            timeout: DEFAULT_TIMEOUT,
            agent: build_agent(DEFAULT_TIMEOUT),
        })
    }

    /// Send requests to another base URL instead.
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint)?;
        if endpoint.host_str().is_none() {
            return Err(WebsocketError::Config(format!(
                "endpoint '{endpoint}' has no host"
            )));
        }
        self.endpoint = endpoint;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.agent = build_agent(timeout);
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Push `body` to a connected client.
    #[instrument(skip(self, body), fields(stage = %self.stage))]
    pub fn message(&self, connection_id: &str, body: impl AsRef<[u8]>) -> Result<()> {
        self.send("POST", connection_id, body.as_ref())?;
        Ok(())
    }

    /// Look up when the connection was opened and last used.
    #[instrument(skip(self), fields(stage = %self.stage))]
    pub fn status(&self, connection_id: &str) -> Result<ConnectionStatus> {
        let response = self.send("GET", connection_id, &[])?;
        let body = response
            .into_string()
            .map_err(|e| WebsocketError::Transport(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| WebsocketError::InvalidResponse(e.to_string()))
    }

    /// Close the connection from the server side.
    #[instrument(skip(self), fields(stage = %self.stage))]
    pub fn disconnect(&self, connection_id: &str) -> Result<()> {
        self.send("DELETE", connection_id, &[])?;
        Ok(())
    }

    /// URL of one connection's resource.
    pub fn connection_url(&self, connection_id: &str) -> Url {
        let mut url = self.endpoint.clone();
        let base = self.endpoint.path().trim_end_matches('/');
        url.set_path(&format!(
            "{base}/{}/@connections/{}",
            encode(&self.stage),
            encode(connection_id)
        ));
        url
    }

    fn send(&self, method: &str, connection_id: &str, body: &[u8]) -> Result<ureq::Response> {
        let url = self.connection_url(connection_id);
        let host = host_header(&url)?;
        let signed = self.signer.sign(
            &RequestToSign {
                method,
                host: &host,
                path: url.path(),
                payload: body,
            },
            Utc::now(),
        )?;

        debug!(method, url = %url, "Calling connections API");

        let mut request = self.agent.request_url(method, &url);
        for (name, value) in &signed {
            request = request.set(name, value);
        }

        let result = if method == "POST" {
            request.send_bytes(body)
        } else {
            request.call()
        };

        match result {
            Ok(response) => Ok(response),
            Err(ureq::Error::Status(410, _)) => Err(WebsocketError::Gone(connection_id.to_string())),
            Err(ureq::Error::Status(status, response)) => Err(WebsocketError::Http {
                status,
                body: response.into_string().unwrap_or_default(),
            }),
            Err(ureq::Error::Transport(e)) => Err(WebsocketError::Transport(e.to_string())),
        }
    }
}

fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new().timeout(timeout).build()
}

fn host_header(url: &Url) -> Result<String> {
    let host = url
        .host_str()
        .ok_or_else(|| WebsocketError::Config(format!("endpoint '{url}' has no host")))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}
