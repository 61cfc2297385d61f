//! Bridge daemon HTTP client.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::provider::{EventStream, Provider};
use crate::sse::subscribe;
use crate::types::{
    DownloadMediaParams, GroupMetadata, MediaResponse, OutgoingContent, PairingCodeParams,
    PairingCodeResponse, SendMessageParams, SendReceipt, SessionParams, WireMessage,
};

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Serialize)]
struct RpcRequest<'a, T: Serialize> {
    jsonrpc: &'static str,
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<T>,
    id: u64,
}

/// JSON-RPC 2.0 response structure.
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    #[allow(dead_code)]
    jsonrpc: String,
    result: Option<T>,
    error: Option<RpcError>,
    #[allow(dead_code)]
    id: u64,
}

/// JSON-RPC 2.0 error.
#[derive(Debug, Deserialize)]
struct RpcError {
    code: i32,
    message: String,
}

/// Client for communicating with the bridge daemon.
///
/// The bridge keys sessions by auth directory; the client remembers the
/// directory passed to the last [`Provider::connect`] and uses it for every
/// subsequent call.
#[derive(Clone)]
pub struct BridgeClient {
    http: Client,
    config: BridgeConfig,
    request_id: Arc<AtomicU64>,
    session: Arc<RwLock<Option<String>>>,
}

impl BridgeClient {
    /// Create a client. No connection is made until [`Provider::connect`].
    pub fn new(config: BridgeConfig) -> Result<Self, BridgeError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(BridgeError::Http)?;

        Ok(Self {
            http,
            config,
            request_id: Arc::new(AtomicU64::new(1)),
            session: Arc::new(RwLock::new(None)),
        })
    }

    /// Perform a health check against the daemon.
    pub async fn health_check(&self) -> Result<bool, BridgeError> {
        let url = self.config.check_url();
        debug!("Health check: {}", url);

        let resp = self.http.get(&url).send().await?;
        Ok(resp.status().is_success())
    }

    /// Get the configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    async fn session(&self) -> Result<String, BridgeError> {
        self.session
            .read()
            .await
            .clone()
            .ok_or(BridgeError::NotConnected)
    }

    /// Make a JSON-RPC call to the daemon.
    async fn rpc_call<P: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: Option<P>,
    ) -> Result<R, BridgeError> {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        let url = self.config.rpc_url();

        let request = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };

        debug!("RPC call: {} (id={})", method, id);

        let response = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BridgeError::Connection(format!("HTTP {}: {}", status, body)));
        }

        let rpc_response: RpcResponse<R> = response.json().await?;

        if let Some(error) = rpc_response.error {
            return Err(BridgeError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        rpc_response.result.ok_or_else(|| BridgeError::Rpc {
            code: -1,
            message: "No result in response".to_string(),
        })
    }
}

#[async_trait]
impl Provider for BridgeClient {
    async fn connect(&self, auth_dir: &Path) -> Result<EventStream, BridgeError> {
        let auth = auth_dir.to_string_lossy().into_owned();
        let _: serde_json::Value = self
            .rpc_call("connect", Some(SessionParams { auth: auth.clone() }))
            .await?;
        *self.session.write().await = Some(auth.clone());

        info!("Session started at {} for {}", self.config.base_url, auth);
        let stream = subscribe(&self.config, &auth)?;
        Ok(Box::pin(stream))
    }

    async fn request_pairing_code(&self, phone: &str) -> Result<String, BridgeError> {
        let params = PairingCodeParams {
            auth: self.session().await?,
            phone_number: phone.to_string(),
        };
        let resp: PairingCodeResponse = self.rpc_call("requestPairingCode", Some(params)).await?;
        Ok(resp.code)
    }

    async fn send_message(
        &self,
        jid: &str,
        content: OutgoingContent,
    ) -> Result<SendReceipt, BridgeError> {
        let kind = content.kind();
        let params = SendMessageParams {
            auth: self.session().await?,
            jid: jid.to_string(),
            content,
        };
        debug!("Sending {} message to {}", kind, jid);
        self.rpc_call("sendMessage", Some(params))
            .await
            .map_err(|e| match e {
                BridgeError::Rpc { message, .. } => BridgeError::SendFailed(message),
                other => other,
            })
    }

    async fn fetch_groups(&self) -> Result<Vec<GroupMetadata>, BridgeError> {
        let params = SessionParams {
            auth: self.session().await?,
        };
        let groups: HashMap<String, GroupMetadata> = self
            .rpc_call("groupFetchAllParticipating", Some(params))
            .await?;
        Ok(groups.into_values().collect())
    }

    async fn download_media(&self, message: &WireMessage) -> Result<Vec<u8>, BridgeError> {
        let params = DownloadMediaParams {
            auth: self.session().await?,
            message: message.clone(),
        };
        let resp: MediaResponse = self
            .rpc_call("downloadMediaMessage", Some(params))
            .await
            .map_err(|e| BridgeError::Media(e.to_string()))?;
        base64::engine::general_purpose::STANDARD
            .decode(resp.base64.as_bytes())
            .map_err(|e| BridgeError::Media(e.to_string()))
    }

    async fn end(&self) -> Result<(), BridgeError> {
        let Some(auth) = self.session.write().await.take() else {
            return Ok(());
        };
        let _: serde_json::Value = self.rpc_call("end", Some(SessionParams { auth })).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "bridge"
    }
}

impl std::fmt::Debug for BridgeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeClient")
            .field("config", &self.config)
            .finish()
    }
}
