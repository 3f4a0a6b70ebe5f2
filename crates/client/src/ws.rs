//! Reconnecting WebSocket RPC session.
//!
//! One session per chain. The session owns a list of candidate endpoints
//! (from a comma-separated URL list), dials the first non-blacklisted
//! one, and rotates on reconnect. Callers serialize through the session
//! lock, so requests on one chain never interleave on the wire.

use crate::endpoint::{ChainTag, EndpointHealth, FailureArbiter};
use crate::error::ClientError;
use jsonrpsee::core::client::{ClientT, Error as RpcError};
use jsonrpsee::core::params::ArrayParams;
use jsonrpsee::ws_client::{WsClient, WsClientBuilder};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Transparent reconnect attempts per request before `Transport` surfaces.
const RECONNECT_ATTEMPTS: u32 = 3;

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection establishment timeout.
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

struct Endpoint {
    url: String,
    health: Arc<EndpointHealth>,
}

struct Session {
    client: Option<Arc<WsClient>>,
    active: usize,
}

/// A persistent WebSocket RPC session over one of several endpoints.
pub struct WsSession {
    chain: ChainTag,
    endpoints: Vec<Endpoint>,
    session: Mutex<Session>,
}

impl WsSession {
    /// Build a session over the given endpoint URLs, registering each
    /// with the failure arbiter.
    pub fn new(chain: ChainTag, urls: &[String], arbiter: &FailureArbiter) -> Self {
        let endpoints = urls
            .iter()
            .map(|url| Endpoint {
                url: url.clone(),
                health: arbiter.register(chain, url),
            })
            .collect();
        Self {
            chain,
            endpoints,
            session: Mutex::new(Session {
                client: None,
                active: 0,
            }),
        }
    }

    /// Chain this session serves.
    pub fn chain(&self) -> ChainTag {
        self.chain
    }

    /// URL of the endpoint the session is currently pinned to.
    pub async fn current_url(&self) -> String {
        let session = self.session.lock().await;
        self.endpoints[session.active].url.clone()
    }

    /// Drop the current connection; the next request redials, preferring
    /// a different endpoint when more than one is configured.
    pub async fn force_reconnect(&self) {
        let mut session = self.session.lock().await;
        if session.client.take().is_some() {
            info!(chain = ?self.chain, "connection dropped for forced reconnect");
        }
        if self.endpoints.len() > 1 {
            session.active = (session.active + 1) % self.endpoints.len();
        }
    }

    /// One-shot RPC with transparent reconnection.
    pub async fn request<R: DeserializeOwned>(
        &self,
        method: &str,
        params: ArrayParams,
    ) -> Result<R, ClientError> {
        let mut session = self.session.lock().await;
        let mut attempts = 0u32;

        loop {
            let endpoint = &self.endpoints[session.active];
            if let Some(remaining) = endpoint.health.blacklist_remaining() {
                // Another endpoint may still be healthy; try to move off
                // the blacklisted one before failing fast.
                if !self.rotate_to_healthy(&mut session) {
                    return Err(ClientError::Blacklisted {
                        url: endpoint.url.clone(),
                        remaining_secs: remaining.as_secs(),
                    });
                }
                continue;
            }

            if session.client.is_none() {
                let endpoint = &self.endpoints[session.active];
                match Self::connect(&endpoint.url).await {
                    Ok(client) => {
                        info!(chain = ?self.chain, url = %endpoint.url, "connected");
                        session.client = Some(Arc::new(client));
                    }
                    Err(e) => {
                        endpoint.health.record_failure();
                        attempts += 1;
                        if attempts > RECONNECT_ATTEMPTS {
                            return Err(e);
                        }
                        continue;
                    }
                }
            }

            let client = session.client.clone().expect("connected above");
            match client.request::<R, _>(method, params.clone()).await {
                Ok(value) => {
                    self.endpoints[session.active].health.record_success();
                    return Ok(value);
                }
                Err(RpcError::Call(object)) => {
                    // The node answered; the endpoint is healthy even if
                    // the call itself failed.
                    self.endpoints[session.active].health.record_success();
                    return Err(ClientError::Rpc(object.to_string()));
                }
                Err(e) => {
                    debug!(chain = ?self.chain, method, error = %e, "transport failure");
                    self.endpoints[session.active].health.record_failure();
                    session.client = None;
                    attempts += 1;
                    if attempts > RECONNECT_ATTEMPTS {
                        return Err(ClientError::Transport(e.to_string()));
                    }
                }
            }
        }
    }

    async fn connect(url: &str) -> Result<WsClient, ClientError> {
        WsClientBuilder::default()
            .request_timeout(REQUEST_TIMEOUT)
            .connection_timeout(CONNECTION_TIMEOUT)
            .build(url)
            .await
            .map_err(|e| {
                warn!(url, error = %e, "failed to connect");
                ClientError::Transport(e.to_string())
            })
    }

    /// Switch to the first non-blacklisted endpoint, if any. Returns
    /// false when every other endpoint is cooling down too.
    fn rotate_to_healthy(&self, session: &mut Session) -> bool {
        for offset in 1..self.endpoints.len() {
            let candidate = (session.active + offset) % self.endpoints.len();
            if !self.endpoints[candidate].health.is_blacklisted() {
                info!(
                    chain = ?self.chain,
                    url = %self.endpoints[candidate].url,
                    "rotating to healthy endpoint"
                );
                session.active = candidate;
                session.client = None;
                return true;
            }
        }
        false
    }
}
