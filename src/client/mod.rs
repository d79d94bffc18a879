//! HTTP client for the local Percy CLI API.
//!
//! SDKs use [`PercyClient`] to find out whether Percy is running, wait for it
//! to go idle, fetch the DOM serialisation script and post snapshots. Once the
//! CLI reports itself healthy the client also connects the SDK's [`Logger`]
//! to the CLI's log collector.

mod backoff;
pub mod config;
mod query;
mod response;
mod version;

use std::error::Error as StdError;
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use log::warn;
use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;
use ureq::{Agent, AgentBuilder};

use crate::{
    bridge::{RemoteSocket, Teardown, WsSocket},
    logger::Logger,
};

use backoff::BackoffState;
pub use config::{BackoffPolicy, ClientConfig};
pub use response::PercyResponse;
pub use version::CoreVersion;

/// Namespace the client logs its own messages under.
pub const CLIENT_NAMESPACE: &str = "utils";

/// Errors returned by [`PercyClient`] requests.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Response {
        message: String,
        response: Box<PercyResponse>,
    },
    /// No response was received.
    #[error("request failed: {message}")]
    Transport { message: String, retryable: bool },
    #[error("invalid server address `{0}`")]
    InvalidAddress(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ClientError {
    /// The response that caused the error, if the server answered at all.
    pub fn response(&self) -> Option<&PercyResponse> {
        match self {
            Self::Response { response, .. } => Some(response),
            _ => None,
        }
    }

    fn from_ureq(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(_, response) => match PercyResponse::from_ureq(response) {
                Ok(response) => Self::Response {
                    message: response.error_message(),
                    response: Box::new(response),
                },
                Err(err) => err.into(),
            },
            ureq::Error::Transport(transport) => Self::Transport {
                retryable: is_retryable(&transport),
                message: transport.to_string(),
            },
        }
    }
}

/// Connection resets and timeouts are worth another attempt.
fn is_retryable(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<io::Error>() {
            return matches!(
                io.kind(),
                io::ErrorKind::ConnectionReset | io::ErrorKind::TimedOut
            );
        }
        current = e.source();
    }
    false
}

#[derive(Debug, Default)]
struct ClientState {
    enabled: Option<bool>,
    version: CoreVersion,
    config: Option<Value>,
    dom_script: Option<String>,
}

/// Client for one Percy CLI address.
pub struct PercyClient {
    agent: Agent,
    config: ClientConfig,
    state: Mutex<ClientState>,
    remote: Mutex<Option<Teardown>>,
}

impl PercyClient {
    pub fn new(config: ClientConfig) -> Self {
        let agent = AgentBuilder::new()
            .timeout_connect(config.bridge.connect_timeout)
            .timeout(config.request_timeout)
            .build();
        Self {
            agent,
            config,
            state: Mutex::new(ClientState::default()),
            remote: Mutex::new(None),
        }
    }

    /// Client for the address in `PERCY_SERVER_ADDRESS`.
    pub fn from_env() -> Self {
        Self::new(ClientConfig::from_env())
    }

    pub fn address(&self) -> &str {
        &self.config.address
    }

    /// CLI version from the last successful healthcheck.
    pub fn version(&self) -> CoreVersion {
        self.state.lock().version.clone()
    }

    /// CLI configuration from the last successful healthcheck.
    pub fn cli_config(&self) -> Option<Value> {
        self.state.lock().config.clone()
    }

    /// `None` until [`PercyClient::is_enabled`] has run.
    pub fn enabled(&self) -> Option<bool> {
        self.state.lock().enabled
    }

    /// `GET <address><path>`.
    pub fn request(&self, path: &str) -> Result<PercyResponse, ClientError> {
        let url = format!("{}{path}", self.config.address);
        finish(self.agent.get(&url).call())
    }

    /// `POST <address><path>` with `json` as the body.
    pub fn post(&self, path: &str, json: &Value) -> Result<PercyResponse, ClientError> {
        let url = format!("{}{path}", self.config.address);
        let body = serde_json::to_string(json).map_err(io::Error::from)?;
        finish(
            self.agent
                .post(&url)
                .set("Content-Type", "application/json")
                .send_string(&body),
        )
    }

    /// Whether a supported Percy CLI is running at the configured address.
    ///
    /// The first call runs the healthcheck and, when it succeeds, connects
    /// `logger` to the CLI. Later calls return the cached answer.
    pub fn is_enabled(&self, logger: &Logger) -> bool {
        if let Some(enabled) = self.state.lock().enabled {
            return enabled;
        }

        let log = logger.group(CLIENT_NAMESPACE);
        let enabled = match self.request("/percy/healthcheck") {
            Ok(response) => {
                let version =
                    CoreVersion::parse(response.header("x-percy-core-version").unwrap_or_default());
                let supported = version.major == 1;
                if !supported {
                    log.info("Unsupported Percy CLI version, disabling snapshots");
                    log.debug(format!("Found version: {version}"));
                }
                let mut state = self.state.lock();
                state.version = version;
                state.config = response.body.get("config").cloned();
                supported
            }
            Err(err) => {
                log.info("Percy is not running, disabling snapshots");
                log.debug(err.to_string());
                false
            }
        };
        self.state.lock().enabled = Some(enabled);

        if enabled {
            if let Err(err) = self.connect_remote_logger(logger) {
                log.debug(err.to_string());
            }
        }
        enabled
    }

    /// Block until the CLI reports it is idle.
    ///
    /// Dropped connections and timeouts are retried with jittered backoff
    /// until the retry deadline; any other failure returns `false`.
    pub fn wait_for_idle(&self) -> bool {
        let mut backoff = BackoffState::new(self.config.idle_retry.clone());
        loop {
            match self.request("/percy/idle") {
                Ok(_) => return true,
                Err(ClientError::Transport {
                    retryable: true,
                    message,
                }) => match backoff.next_sleep(Instant::now()) {
                    Some(delay) => {
                        warn!("PercyClient idle check failed, retrying: {message}");
                        thread::sleep(delay);
                    }
                    None => return false,
                },
                Err(_) => return false,
            }
        }
    }

    /// The DOM serialisation script, fetched once and cached.
    pub fn fetch_dom(&self) -> Result<String, ClientError> {
        if let Some(script) = self.state.lock().dom_script.clone() {
            return Ok(script);
        }
        let script = self.request("/percy/dom.js")?.text();
        self.state.lock().dom_script = Some(script.clone());
        Ok(script)
    }

    /// Post a snapshot, with `params` appended as a query string.
    ///
    /// A failure whose body carries `build.error` means the build has failed
    /// server side; the client disables itself and returns `Ok`.
    pub fn post_snapshot<K, V>(&self, options: &Value, params: &[(K, V)]) -> Result<(), ClientError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let path = if params.is_empty() {
            "/percy/snapshot".to_owned()
        } else {
            format!("/percy/snapshot?{}", query::form_urlencode(params))
        };
        match self.post(&path, options) {
            Ok(_) => Ok(()),
            Err(err) if has_build_error(&err) => {
                self.state.lock().enabled = Some(false);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Forward `logger` to the CLI's log collector.
    ///
    /// A failed connection is not an error: the logger logs it at debug and
    /// stays local. Only an unparsable address is reported.
    pub fn connect_remote_logger(&self, logger: &Logger) -> Result<(), ClientError> {
        let (host, port) = host_port(&self.config.address)
            .ok_or_else(|| ClientError::InvalidAddress(self.config.address.clone()))?;
        let bridge = self.config.bridge.clone();
        let timeout = bridge.connect_timeout;
        let teardown = logger.connect_as_client(
            move || {
                WsSocket::connect(&host, port, &bridge)
                    .map(|socket| Arc::new(socket) as Arc<dyn RemoteSocket>)
            },
            timeout,
        );
        if let Some(teardown) = teardown {
            if let Some(previous) = self.remote.lock().replace(teardown) {
                previous.run();
            }
        }
        Ok(())
    }

    /// Detach a logger connected by [`PercyClient::connect_remote_logger`].
    pub fn disconnect_remote_logger(&self) {
        if let Some(teardown) = self.remote.lock().take() {
            teardown.run();
        }
    }
}

impl std::fmt::Debug for PercyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PercyClient")
            .field("address", &self.config.address)
            .field("enabled", &self.state.lock().enabled)
            .finish()
    }
}

fn finish(result: Result<ureq::Response, ureq::Error>) -> Result<PercyResponse, ClientError> {
    let response = PercyResponse::from_ureq(result.map_err(ClientError::from_ureq)?)?;
    if response.is_success() {
        Ok(response)
    } else {
        Err(ClientError::Response {
            message: response.error_message(),
            response: Box::new(response),
        })
    }
}

fn has_build_error(err: &ClientError) -> bool {
    err.response()
        .and_then(|r| r.body.get("build"))
        .and_then(|build| build.get("error"))
        .is_some_and(|e| !e.is_null() && e != &Value::Bool(false))
}

/// Host and port of an `http(s)://host[:port][/path]` address.
fn host_port(address: &str) -> Option<(String, u16)> {
    let (rest, default_port) = if let Some(rest) = address.strip_prefix("https://") {
        (rest, 443)
    } else if let Some(rest) = address.strip_prefix("http://") {
        (rest, 80)
    } else {
        return None;
    };
    let authority = rest.split(['/', '?', '#']).next()?;
    if authority.is_empty() {
        return None;
    }
    if let Some(bracketed) = authority.strip_prefix('[') {
        let (host, tail) = bracketed.split_once(']')?;
        let port = match tail.strip_prefix(':') {
            Some(port) => port.parse().ok()?,
            None => default_port,
        };
        return Some((host.to_owned(), port));
    }
    match authority.rsplit_once(':') {
        Some((host, port)) => Some((host.to_owned(), port.parse().ok()?)),
        None => Some((authority.to_owned(), default_port)),
    }
}
