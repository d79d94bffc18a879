//! JSON frames exchanged with a remote peer.
//!
//! Every frame is a JSON object carrying any of three keys:
//!
//! - `env`: logging environment of the accepting peer,
//! - `log`: a single forwarded call as `[namespace, level, message, meta]`,
//! - `logAll`: every record logged before the connection opened.

use serde::{Deserialize, Serialize};

use crate::log_record::{LogRecord, Message, Meta};

use super::BridgeError;

/// Environment keys a peer may set. Anything else in an `env` object is
/// ignored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvSync {
    #[serde(rename = "PERCY_DEBUG", default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<String>,
    #[serde(rename = "PERCY_LOGLEVEL", default, skip_serializing_if = "Option::is_none")]
    pub loglevel: Option<String>,
}

impl EnvSync {
    /// Overwrite the keys present in `update`, keeping the rest.
    pub fn merge(&mut self, update: EnvSync) {
        if update.debug.is_some() {
            self.debug = update.debug;
        }
        if update.loglevel.is_some() {
            self.loglevel = update.loglevel;
        }
    }
}

/// A forwarded log call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoteLog(pub String, pub String, pub Message, pub Meta);

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<EnvSync>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<RemoteLog>,
    #[serde(rename = "logAll", default, skip_serializing_if = "Option::is_none")]
    pub log_all: Option<Vec<LogRecord>>,
}

impl Frame {
    pub fn env(env: EnvSync) -> Self {
        Self {
            env: Some(env),
            ..Self::default()
        }
    }

    pub fn log(log: RemoteLog) -> Self {
        Self {
            log: Some(log),
            ..Self::default()
        }
    }

    pub fn log_all(records: Vec<LogRecord>) -> Self {
        Self {
            log_all: Some(records),
            ..Self::default()
        }
    }

    pub fn encode(&self) -> Result<String, BridgeError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(text: &str) -> Result<Self, BridgeError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Copy of `meta` with `remote: true` underneath the caller's own keys.
pub fn tag_remote(meta: Meta) -> Meta {
    let mut tagged = Meta::new();
    tagged.insert("remote".into(), true.into());
    tagged.extend(meta);
    tagged
}
