//! Logger side of the remote bridge.
//!
//! A logger takes one of two roles. As a client it connects to a collector,
//! replays its store, and from then on forwards every call instead of writing
//! it. As a server it accepts a peer, tells it the logging environment, and
//! merges whatever the peer forwards into its own store and output.

use std::sync::{Arc, Weak};
use std::time::Duration;

use log::warn;

use crate::{
    bridge::{
        BridgeError, EnvSync, Frame, RemoteLog, RemoteSocket, Teardown, connect,
        protocol::tag_remote, socket::same_socket,
    },
    level::LogLevel,
    log_record::{LogRecord, Message, Meta},
};

use super::{Inner, LOGGER_NAMESPACE, Logger};

impl Logger {
    /// Return `true` while an open remote connection redirects all calls.
    pub fn is_remote(&self) -> bool {
        self.remote_socket().is_some()
    }

    pub(super) fn remote_socket(&self) -> Option<Arc<dyn RemoteSocket>> {
        self.inner
            .remote
            .lock()
            .as_ref()
            .filter(|s| s.is_open())
            .cloned()
    }

    /// Connect to a remote collector.
    ///
    /// `factory` runs on its own thread and must return an open socket or an
    /// error; if neither arrives within `timeout` the attempt is abandoned.
    /// On failure two debug diagnostics are logged locally and `None` is
    /// returned, leaving the logger in local mode. `None` is also returned,
    /// without connecting, when a connection is already open.
    ///
    /// On success every stored record is replayed to the peer in one `logAll`
    /// frame. `env` frames from the peer are merged into [`Logger::env`] and
    /// applied, so the peer's debug filter or level takes effect here too.
    /// The returned [`Teardown`] detaches the handler and ends remote mode.
    pub fn connect_as_client<F>(&self, factory: F, timeout: Duration) -> Option<Teardown>
    where
        F: FnOnce() -> Result<Arc<dyn RemoteSocket>, BridgeError> + Send + 'static,
    {
        if self.is_remote() {
            return None;
        }

        let socket = match connect::race(factory, timeout) {
            Ok(socket) => socket,
            Err(err) => {
                let group = self.group(LOGGER_NAMESPACE);
                group.debug("Unable to connect to remote logger");
                group.debug(format!("Error: {err}"));
                return None;
            }
        };

        {
            // Another connect may have won while this one was racing.
            let mut slot = self.inner.remote.lock();
            if slot.as_ref().is_some_and(|s| s.is_open()) {
                return None;
            }
            *slot = Some(Arc::clone(&socket));
        }

        let replay: Vec<LogRecord> = {
            let state = self.inner.state.lock();
            state
                .store
                .iter()
                .map(|record| LogRecord {
                    meta: tag_remote(record.meta.clone()),
                    ..LogRecord::clone(record)
                })
                .collect()
        };
        if !replay.is_empty() {
            send_frame(socket.as_ref(), &Frame::log_all(replay));
        }

        let weak = Arc::downgrade(&self.inner);
        socket.set_message_handler(Some(Arc::new(move |text: &str| {
            with_logger(&weak, |logger| logger.handle_client_frame(text));
        })));

        let weak = Arc::downgrade(&self.inner);
        Some(Teardown::new(move || {
            socket.set_message_handler(None);
            if let Some(inner) = weak.upgrade() {
                let mut slot = inner.remote.lock();
                if slot.as_ref().is_some_and(|s| same_socket(s, &socket)) {
                    *slot = None;
                }
            }
        }))
    }

    /// Accept a peer that will forward its logs here.
    ///
    /// Sends the logging environment first, then handles inbound frames:
    /// `logAll` records go straight into the store without being printed,
    /// `log` calls go through the normal logging path marked as remote.
    pub fn accept_as_server(&self, socket: Arc<dyn RemoteSocket>) -> Teardown {
        let env = {
            let state = self.inner.state.lock();
            EnvSync {
                debug: state
                    .env
                    .debug
                    .clone()
                    .or_else(|| state.namespaces.source().map(str::to_owned)),
                loglevel: Some(
                    state
                        .env
                        .loglevel
                        .clone()
                        .unwrap_or_else(|| state.level.to_string()),
                ),
            }
        };
        send_frame(socket.as_ref(), &Frame::env(env));

        let weak = Arc::downgrade(&self.inner);
        socket.set_message_handler(Some(Arc::new(move |text: &str| {
            with_logger(&weak, |logger| logger.handle_server_frame(text));
        })));

        Teardown::new(move || socket.set_message_handler(None))
    }

    pub(super) fn forward(
        &self,
        socket: &Arc<dyn RemoteSocket>,
        namespace: &str,
        level: &str,
        message: Message,
        meta: Meta,
    ) {
        let frame = Frame::log(RemoteLog(
            namespace.to_owned(),
            level.to_owned(),
            message,
            tag_remote(meta),
        ));
        send_frame(socket.as_ref(), &frame);
    }

    fn handle_client_frame(&self, text: &str) {
        match Frame::decode(text) {
            Ok(frame) => {
                if let Some(env) = frame.env {
                    self.sync_env(env);
                }
            }
            Err(err) => self.drop_frame(&err),
        }
    }

    fn handle_server_frame(&self, text: &str) {
        let frame = match Frame::decode(text) {
            Ok(frame) => frame,
            Err(err) => return self.drop_frame(&err),
        };
        if let Some(records) = frame.log_all {
            let mut state = self.inner.state.lock();
            for record in records {
                state.store.record(Arc::new(record));
            }
        }
        if let Some(RemoteLog(namespace, level, message, mut meta)) = frame.log {
            meta.entry("remote").or_insert(true.into());
            self.log_entry(&namespace, &level, message, meta);
        }
    }

    fn drop_frame(&self, err: &BridgeError) {
        self.log(
            LOGGER_NAMESPACE,
            LogLevel::Debug,
            format!("Dropped malformed remote frame: {err}"),
            Meta::new(),
        );
    }
}

fn with_logger(inner: &Weak<Inner>, f: impl FnOnce(&Logger)) {
    if let Some(inner) = inner.upgrade() {
        f(&Logger::from_inner(inner));
    }
}

fn send_frame(socket: &dyn RemoteSocket, frame: &Frame) {
    if let Err(err) = frame.encode().and_then(|text| socket.send(&text)) {
        warn!("Logger: failed to send frame to remote peer: {err}");
    }
}
