use std::sync::{
    Arc, Weak,
    atomic::{AtomicBool, Ordering},
};

use parking_lot::Mutex;

use crate::bridge::{BridgeError, MessageHandler, RemoteSocket, socket::HandlerSlot};

/// In-process [`RemoteSocket`] recording every sent frame.
///
/// Sockets created with [`ChannelSocket::pair`] deliver each sent frame to the
/// other end's handler synchronously.
#[derive(Default)]
pub struct ChannelSocket {
    sent: Mutex<Vec<String>>,
    handler: HandlerSlot,
    closed: AtomicBool,
    peer: Mutex<Weak<ChannelSocket>>,
}

impl ChannelSocket {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Two connected ends.
    pub fn pair() -> (Arc<Self>, Arc<Self>) {
        let a = Self::new();
        let b = Self::new();
        *a.peer.lock() = Arc::downgrade(&b);
        *b.peer.lock() = Arc::downgrade(&a);
        (a, b)
    }

    /// Frames sent through this end so far.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    /// Sent frames parsed as JSON.
    pub fn sent_json(&self) -> Vec<serde_json::Value> {
        self.sent()
            .iter()
            .map(|f| serde_json::from_str(f).expect("sent frame is JSON"))
            .collect()
    }

    /// Feed `frame` to the installed handler as if the peer had sent it.
    /// Returns `false` when no handler took it; before the first handler is
    /// installed the frame is held for it.
    pub fn deliver(&self, frame: &str) -> bool {
        self.handler.dispatch(frame)
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_set()
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl RemoteSocket for ChannelSocket {
    fn send(&self, frame: &str) -> Result<(), BridgeError> {
        if !self.is_open() {
            return Err(BridgeError::Closed);
        }
        self.sent.lock().push(frame.to_owned());
        let peer = self.peer.lock().upgrade();
        if let Some(peer) = peer {
            peer.deliver(frame);
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    fn set_message_handler(&self, handler: Option<MessageHandler>) {
        self.handler.set(handler);
    }
}
