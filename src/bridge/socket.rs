use std::fmt;
use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;

use super::BridgeError;

/// Callback receiving each inbound UTF-8 text frame.
pub type MessageHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// Frames held for a handler that has not been installed yet.
const MAX_PENDING_FRAMES: usize = 128;

/// An open, bidirectional text-frame connection to a remote peer.
///
/// Implementations deliver inbound frames to the handler installed with
/// [`RemoteSocket::set_message_handler`]. Frames that arrive before the first
/// handler is installed are held and handed to it in arrival order; frames
/// arriving after a handler has been removed are discarded.
pub trait RemoteSocket: Send + Sync {
    fn send(&self, frame: &str) -> Result<(), BridgeError>;

    /// Return `true` while the connection is usable.
    fn is_open(&self) -> bool;

    fn set_message_handler(&self, handler: Option<MessageHandler>);
}

#[derive(Default)]
struct SlotState {
    handler: Option<MessageHandler>,
    attached: bool,
    pending: Vec<String>,
}

/// Handler storage shared by the socket implementations.
///
/// `delivery` serialises handler calls so frames held before the first
/// handler reach it ahead of anything the reader delivers afterwards.
#[derive(Default)]
pub(crate) struct HandlerSlot {
    delivery: Mutex<()>,
    state: Mutex<SlotState>,
}

impl HandlerSlot {
    /// Hand `frame` to the installed handler, or hold it until the first
    /// handler arrives. Returns `true` when a handler received it.
    pub(crate) fn dispatch(&self, frame: &str) -> bool {
        let _turn = self.delivery.lock();
        let handler = {
            let mut state = self.state.lock();
            match &state.handler {
                Some(handler) => Some(Arc::clone(handler)),
                None => {
                    if !state.attached && state.pending.len() < MAX_PENDING_FRAMES {
                        state.pending.push(frame.to_owned());
                    }
                    None
                }
            }
        };
        match handler {
            Some(handler) => {
                handler(frame);
                true
            }
            None => false,
        }
    }

    pub(crate) fn set(&self, handler: Option<MessageHandler>) {
        let first = handler.is_some() && !self.state.lock().attached;
        if !first {
            self.state.lock().handler = handler;
            return;
        }

        let _turn = self.delivery.lock();
        let pending = {
            let mut state = self.state.lock();
            state.attached = true;
            state.handler = handler.clone();
            mem::take(&mut state.pending)
        };
        if let Some(handler) = handler {
            for frame in &pending {
                handler(frame);
            }
        }
    }

    pub(crate) fn is_set(&self) -> bool {
        self.state.lock().handler.is_some()
    }
}

/// Detaches a bridge from its socket when run.
pub struct Teardown {
    action: Box<dyn FnOnce() + Send>,
}

impl Teardown {
    pub(crate) fn new(action: impl FnOnce() + Send + 'static) -> Self {
        Self {
            action: Box::new(action),
        }
    }

    pub fn run(self) {
        (self.action)();
    }
}

impl fmt::Debug for Teardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Teardown(..)")
    }
}

/// Compare two sockets by allocation, ignoring vtable identity.
pub(crate) fn same_socket(a: &Arc<dyn RemoteSocket>, b: &Arc<dyn RemoteSocket>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
