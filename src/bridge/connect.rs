//! Race between a connecting socket and the connect deadline.

use std::{sync::Arc, thread, time::Duration};

use crossbeam_channel::{RecvTimeoutError, bounded};

use super::{BridgeError, RemoteSocket};

/// Run `factory` on its own thread and wait at most `timeout` for its result.
///
/// The first of {socket, error, deadline} decides the outcome. A socket that
/// arrives after the deadline is dropped on the connecting thread, which
/// closes it.
pub(crate) fn race<F>(factory: F, timeout: Duration) -> Result<Arc<dyn RemoteSocket>, BridgeError>
where
    F: FnOnce() -> Result<Arc<dyn RemoteSocket>, BridgeError> + Send + 'static,
{
    let (tx, rx) = bounded(1);
    thread::Builder::new()
        .name("percy-remote-connect".into())
        .spawn(move || {
            // Fails once the receiver has given up; the late socket is dropped.
            let _ = tx.send(factory());
        })?;

    match rx.recv_timeout(timeout) {
        Ok(Ok(socket)) if socket.is_open() => Ok(socket),
        Ok(Ok(_)) => Err(BridgeError::ConnectionFailed),
        Ok(Err(err)) => Err(err),
        Err(RecvTimeoutError::Timeout) => Err(BridgeError::Timeout),
        // The factory panicked before producing anything.
        Err(RecvTimeoutError::Disconnected) => Err(BridgeError::ConnectionFailed),
    }
}
