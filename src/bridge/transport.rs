//! WebSocket transport for the remote bridge.
//!
//! Each frame travels as one WebSocket text message holding a JSON object,
//! which is what the Percy CLI's log collector expects on its server address.
//! A reader thread per connection hands inbound frames to the installed
//! [`MessageHandler`].

use std::{
    io,
    net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs},
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use log::{debug, warn};
use parking_lot::Mutex;
use tungstenite::{Message, WebSocket};

use super::{BridgeConfig, BridgeError, MessageHandler, RemoteSocket, socket::HandlerSlot};

/// How long the reader holds the connection before letting a writer in.
const READ_POLL: Duration = Duration::from_millis(20);

struct Shared {
    ws: Mutex<WebSocket<TcpStream>>,
    control: TcpStream,
    handler: HandlerSlot,
    open: AtomicBool,
    max_frame_size: usize,
}

/// [`RemoteSocket`] over a WebSocket connection.
///
/// Dropping the last handle closes the connection, which also ends the reader
/// thread.
pub struct WsSocket {
    shared: Arc<Shared>,
    peer: Option<SocketAddr>,
}

impl WsSocket {
    /// Connect to `ws://host:port/`, trying each resolved address in turn,
    /// and complete the opening handshake.
    ///
    /// A peer that does not answer with a WebSocket upgrade is an error, so an
    /// HTTP-only server never puts a logger into remote mode.
    pub fn connect(host: &str, port: u16, config: &BridgeConfig) -> Result<Self, BridgeError> {
        let stream = connect_tcp(host, port, config.connect_timeout)?;
        stream.set_read_timeout(Some(config.connect_timeout))?;
        let (ws, _response) = tungstenite::client(ws_url(host, port).as_str(), stream)
            .map_err(|err| BridgeError::Handshake(err.to_string()))?;
        Self::start(ws, config)
    }

    /// Complete the server side of the handshake on a stream returned by
    /// `TcpListener::accept`.
    pub fn accept(stream: TcpStream, config: &BridgeConfig) -> Result<Self, BridgeError> {
        stream.set_read_timeout(Some(config.connect_timeout))?;
        let ws =
            tungstenite::accept(stream).map_err(|err| BridgeError::Handshake(err.to_string()))?;
        Self::start(ws, config)
    }

    fn start(ws: WebSocket<TcpStream>, config: &BridgeConfig) -> Result<Self, BridgeError> {
        let stream = ws.get_ref();
        stream.set_nodelay(true)?;
        stream.set_write_timeout(Some(config.write_timeout))?;
        stream.set_read_timeout(Some(READ_POLL))?;
        let control = stream.try_clone()?;
        let peer = stream.peer_addr().ok();
        let shared = Arc::new(Shared {
            ws: Mutex::new(ws),
            control,
            handler: HandlerSlot::default(),
            open: AtomicBool::new(true),
            max_frame_size: config.max_frame_size,
        });
        let weak = Arc::downgrade(&shared);
        thread::Builder::new()
            .name("percy-remote-reader".into())
            .spawn(move || reader_loop(weak))?;
        Ok(Self { shared, peer })
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Send a close frame and shut the connection down.
    pub fn close(&self) {
        if self.shared.open.swap(false, Ordering::SeqCst) {
            let _ = self.shared.ws.lock().close(None);
        }
        let _ = self.shared.control.shutdown(Shutdown::Both);
    }
}

impl RemoteSocket for WsSocket {
    fn send(&self, frame: &str) -> Result<(), BridgeError> {
        if !self.is_open() {
            return Err(BridgeError::Closed);
        }
        if frame.len() > self.shared.max_frame_size {
            return Err(BridgeError::FrameTooLarge(frame.len()));
        }
        let result = self.shared.ws.lock().send(Message::text(frame.to_owned()));
        if let Err(err) = result {
            self.shared.open.store(false, Ordering::SeqCst);
            return Err(BridgeError::WebSocket(Box::new(err)));
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::SeqCst)
    }

    fn set_message_handler(&self, handler: Option<MessageHandler>) {
        self.shared.handler.set(handler);
    }
}

impl Drop for WsSocket {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for WsSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsSocket")
            .field("peer", &self.peer)
            .field("open", &self.is_open())
            .finish()
    }
}

fn reader_loop(shared: Weak<Shared>) {
    loop {
        let Some(shared) = shared.upgrade() else {
            return;
        };
        if !shared.open.load(Ordering::SeqCst) {
            return;
        }
        let read = shared.ws.lock().read();
        match read {
            Ok(Message::Text(text)) if text.len() > shared.max_frame_size => {
                debug!("WsSocket dropped {} byte frame over the limit", text.len());
            }
            Ok(Message::Text(text)) => {
                shared.handler.dispatch(text.as_str());
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(tungstenite::Error::Io(err)) if is_poll_timeout(&err) => {}
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => break,
            Err(err) => {
                if shared.open.load(Ordering::SeqCst) {
                    warn!("WsSocket read failed: {err}");
                }
                break;
            }
        }
    }
    if let Some(shared) = shared.upgrade() {
        shared.open.store(false, Ordering::SeqCst);
    }
}

fn is_poll_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

fn ws_url(host: &str, port: u16) -> String {
    if host.contains(':') {
        format!("ws://[{host}]:{port}/")
    } else {
        format!("ws://{host}:{port}/")
    }
}

fn connect_tcp(host: &str, port: u16, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_err = None;
    for addr in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("no addresses resolved for {host}:{port}"),
        )
    }))
}
