/// Socket ownership and the background receive loop
use crate::error::{ConnectError, SendError};
use futures::{SinkExt, StreamExt};
use logitalk_protocol::{interpret, parse, DisplayEvent, Frame, FrameCodec, TextMessage};
use std::{future::Future, io, sync::Arc, time::Duration};
use tokio::{
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream, ToSocketAddrs,
    },
    sync::{mpsc, oneshot, watch, Mutex},
    task::JoinHandle,
};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, trace, warn};

/// Initial capacity of the receive buffer. The buffer grows past this when a
/// single record does not fit, so later reads may be larger.
pub const READ_CHUNK_SIZE: usize = 4096;

/// Queue the UI drains to render events
pub type EventSender = mpsc::UnboundedSender<DisplayEvent>;

// Taken and closed by whichever side ends the connection first
type SharedWriter = Arc<Mutex<Option<FramedWrite<OwnedWriteHalf, FrameCodec>>>>;

/// Lifecycle of a connection. `Closed` is terminal.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Closed,
}

/// Knobs for [`Connection::connect`]
#[derive(Clone, Debug, Default)]
pub struct ConnectOptions {
    /// Give up on connecting after this long. No limit when `None`.
    pub connect_timeout: Option<Duration>,
}

#[derive(Debug)]
enum CloseReason {
    Shutdown,
    PeerClosed,
    ReadError(logitalk_protocol::Error),
}

/// Live connection to a chat server
///
/// Writes happen on the caller's task. Reads happen on a dedicated task that
/// owns the receive buffer and is the only writer of the connection state
/// once connected. When the server goes away that task also closes the
/// socket.
#[derive(Debug)]
pub struct Connection {
    writer: SharedWriter,
    state: watch::Receiver<ConnectionState>,
    shutdown: Option<oneshot::Sender<()>>,
    receiver: Option<JoinHandle<()>>,
}

impl Connection {
    /// Opens the socket, announces `username` and starts the receive loop.
    ///
    /// Every frame received afterwards is interpreted and sent to `events`.
    pub async fn connect(
        addr: impl ToSocketAddrs,
        username: &str,
        options: &ConnectOptions,
        events: EventSender,
    ) -> Result<Self, ConnectError> {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        state_tx.send_replace(ConnectionState::Connecting);

        let stream =
            match with_timeout(options.connect_timeout, TcpStream::connect(addr)).await {
                Ok(stream) => stream,
                Err(e) => {
                    state_tx.send_replace(ConnectionState::Disconnected);
                    warn!(error = %e, "connect failed");
                    return Err(e);
                }
            };
        if let Ok(peer) = stream.peer_addr() {
            debug!(%peer, "socket open");
        }

        let (rx, tx) = stream.into_split();
        let mut writer = FramedWrite::new(tx, FrameCodec::default());
        if let Err(e) = writer.send(Frame::text(TextMessage::join(username))).await {
            state_tx.send_replace(ConnectionState::Disconnected);
            warn!(error = %e, "join announcement failed");
            return Err(ConnectError::Greeting(e));
        }
        state_tx.send_replace(ConnectionState::Connected);
        info!(%username, "connected");

        let writer = Arc::new(Mutex::new(Some(writer)));
        let reader = FramedRead::with_capacity(rx, FrameCodec::default(), READ_CHUNK_SIZE);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let receiver = tokio::spawn(receive_loop(
            reader,
            writer.clone(),
            events,
            state_tx,
            shutdown_rx,
        ));

        Ok(Self {
            writer,
            state: state_rx,
            shutdown: Some(shutdown_tx),
            receiver: Some(receiver),
        })
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Resolves once the receive loop has finished
    pub async fn closed(&self) {
        let mut state = self.state.clone();
        let _ = state
            .wait_for(|state| *state == ConnectionState::Closed)
            .await;
    }

    /// Encodes `frame` and writes it out completely
    pub async fn send(&mut self, frame: Frame) -> Result<(), SendError> {
        let mut writer = self.writer.lock().await;
        match writer.as_mut() {
            Some(writer) if self.state() != ConnectionState::Closed => {
                writer.send(frame).await?;
                Ok(())
            }
            _ => Err(SendError::Closed),
        }
    }

    /// Stops the receive loop and closes the socket. Safe to call twice.
    pub async fn shutdown(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        close_writer(&self.writer).await;
        if let Some(receiver) = self.receiver.take() {
            if let Err(e) = receiver.await {
                warn!(error = %e, "receive loop did not finish cleanly");
            }
        }
    }
}

async fn with_timeout<T>(
    limit: Option<Duration>,
    connect: impl Future<Output = io::Result<T>>,
) -> Result<T, ConnectError> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, connect)
            .await
            .map_err(|_| ConnectError::Timeout(limit))?
            .map_err(ConnectError::from),
        None => Ok(connect.await?),
    }
}

// Flushes and shuts down the write half, then drops it
async fn close_writer(writer: &SharedWriter) {
    if let Some(mut writer) = writer.lock().await.take() {
        if let Err(e) = writer.close().await {
            debug!(error = %e, "error closing write half");
        }
    }
}

async fn receive_loop(
    mut reader: FramedRead<OwnedReadHalf, FrameCodec>,
    writer: SharedWriter,
    events: EventSender,
    state: watch::Sender<ConnectionState>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let reason = loop {
        tokio::select! {
            // Fires on an explicit shutdown and when the connection is dropped
            _ = &mut shutdown => break CloseReason::Shutdown,

            maybe_record = reader.next() => match maybe_record {
                Some(Ok(record)) => dispatch(&record, &events),
                Some(Err(e)) => break CloseReason::ReadError(e),
                None => break CloseReason::PeerClosed,
            }
        }
    };

    drop(reader);
    if !matches!(reason, CloseReason::Shutdown) {
        close_writer(&writer).await;
    }
    state.send_replace(ConnectionState::Closed);

    let notice = match reason {
        CloseReason::Shutdown => {
            info!("connection shut down");
            None
        }
        CloseReason::PeerClosed => {
            info!("server closed the connection");
            Some(DisplayEvent::notice("Disconnected from server"))
        }
        CloseReason::ReadError(e) => {
            warn!(error = %e, "read failed, closing connection");
            Some(DisplayEvent::notice(format!("Disconnected from server: {e}")))
        }
    };
    if let Some(notice) = notice {
        let _ = events.send(notice);
    }
}

// Malformed records are dropped here; they never reach the UI
fn dispatch(record: &str, events: &EventSender) {
    match parse(record) {
        Ok(frame) => {
            trace!(frame_type = %frame.frame_type(), "dispatching frame");
            if events.send(interpret(&frame)).is_err() {
                debug!("event queue closed, frame not rendered");
            }
        }
        Err(e) => debug!(%record, error = %e, "dropping malformed record"),
    }
}
