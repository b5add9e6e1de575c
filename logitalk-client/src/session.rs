/// User identity plus the connection it chats over
use crate::{
    connection::{ConnectOptions, Connection, ConnectionState, EventSender},
    error::ConnectError,
};
use logitalk_protocol::{DisplayEvent, Frame, TextMessage};
use tokio::net::ToSocketAddrs;
use tracing::{info, warn};

/// One chat participant, created once per process and handed to the UI
#[derive(Debug)]
pub struct Session {
    username: String,
    connection: Connection,
    events: EventSender,
}

impl Session {
    /// Connects to `addr` as `username`. Received frames, local echoes and
    /// notices are all delivered to `events`.
    pub async fn connect(
        addr: impl ToSocketAddrs,
        username: impl Into<String>,
        options: &ConnectOptions,
        events: EventSender,
    ) -> Result<Self, ConnectError> {
        let username = username.into();
        let connection = Connection::connect(addr, &username, options, events.clone()).await?;
        Ok(Self {
            username,
            connection,
            events,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Resolves once the connection has closed for any reason
    pub async fn closed(&self) {
        self.connection.closed().await
    }

    /// Sends `text` as a chat message and echoes it locally.
    ///
    /// Input that is blank after trimming is ignored; anything else is sent as
    /// typed. A failed write is reported to the UI as a notice and the session
    /// stays usable.
    pub async fn submit(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }

        self.render(DisplayEvent::echo(format!("{}: {}", self.username, text)));
        let frame = Frame::text(TextMessage::new(&self.username, text));
        if let Err(e) = self.connection.send(frame).await {
            warn!(error = %e, "message not delivered");
            self.render(DisplayEvent::notice(format!("Message not delivered: {e}")));
        }
    }

    /// Closes the connection and waits for the receive loop to stop
    pub async fn shutdown(mut self) {
        self.connection.shutdown().await;
        info!(username = %self.username, "left chat");
    }

    fn render(&self, event: DisplayEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod test {
    use super::Session;
    use crate::{ConnectError, ConnectOptions, ConnectionState};
    use logitalk_protocol::{DisplayEvent, EventKind};
    use std::time::Duration;
    use tokio::{
        io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
        net::{TcpListener, TcpStream},
        sync::mpsc,
    };

    async fn listen() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        (listener, addr)
    }

    async fn connect(
        addr: &str,
        username: &str,
    ) -> (Session, mpsc::UnboundedReceiver<DisplayEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let session = Session::connect(addr, username, &ConnectOptions::default(), events_tx)
            .await
            .unwrap();
        (session, events_rx)
    }

    async fn accept(listener: &TcpListener) -> BufReader<TcpStream> {
        let (stream, _) = listener.accept().await.unwrap();
        BufReader::new(stream)
    }

    async fn read_line(stream: &mut BufReader<TcpStream>) -> String {
        let mut line = String::new();
        stream.read_line(&mut line).await.unwrap();
        line
    }

    async fn next_event(events: &mut mpsc::UnboundedReceiver<DisplayEvent>) -> DisplayEvent {
        tokio::time::timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event queue closed")
    }

    async fn assert_no_event(events: &mut mpsc::UnboundedReceiver<DisplayEvent>) {
        let next = tokio::time::timeout(Duration::from_millis(100), events.recv()).await;
        assert!(next.is_err(), "unexpected event: {next:?}");
    }

    #[tokio::test]
    async fn test_echoed_join_renders_once() {
        let (listener, addr) = listen().await;
        let (session, mut events) = connect(&addr, "Bob").await;

        let mut server = accept(&listener).await;
        let greeting = read_line(&mut server).await;
        assert_eq!(greeting, "TEXT@Bob@[SYSTEM] Bob joined the chat!\n");
        server.write_all(greeting.as_bytes()).await.unwrap();

        let event = next_event(&mut events).await;
        assert_eq!(event.text(), "Bob: [SYSTEM] Bob joined the chat!");
        assert_eq!(event.kind(), EventKind::Received);
        assert_no_event(&mut events).await;
        assert_eq!(session.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_frames_in_one_read_render_in_order() {
        let (listener, addr) = listen().await;
        let (_session, mut events) = connect(&addr, "Bob").await;

        let mut server = accept(&listener).await;
        read_line(&mut server).await;
        server.write_all(b"TEXT@A@hi\nTEXT@B@yo\n").await.unwrap();

        assert_eq!(next_event(&mut events).await.text(), "A: hi");
        assert_eq!(next_event(&mut events).await.text(), "B: yo");
        assert_no_event(&mut events).await;
    }

    #[tokio::test]
    async fn test_submit_sends_and_echoes() {
        let (listener, addr) = listen().await;
        let (mut session, mut events) = connect(&addr, "Bob").await;
        assert_eq!(session.username(), "Bob");

        let mut server = accept(&listener).await;
        read_line(&mut server).await;

        session.submit("   ").await;
        session.submit("hello @ everyone").await;

        let echo = next_event(&mut events).await;
        assert_eq!(echo.text(), "Bob: hello @ everyone");
        assert_eq!(echo.kind(), EventKind::Echo);
        assert_eq!(read_line(&mut server).await, "TEXT@Bob@hello @ everyone\n");
        assert_no_event(&mut events).await;
    }

    #[tokio::test]
    async fn test_submit_keeps_leading_whitespace() {
        let (listener, addr) = listen().await;
        let (mut session, mut events) = connect(&addr, "Bob").await;

        let mut server = accept(&listener).await;
        read_line(&mut server).await;

        session.submit("  indented").await;
        assert_eq!(next_event(&mut events).await.text(), "Bob:   indented");
        assert_eq!(read_line(&mut server).await, "TEXT@Bob@  indented\n");
    }

    #[tokio::test]
    async fn test_peer_close_is_reported() {
        let (listener, addr) = listen().await;
        let (mut session, mut events) = connect(&addr, "Bob").await;

        let mut server = accept(&listener).await;
        read_line(&mut server).await;
        drop(server);

        let notice = next_event(&mut events).await;
        assert_eq!(notice.kind(), EventKind::Notice);
        session.closed().await;
        assert_eq!(session.state(), ConnectionState::Closed);

        // Submitting afterwards reports the failure instead of panicking
        session.submit("still there?").await;
        assert_eq!(next_event(&mut events).await.kind(), EventKind::Echo);
        let failed = next_event(&mut events).await;
        assert_eq!(failed.kind(), EventKind::Notice);
        assert!(failed.text().starts_with("Message not delivered"));
    }

    #[tokio::test]
    async fn test_shutdown_closes_socket() {
        let (listener, addr) = listen().await;
        let (session, mut events) = connect(&addr, "Bob").await;

        let mut server = accept(&listener).await;
        read_line(&mut server).await;

        session.shutdown().await;
        assert_eq!(read_line(&mut server).await, "");
        assert!(events.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let (listener, addr) = listen().await;
        drop(listener);

        let (events_tx, _events_rx) = mpsc::unbounded_channel();
        let result = Session::connect(&addr, "Bob", &ConnectOptions::default(), events_tx).await;
        assert!(matches!(result, Err(ConnectError::Io(_))));
    }
}
