/// Turns frames into lines ready for display
use crate::model::Frame;
use std::fmt;
use time::OffsetDateTime;

/// Where a display event came from, so the UI can style it
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum EventKind {
    /// Frame received from the server
    Received,
    /// Local copy of a message this client just sent
    Echo,
    /// Connection status or error worth telling the user about
    Notice,
}

/// A rendered, human-readable line handed to the UI
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DisplayEvent {
    kind: EventKind,
    text: String,
    at: OffsetDateTime,
}

impl DisplayEvent {
    pub fn new(kind: EventKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            at: OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc()),
        }
    }

    pub fn received(text: impl Into<String>) -> Self {
        Self::new(EventKind::Received, text)
    }

    pub fn echo(text: impl Into<String>) -> Self {
        Self::new(EventKind::Echo, text)
    }

    pub fn notice(text: impl Into<String>) -> Self {
        Self::new(EventKind::Notice, text)
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// When the event was produced, in local time when the offset is known
    /// and UTC otherwise
    pub fn at(&self) -> OffsetDateTime {
        self.at
    }
}

impl fmt::Display for DisplayEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Maps a received frame to the line shown for it
pub fn interpret(frame: &Frame) -> DisplayEvent {
    let text = match frame {
        Frame::Text(msg) => format!("{}: {}", msg.author, msg.text),
        Frame::Image(msg) => format!("{} sent an image: {}", msg.author, msg.filename),
        Frame::Unknown(raw) => raw.clone(),
    };
    DisplayEvent::received(text)
}

#[cfg(test)]
mod test {
    use super::{interpret, DisplayEvent, EventKind};
    use crate::{parse, Frame, ImageMessage, TextMessage};
    use time::{Duration, OffsetDateTime, UtcOffset};

    #[test]
    fn test_interpret() {
        #[rustfmt::skip]
        let tests = vec![
            (
                Frame::text(TextMessage::new("Artem", "hello there")),
                "Artem: hello there",
            ),
            (
                Frame::text(TextMessage::join("Bob")),
                "Bob: [SYSTEM] Bob joined the chat!",
            ),
            (
                Frame::image(ImageMessage::new("Artem", "photo.png", "ignored")),
                "Artem sent an image: photo.png",
            ),
            (
                Frame::unknown("PING"),
                "PING",
            ),
        ];
        for (frame, line) in tests {
            let event = interpret(&frame);
            assert_eq!(event.text(), line);
            assert_eq!(event.kind(), EventKind::Received);
        }
    }

    #[test]
    fn test_unknown_record_passes_through_verbatim() {
        let record = "WHO@is@there";
        let event = interpret(&parse(record).unwrap());
        assert_eq!(event.to_string(), record);
    }

    #[test]
    fn test_timestamp_uses_local_offset_when_known() {
        let event = DisplayEvent::notice("Disconnected from server");
        let expected = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
        assert_eq!(event.at().offset(), expected);
        assert!((OffsetDateTime::now_utc() - event.at()).abs() < Duration::seconds(5));
    }
}
