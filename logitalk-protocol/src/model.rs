/// Model definition for frames exchanged by LogiTalk clients and servers
use std::fmt;

/// Type tag found at the start of every record
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum FrameType {
    Text,
    Image,
    Unknown,
}

impl FrameType {
    /// Matches a wire tag. Matching is case-sensitive; anything other than
    /// `TEXT` or `IMAGE` is `Unknown`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "TEXT" => Self::Text,
            "IMAGE" => Self::Image,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Image => "IMAGE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chat line written by `author`
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct TextMessage {
    pub author: String,
    pub text: String,
}

impl TextMessage {
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
        }
    }

    /// Announcement sent once by a client right after it connects
    pub fn join(username: &str) -> Self {
        Self::new(username, format!("[SYSTEM] {username} joined the chat!"))
    }
}

impl From<(String, String)> for TextMessage {
    fn from(value: (String, String)) -> Self {
        let (author, text) = value;
        TextMessage::new(author, text)
    }
}

/// Image announcement. Only the file name is displayed; `metadata` is carried
/// verbatim and never interpreted.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct ImageMessage {
    pub author: String,
    pub filename: String,
    pub metadata: String,
}

impl ImageMessage {
    pub fn new(
        author: impl Into<String>,
        filename: impl Into<String>,
        metadata: impl Into<String>,
    ) -> Self {
        Self {
            author: author.into(),
            filename: filename.into(),
            metadata: metadata.into(),
        }
    }
}

/// A single complete message as it travels over the wire
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum Frame {
    Text(TextMessage),
    Image(ImageMessage),
    /// Record without a recognized type tag, kept as the whole raw line
    Unknown(String),
}

impl Frame {
    pub fn text(msg: impl Into<TextMessage>) -> Self {
        Self::Text(msg.into())
    }

    pub fn image(msg: impl Into<ImageMessage>) -> Self {
        Self::Image(msg.into())
    }

    pub fn unknown(raw: impl Into<String>) -> Self {
        Self::Unknown(raw.into())
    }

    pub fn frame_type(&self) -> FrameType {
        match self {
            Self::Text(_) => FrameType::Text,
            Self::Image(_) => FrameType::Image,
            Self::Unknown(_) => FrameType::Unknown,
        }
    }

    /// Fields following the type tag, in wire order
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Self::Text(msg) => vec![msg.author.as_str(), msg.text.as_str()],
            Self::Image(msg) => vec![
                msg.author.as_str(),
                msg.filename.as_str(),
                msg.metadata.as_str(),
            ],
            Self::Unknown(raw) => vec![raw.as_str()],
        }
    }

    /// Author of the frame, if the frame type carries one
    pub fn author(&self) -> Option<&str> {
        match self {
            Self::Text(msg) => Some(msg.author.as_str()),
            Self::Image(msg) => Some(msg.author.as_str()),
            Self::Unknown(_) => None,
        }
    }
}
