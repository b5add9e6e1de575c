/// Protocol definitions for the LogiTalk chat
///
/// Every message is a single UTF-8 line of `@`-separated fields terminated by
/// `\n`:
///
/// ```ignore
/// <TYPE>@<field>@<field>[@<field>]
/// ```
///
/// Where `TYPE` is `TEXT` or `IMAGE`. Lines with any other leading token are
/// passed through untouched as unknown frames. The last field of a frame is
/// payload and may itself contain `@`.
use thiserror::Error;

mod codec;
mod dispatch;
mod model;
mod util;

pub use codec::{
    decode_records, encode_frame, parse, FrameCodec, DELIMITER, MAX_LENGTH, TERMINATOR,
};
pub use dispatch::{interpret, DisplayEvent, EventKind};
pub use model::{Frame, FrameType, ImageMessage, TextMessage};

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("lines parse error: {0}")]
    LinesParseError(#[from] tokio_util::codec::LinesCodecError),

    #[error("{0} frame is missing fields")]
    MissingFields(FrameType),
}
