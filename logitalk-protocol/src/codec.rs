/// Codec for the LogiTalk line protocol
use crate::{
    model::{Frame, FrameType, ImageMessage, TextMessage},
    util::OptionExt,
    Error,
};
use tokio_util::{
    bytes::{BufMut, BytesMut},
    codec::{Decoder, Encoder, LinesCodec},
};
use tracing::debug;

// 640k ought to be enough for anyone
pub const MAX_LENGTH: usize = 1024 * 640;

/// Separates the type tag and fields of a record
pub const DELIMITER: char = '@';

/// Ends every record on the wire
pub const TERMINATOR: u8 = b'\n';

/// Codec for LogiTalk frames
///
/// Decoding yields raw record lines rather than [`Frame`]s so that callers
/// decide what to do with records that fail to [`parse`]. Blank records are
/// skipped, and an unterminated tail left at end of stream is discarded.
#[derive(Debug)]
pub struct FrameCodec {
    inner: LinesCodec,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self {
            inner: LinesCodec::new_with_max_length(MAX_LENGTH),
        }
    }
}

impl Decoder for FrameCodec {
    type Item = String;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        while let Some(line) = self.inner.decode(src)? {
            let record = line.trim();
            if !record.is_empty() {
                return Ok(Some(record.to_owned()));
            }
        }
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(record) = self.decode(src)? {
            return Ok(Some(record));
        }
        if !src.is_empty() {
            debug!(len = src.len(), "discarding unterminated tail at end of stream");
            src.clear();
        }
        Ok(None)
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match frame {
            Frame::Text(msg) => encode_frame(
                FrameType::Text,
                &[msg.author.as_str(), msg.text.as_str()],
                dst,
            ),
            Frame::Image(msg) => encode_frame(
                FrameType::Image,
                &[
                    msg.author.as_str(),
                    msg.filename.as_str(),
                    msg.metadata.as_str(),
                ],
                dst,
            ),
            Frame::Unknown(raw) => {
                dst.reserve(raw.len() + 1);
                dst.put_slice(raw.as_bytes());
                dst.put_u8(TERMINATOR);
            }
        }
        Ok(())
    }
}

/// Writes `TYPE@field@...` followed by the terminator.
///
/// Fields are written verbatim. Callers must make sure they contain no
/// terminator, and that no field but the last contains the delimiter.
pub fn encode_frame(frame_type: FrameType, fields: &[&str], dst: &mut BytesMut) {
    let tag = frame_type.as_str();

    // Reserve enough space for full encoding to avoid reallocating
    dst.reserve(tag.len() + fields.iter().map(|s| s.len() + 1).sum::<usize>() + 1);

    dst.put_slice(tag.as_bytes());
    for field in fields {
        dst.put_u8(DELIMITER as u8);
        dst.put_slice(field.as_bytes());
    }
    dst.put_u8(TERMINATOR);
}

/// Drains every complete record currently in `src`, in stream order.
///
/// Whatever follows the last terminator stays in `src` until more bytes
/// arrive, so feeding a stream in any number of chunks yields the same records
/// as feeding it whole.
pub fn decode_records(codec: &mut FrameCodec, src: &mut BytesMut) -> Result<Vec<String>, Error> {
    let mut records = Vec::new();
    while let Some(record) = codec.decode(src)? {
        records.push(record);
    }
    Ok(records)
}

/// Interprets one record line.
///
/// The line is split on the delimiter at most three times, so the final field
/// of a frame keeps any further delimiters verbatim. Unrecognized tags produce
/// [`Frame::Unknown`] holding the whole line. A recognized tag with too few
/// fields is an [`Error::MissingFields`].
pub fn parse(record: &str) -> Result<Frame, Error> {
    let (tag, rest) = match record.split_once(DELIMITER) {
        Some((tag, rest)) => (tag, Some(rest)),
        None => (record, None),
    };

    match FrameType::from_tag(tag) {
        FrameType::Text => {
            let mut fields = rest.into_iter().flat_map(|rest| rest.splitn(2, DELIMITER));
            let author = fields.next().or_missing(FrameType::Text)?;
            let text = fields.next().or_missing(FrameType::Text)?;
            Ok(Frame::Text(TextMessage::new(author, text)))
        }
        FrameType::Image => {
            let mut fields = rest.into_iter().flat_map(|rest| rest.splitn(3, DELIMITER));
            let author = fields.next().or_missing(FrameType::Image)?;
            let filename = fields.next().or_missing(FrameType::Image)?;
            let metadata = fields.next().or_missing(FrameType::Image)?;
            Ok(Frame::Image(ImageMessage::new(author, filename, metadata)))
        }
        FrameType::Unknown => Ok(Frame::Unknown(record.to_owned())),
    }
}
