use crate::{Error, FrameType};

/// Convenience trait to turn an absent frame field into `Error::MissingFields`
pub trait OptionExt<T> {
    fn or_missing(self, frame_type: FrameType) -> Result<T, Error>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_missing(self, frame_type: FrameType) -> Result<T, Error> {
        self.ok_or(Error::MissingFields(frame_type))
    }
}
