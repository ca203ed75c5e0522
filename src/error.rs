use crate::decode::error::ExtractError;
use crate::header::error::{HeaderError, HeaderErrorKind, SampleErrorKind};
use crate::read::{ReadError, ReadErrorKind};
use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
};

/// Error returned when a sound bank could not be read.
#[derive(Debug)]
pub struct DecodeError {
    kind: DecodeErrorKind,
    source: DecodeErrorSource,
}

/// Category of a [`DecodeError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DecodeErrorKind {
    /// The data does not start with the sound bank signature.
    BadMagic,
    /// The layout version is not one of FSB1 to FSB5.
    UnsupportedVersion,
    /// The data ended before everything the headers describe could be read.
    Truncated,
    /// A sample header holds an audio format flag that is not recognized.
    UnknownAudioFormat,
    /// Declared sizes or offsets contradict what was actually read.
    Inconsistent,
    /// The underlying reader failed.
    Io,
}

#[derive(Debug)]
enum DecodeErrorSource {
    Header(HeaderError),
    Payload { index: u32, source: ReadError },
    OutOfBounds { index: u32, end: u64, len: usize },
}

impl DecodeError {
    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> DecodeErrorKind {
        self.kind
    }

    pub(crate) fn payload(index: u32) -> impl FnOnce(ReadError) -> Self {
        move |source| Self {
            kind: read_error_category(source.kind()),
            source: DecodeErrorSource::Payload { index, source },
        }
    }

    pub(crate) fn out_of_bounds(index: u32, end: u64, len: usize) -> Self {
        Self {
            kind: DecodeErrorKind::Truncated,
            source: DecodeErrorSource::OutOfBounds { index, end, len },
        }
    }
}

fn read_error_category(kind: ReadErrorKind) -> DecodeErrorKind {
    match kind {
        ReadErrorKind::Failure => DecodeErrorKind::Io,
        ReadErrorKind::Incomplete(_) => DecodeErrorKind::Truncated,
        ReadErrorKind::Rewind { .. } => DecodeErrorKind::Inconsistent,
    }
}

impl From<HeaderError> for DecodeError {
    fn from(value: HeaderError) -> Self {
        // A missing signature is reported as such even when the data is too short to hold one.
        let kind = match value.kind() {
            HeaderErrorKind::Magic => DecodeErrorKind::BadMagic,
            HeaderErrorKind::UnknownVersion { .. } => DecodeErrorKind::UnsupportedVersion,
            _ => match (value.sample_err_kind(), value.read_error_kind()) {
                (Some(SampleErrorKind::UnknownAudioFormat { .. }), _) => {
                    DecodeErrorKind::UnknownAudioFormat
                }
                (_, Some(kind)) => read_error_category(kind),
                (_, None) => DecodeErrorKind::Inconsistent,
            },
        };

        Self {
            kind,
            source: DecodeErrorSource::Header(value),
        }
    }
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.source {
            DecodeErrorSource::Header(_) => f.write_str("failed to parse sound bank header"),
            DecodeErrorSource::Payload { index, .. } => {
                f.write_str(&format!("failed to read data of sample at index {index}"))
            }
            DecodeErrorSource::OutOfBounds { index, end, len } => f.write_str(&format!(
                "data of sample at index {index} ends at byte {end}, past the end of the sound bank ({len} bytes)"
            )),
        }
    }
}

impl StdError for DecodeError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.source {
            DecodeErrorSource::Header(e) => Some(e),
            DecodeErrorSource::Payload { source, .. } => Some(source),
            DecodeErrorSource::OutOfBounds { .. } => None,
        }
    }
}

/// Error returned when extracting audio from a sound bank fails.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The sound bank could not be read.
    Decode(DecodeError),
    /// The data of one sample could not be converted to PCM.
    Extract {
        /// Position of the sample in the sound bank.
        index: u32,
        /// What went wrong.
        source: ExtractError,
    },
}

impl From<DecodeError> for Error {
    fn from(value: DecodeError) -> Self {
        Self::Decode(value)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Decode(e) => e.fmt(f),
            Self::Extract { index, .. } => {
                f.write_str(&format!("failed to extract audio of sample at index {index}"))
            }
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Decode(e) => e.source(),
            Self::Extract { source, .. } => Some(source),
        }
    }
}
