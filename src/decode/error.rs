use crate::header::AudioFormat;
use lewton::VorbisError;
use std::{
    error::Error,
    fmt::{Display, Formatter, Result as FmtResult},
};
use symphonia::core::errors::Error as SymphoniaError;

/// Error returned when compressed sample data could not be converted to PCM.
#[derive(Debug)]
pub struct ExtractError {
    format: AudioFormat,
    kind: ExtractErrorKind,
    source: Option<ExtractErrorSource>,
}

/// Category of an [`ExtractError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ExtractErrorKind {
    /// The decoder does not handle this data. Extraction falls back to the raw bytes.
    Unsupported,
    /// The data does not have the structure its format requires.
    Malformed,
    /// The decoder failed while decoding.
    Decoder,
}

#[derive(Debug)]
enum ExtractErrorSource {
    Symphonia(SymphoniaError),
    Lewton(VorbisError),
    Custom(Box<dyn Error + Send + Sync>),
}

impl ExtractError {
    /// Creates an error saying that data of `format` can't be handled by this decoder.
    #[must_use]
    pub fn unsupported(format: AudioFormat) -> Self {
        Self {
            format,
            kind: ExtractErrorKind::Unsupported,
            source: None,
        }
    }

    /// Creates an error for a decoder failure on data of `format`.
    pub fn decoder(format: AudioFormat, source: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self {
            format,
            kind: ExtractErrorKind::Decoder,
            source: Some(ExtractErrorSource::Custom(source.into())),
        }
    }

    pub(crate) fn malformed(format: AudioFormat) -> Self {
        Self {
            format,
            kind: ExtractErrorKind::Malformed,
            source: None,
        }
    }

    pub(crate) fn from_symphonia(format: AudioFormat) -> impl FnOnce(SymphoniaError) -> Self {
        move |source| Self {
            format,
            kind: ExtractErrorKind::Decoder,
            source: Some(ExtractErrorSource::Symphonia(source)),
        }
    }

    pub(crate) fn from_lewton(source: VorbisError) -> Self {
        Self {
            format: AudioFormat::Vorbis,
            kind: ExtractErrorKind::Decoder,
            source: Some(ExtractErrorSource::Lewton(source)),
        }
    }

    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> ExtractErrorKind {
        self.kind
    }

    /// Returns the audio format that was being decoded.
    #[must_use]
    pub fn format(&self) -> AudioFormat {
        self.format
    }
}

impl Display for ExtractError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.kind {
            ExtractErrorKind::Unsupported => f.write_str("no decoder available"),
            ExtractErrorKind::Malformed => f.write_str("sample data was malformed"),
            ExtractErrorKind::Decoder => f.write_str("failed to decode sample data"),
        }?;

        f.write_str(&format!(" - audio format {}", self.format))
    }
}

impl Error for ExtractError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.source {
            Some(ExtractErrorSource::Symphonia(e)) => Some(e),
            Some(ExtractErrorSource::Lewton(e)) => Some(e),
            Some(ExtractErrorSource::Custom(e)) => Some(e.as_ref()),
            None => None,
        }
    }
}
