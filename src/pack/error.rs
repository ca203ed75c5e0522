use crate::header::{sample::MAX_CHANNELS, AudioFormat};
use crate::source::SourceError;
use crate::write::WriteError;
use std::{
    error::Error,
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};

/// Error returned when a sound bank could not be written.
#[derive(Debug)]
pub struct PackError {
    kind: PackErrorKind,
    index: Option<usize>,
    path: Option<PathBuf>,
    source: Option<PackErrorSource>,
}

/// Category of a [`PackError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PackErrorKind {
    /// No samples were given.
    EmptyInput,
    /// A source file does not exist.
    MissingInput,
    /// A sample has more channels than sample headers can store.
    TooManyChannels {
        /// The channel count of the sample.
        channels: u16,
    },
    /// The audio format can't be stored in sample headers of the chosen version.
    UnrepresentableFormat {
        /// The format of the sample.
        format: AudioFormat,
    },
    /// A sample name contains a null byte, which would end it early in the name table.
    NameContainsNul,
    /// A size or offset does not fit in 32 bits.
    TooLarge,
    /// A source file could not be read.
    SourceAudio,
    /// Writing to the sink failed.
    Io,
}

#[derive(Debug)]
enum PackErrorSource {
    Write(WriteError),
    Source(SourceError),
}

impl PackError {
    pub(crate) fn new(kind: PackErrorKind) -> Self {
        Self {
            kind,
            index: None,
            path: None,
            source: None,
        }
    }

    pub(crate) fn at(index: usize, kind: PackErrorKind) -> Self {
        Self {
            index: Some(index),
            ..Self::new(kind)
        }
    }

    pub(crate) fn missing(index: usize, path: &Path) -> Self {
        Self {
            path: Some(path.to_path_buf()),
            ..Self::at(index, PackErrorKind::MissingInput)
        }
    }

    pub(crate) fn source_audio(index: usize) -> impl FnOnce(SourceError) -> Self {
        move |source| Self {
            source: Some(PackErrorSource::Source(source)),
            ..Self::at(index, PackErrorKind::SourceAudio)
        }
    }

    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> PackErrorKind {
        self.kind
    }

    /// Returns the position of the offending sample in the input, if one sample is at fault.
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Returns the path of the missing source file, for [`PackErrorKind::MissingInput`].
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl From<WriteError> for PackError {
    fn from(value: WriteError) -> Self {
        Self {
            source: Some(PackErrorSource::Write(value)),
            ..Self::new(PackErrorKind::Io)
        }
    }
}

impl Display for PackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        #[allow(clippy::enum_glob_use)]
        use PackErrorKind::*;

        match self.kind {
            EmptyInput => f.write_str("no samples to pack"),
            MissingInput => match &self.path {
                Some(path) => f.write_str(&format!("source file {} does not exist", path.display())),
                None => f.write_str("source file does not exist"),
            },
            TooManyChannels { channels } => f.write_str(&format!(
                "sample has {channels} channels, but at most {MAX_CHANNELS} can be stored"
            )),
            UnrepresentableFormat { format } => f.write_str(&format!(
                "audio format {format} can't be stored in this sound bank version"
            )),
            NameContainsNul => f.write_str("sample name contains a null byte"),
            TooLarge => f.write_str("sound bank would exceed 4 GiB"),
            SourceAudio => f.write_str("failed to read source audio"),
            Io => f.write_str("failed to write sound bank"),
        }?;

        match self.index {
            Some(index) => f.write_str(&format!(" - sample at index {index}")),
            None => Ok(()),
        }
    }
}

impl Error for PackError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.source {
            Some(PackErrorSource::Write(e)) => Some(e),
            Some(PackErrorSource::Source(e)) => Some(e),
            None => None,
        }
    }
}
