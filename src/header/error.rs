use crate::read::{ReadError, ReadErrorKind};
use std::{
    error::Error,
    fmt::{Display, Formatter, Result as FmtResult},
};

#[derive(Debug)]
pub(crate) struct HeaderError {
    kind: HeaderErrorKind,
    source: Option<HeaderErrorSource>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum HeaderErrorKind {
    Magic,
    Version,
    UnknownVersion { version: u32 },
    SampleCount,
    SampleHeadersSize,
    NameTableSize,
    PayloadSize,
    ModeFlags,
    SampleHeader,
    WrongHeaderSize { expected: usize, actual: usize },
    NameTable,
}

#[derive(Debug)]
pub(crate) enum HeaderErrorSource {
    Read(ReadError),
    Sample(SampleError),
    NameTable(NameError),
}

impl HeaderError {
    pub(crate) fn new(kind: HeaderErrorKind) -> Self {
        Self { kind, source: None }
    }

    pub(crate) fn new_with_source(kind: HeaderErrorKind, source: ReadError) -> Self {
        Self {
            kind,
            source: Some(HeaderErrorSource::Read(source)),
        }
    }

    pub(crate) fn factory(kind: HeaderErrorKind) -> impl FnOnce(ReadError) -> Self {
        move |source| Self::new_with_source(kind, source)
    }

    pub(crate) fn kind(&self) -> HeaderErrorKind {
        self.kind
    }

    /// Returns the kind of the read failure at the bottom of the error chain, if there is one.
    pub(crate) fn read_error_kind(&self) -> Option<ReadErrorKind> {
        match &self.source {
            Some(HeaderErrorSource::Read(e)) => Some(e.kind()),
            Some(HeaderErrorSource::Sample(e)) => e.source.as_ref().map(ReadError::kind),
            Some(HeaderErrorSource::NameTable(e)) => Some(e.source.kind()),
            None => None,
        }
    }

    pub(crate) fn sample_err_kind(&self) -> Option<SampleErrorKind> {
        match &self.source {
            Some(HeaderErrorSource::Sample(e)) => Some(e.kind),
            _ => None,
        }
    }
}

impl Display for HeaderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        #[allow(clippy::enum_glob_use)]
        use HeaderErrorKind::*;

        match self.kind {
            Magic => f.write_str("no file signature found"),
            Version => f.write_str("failed to read file format version"),
            UnknownVersion { version } => {
                f.write_str(&format!("file format version was not recognized (0x{version:08x})"))
            }
            SampleCount => f.write_str("failed to read number of samples"),
            SampleHeadersSize => f.write_str("failed to read size of sample headers"),
            NameTableSize => f.write_str("failed to read size of name table"),
            PayloadSize => f.write_str("failed to read total size of sample data"),
            ModeFlags => f.write_str("failed to read mode flags"),
            SampleHeader => f.write_str("failed to parse sample header"),
            WrongHeaderSize { expected, actual } => {
                f.write_str(&format!("total size of base header and sample headers ({actual} bytes) was different from expected ({expected} bytes)"))
            }
            NameTable => f.write_str("failed to read sample names"),
        }
    }
}

impl Error for HeaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.source {
            Some(source) => match source {
                HeaderErrorSource::Read(e) => Some(e),
                HeaderErrorSource::Sample(e) => Some(e),
                HeaderErrorSource::NameTable(e) => Some(e),
            },
            None => None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct SampleError {
    index: u32,
    kind: SampleErrorKind,
    source: Option<ReadError>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SampleErrorKind {
    Size,
    Offset,
    Flags,
    Metadata,
    SampleRate,
    LoopStart,
    LoopEnd,
    ExtraFlags,
    UnknownAudioFormat { flag: u8 },
}

impl SampleError {
    pub(crate) fn new(index: u32, kind: SampleErrorKind) -> Self {
        Self {
            index,
            kind,
            source: None,
        }
    }

    pub(crate) fn new_with_source(index: u32, kind: SampleErrorKind, source: ReadError) -> Self {
        Self {
            index,
            kind,
            source: Some(source),
        }
    }

    pub(crate) fn factory(index: u32, kind: SampleErrorKind) -> impl FnOnce(ReadError) -> Self {
        move |source| Self::new_with_source(index, kind, source)
    }

    #[cfg(test)]
    pub(crate) fn kind(&self) -> SampleErrorKind {
        self.kind
    }
}

impl From<SampleError> for HeaderError {
    fn from(value: SampleError) -> Self {
        Self {
            kind: HeaderErrorKind::SampleHeader,
            source: Some(HeaderErrorSource::Sample(value)),
        }
    }
}

impl Display for SampleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        #[allow(clippy::enum_glob_use)]
        use SampleErrorKind::*;

        match self.kind {
            Size => f.write_str("failed to read size of sample data"),
            Offset => f.write_str("failed to read offset of sample data"),
            Flags => f.write_str("failed to read sample flags"),
            Metadata => f.write_str("failed to read packed sample metadata"),
            SampleRate => f.write_str("failed to read sample rate"),
            LoopStart => f.write_str("failed to read starting position of loop in sample"),
            LoopEnd => f.write_str("failed to read ending position of loop in sample"),
            ExtraFlags => f.write_str("failed to read (unused) extra sample flags"),
            UnknownAudioFormat { flag } => {
                f.write_str(&format!("audio format flag was not recognized (0x{flag:02x})"))
            }
        }?;

        f.write_str(&format!(" - sample header at index {}", self.index))
    }
}

impl Error for SampleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.source {
            Some(source) => Some(source),
            None => None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct NameError {
    source: ReadError,
}

impl NameError {
    pub(crate) fn new(source: ReadError) -> Self {
        Self { source }
    }
}

impl From<NameError> for HeaderError {
    fn from(value: NameError) -> Self {
        Self {
            kind: HeaderErrorKind::NameTable,
            source: Some(HeaderErrorSource::NameTable(value)),
        }
    }
}

impl Display for NameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("failed to read name table")
    }
}

impl Error for NameError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}
