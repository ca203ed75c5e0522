use std::{
    cmp::min,
    error::Error,
    fmt::{Display, Formatter, Result as FmtResult},
    io::{Error as IoError, ErrorKind, Read},
    num::NonZeroUsize,
};

pub(crate) struct Reader<R: Read> {
    inner: R,
    position: usize,
}

impl<R: Read> Reader<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            inner: reader,
            position: 0,
        }
    }

    // Reads until `buf` is full or the source is exhausted, returning the number of bytes read.
    // A short count is not an error here; callers decide how to report it.
    fn fill(&mut self, buf: &mut [u8]) -> ReadResult<usize> {
        let mut filled = 0;

        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => {
                    filled += n;
                    self.position += n;
                }
                Err(e) => match e.kind() {
                    // this I/O error is non-fatal, so reading is retried
                    ErrorKind::Interrupted => {}
                    _ => return Err(self.io_error(e)),
                },
            }
        }

        Ok(filled)
    }

    fn check_missing(&self, missing: usize) -> ReadResult<()> {
        match NonZeroUsize::new(missing) {
            None => Ok(()),
            Some(size) => Err(self.to_error(ReadErrorKind::Incomplete(Needed::Size(size)))),
        }
    }

    pub(crate) fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn take_const<const LEN: usize>(&mut self) -> ReadResult<[u8; LEN]> {
        let mut buf = [0; LEN];
        let n = self.fill(&mut buf)?;
        self.check_missing(LEN - n)?;
        Ok(buf)
    }

    // The buffer grows with the data actually read, so a bogus length from a corrupt file
    // can't trigger one huge allocation up front.
    pub(crate) fn take(&mut self, len: usize) -> ReadResult<Vec<u8>> {
        let mut buf = Vec::new();
        let result = self
            .inner
            .by_ref()
            .take(len as u64)
            .read_to_end(&mut buf);
        self.position += buf.len();

        if let Err(e) = result {
            return Err(self.io_error(e));
        }

        self.check_missing(len - buf.len())?;
        Ok(buf)
    }

    pub(crate) fn skip(&mut self, amount: usize) -> ReadResult<()> {
        let mut scratch = [0; 256];
        let mut remaining = amount;

        while remaining != 0 {
            let len = min(remaining, scratch.len());
            let n = self.fill(&mut scratch[..len])?;
            remaining -= n;

            if n < len {
                break;
            }
        }

        self.check_missing(remaining)
    }

    /// Moves forward to an absolute byte position. The cursor never moves backwards.
    pub(crate) fn advance_to(&mut self, position: usize) -> ReadResult<()> {
        match position.checked_sub(self.position) {
            Some(amount) => self.skip(amount),
            None => Err(self.to_error(ReadErrorKind::Rewind { target: position })),
        }
    }

    pub(crate) fn le_u16(&mut self) -> ReadResult<u16> {
        self.take_const().map(u16::from_le_bytes)
    }

    pub(crate) fn le_u32(&mut self) -> ReadResult<u32> {
        self.take_const().map(u32::from_le_bytes)
    }
}

pub(crate) type ReadResult<T> = Result<T, ReadError>;

#[derive(Debug)]
pub(crate) struct ReadError {
    position: usize,
    kind: ReadErrorKind,
    source: Option<IoError>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ReadErrorKind {
    Failure,
    Incomplete(Needed),
    Rewind { target: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Needed {
    Size(NonZeroUsize),
    Unknown,
}

impl<R: Read> Reader<R> {
    fn to_error(&self, kind: ReadErrorKind) -> ReadError {
        ReadError {
            position: self.position,
            kind,
            source: None,
        }
    }

    fn io_error(&self, source: IoError) -> ReadError {
        let kind = match source.kind() {
            ErrorKind::UnexpectedEof => ReadErrorKind::Incomplete(Needed::Unknown),
            _ => ReadErrorKind::Failure,
        };

        ReadError {
            position: self.position,
            kind,
            source: Some(source),
        }
    }
}

impl ReadError {
    pub(crate) fn kind(&self) -> ReadErrorKind {
        self.kind
    }
}

impl Display for ReadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.kind {
            ReadErrorKind::Failure => f.write_str("failed to read data due to I/O error"),
            ReadErrorKind::Incomplete(needed) => match needed {
                Needed::Size(size) => {
                    f.write_str(&format!("incomplete data: needed {size} more bytes to read"))
                }
                Needed::Unknown => f.write_str("incomplete data"),
            },
            ReadErrorKind::Rewind { target } => f.write_str(&format!(
                "data at byte position {target} was expected after data that was already read"
            )),
        }?;

        f.write_str(&format!(" - byte position {}", self.position))
    }
}

impl Error for ReadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.source {
            Some(e) => Some(e),
            None => None,
        }
    }
}
