use std::{
    error::Error,
    fmt::{Display, Formatter, Result as FmtResult},
    io::{Error as IoError, Write},
};

pub(crate) struct Writer<W: Write> {
    inner: W,
    position: usize,
}

impl<W: Write> Writer<W> {
    pub(crate) fn new(writer: W) -> Self {
        Self {
            inner: writer,
            position: 0,
        }
    }

    pub(crate) fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn bytes(&mut self, data: &[u8]) -> WriteResult<()> {
        match self.inner.write_all(data) {
            Ok(()) => {
                self.position += data.len();
                Ok(())
            }
            Err(source) => Err(WriteError {
                position: self.position,
                source,
            }),
        }
    }

    pub(crate) fn le_u16(&mut self, value: u16) -> WriteResult<()> {
        self.bytes(&value.to_le_bytes())
    }

    pub(crate) fn le_u32(&mut self, value: u32) -> WriteResult<()> {
        self.bytes(&value.to_le_bytes())
    }

    pub(crate) fn flush(&mut self) -> WriteResult<()> {
        self.inner.flush().map_err(|source| WriteError {
            position: self.position,
            source,
        })
    }
}

pub(crate) type WriteResult<T> = Result<T, WriteError>;

#[derive(Debug)]
pub(crate) struct WriteError {
    position: usize,
    source: IoError,
}

impl Display for WriteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&format!(
            "failed to write data due to I/O error - byte position {}",
            self.position
        ))
    }
}

impl Error for WriteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}
