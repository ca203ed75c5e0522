use crate::decode::{error::ExtractError, extract, DecodedSample, Decompress};
use crate::error::DecodeError;
use crate::export::{write_wav, ExportError};
use crate::header::SampleDescriptor;
use crate::read::Reader;
use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    io::{Read, Seek, Write},
};

/// One sample of a sound bank together with its data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stream {
    index: u32,
    descriptor: SampleDescriptor,
    data: Box<[u8]>,
}

impl Stream {
    pub(crate) fn new(index: u32, descriptor: SampleDescriptor, data: Box<[u8]>) -> Self {
        Self {
            index,
            descriptor,
            data,
        }
    }

    /// Returns the position of the sample in the sound bank.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Returns the metadata of the sample.
    #[must_use]
    pub fn descriptor(&self) -> &SampleDescriptor {
        &self.descriptor
    }

    /// Returns the sample data as stored in the sound bank.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Converts the sample data to PCM. See [`crate::extract_all_to_pcm`] for how each format is handled.
    ///
    /// # Errors
    /// Fails if `decoder` fails on data it claims to support.
    pub fn extract(&self, decoder: &impl Decompress) -> Result<DecodedSample, ExtractError> {
        extract(&self.descriptor, &self.data, decoder)
    }

    /// Writes PCM sample data to `sink` as a WAV file.
    ///
    /// # Errors
    /// Fails if the sample is not PCM (use [`Stream::extract`] first) or if writing fails.
    pub fn write_wav<W: Write + Seek>(&self, sink: W) -> Result<(), ExportError> {
        write_wav(
            self.descriptor.format,
            self.descriptor.sample_rate,
            self.descriptor.channels,
            &self.data,
            sink,
        )
    }
}

/// Iterator over the samples of a [`Bank`](crate::Bank), reading their data in order.
///
/// Iteration ends after the first error.
pub struct StreamIntoIter<R: Read> {
    index: u32,
    descriptors: Box<[SampleDescriptor]>,
    reader: Reader<R>,
}

impl<R: Read> StreamIntoIter<R> {
    pub(crate) fn new(descriptors: Box<[SampleDescriptor]>, reader: Reader<R>) -> Self {
        Self {
            index: 0,
            descriptors,
            reader,
        }
    }

    fn read_stream(&mut self, descriptor: SampleDescriptor) -> Result<Stream, DecodeError> {
        self.reader
            .advance_to(descriptor.offset as usize)
            .map_err(DecodeError::payload(self.index))?;

        let data = self
            .reader
            .take(descriptor.size as usize)
            .map_err(DecodeError::payload(self.index))?;

        Ok(Stream::new(self.index, descriptor, data.into_boxed_slice()))
    }
}

impl<R: Read> Iterator for StreamIntoIter<R> {
    type Item = Result<Stream, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let descriptor = self.descriptors.get(self.index as usize).cloned()?;
        let item = self.read_stream(descriptor);

        self.index = match item {
            Ok(_) => self.index + 1,
            // nothing after a failed read can be trusted
            Err(_) => u32::try_from(self.descriptors.len()).unwrap_or(u32::MAX),
        };

        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.descriptors.len().saturating_sub(self.index as usize);
        (len, Some(len))
    }
}

impl<R: Read> ExactSizeIterator for StreamIntoIter<R> {}

impl<R: Read> Debug for StreamIntoIter<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("StreamIntoIter")
            .field("index", &self.index)
            .field("remaining", &self.len())
            .finish_non_exhaustive()
    }
}
