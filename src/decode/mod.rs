use crate::export::{write_wav, ExportError};
use crate::header::{AudioFormat, SampleDescriptor};
use error::{ExtractError, ExtractErrorKind};
use log::{debug, warn};
use std::{
    io::{Seek, Write},
    num::NonZeroU16,
};

mod adpcm;
pub(crate) mod error;
mod mpeg;
mod vorbis;

/// Converts compressed sample data to interleaved 16-bit little-endian PCM.
///
/// Returning an error of kind [`ExtractErrorKind::Unsupported`] is not fatal:
/// the sample is then extracted as its raw bytes and a warning is logged.
pub trait Decompress {
    /// Decodes `data` of the given `format`.
    ///
    /// # Errors
    /// Fails if the format is not handled, or if decoding fails.
    fn decompress(
        &self,
        format: AudioFormat,
        data: &[u8],
        sample_rate: u32,
        channels: NonZeroU16,
    ) -> Result<Vec<u8>, ExtractError>;
}

/// Decoder for MPEG, IMA ADPCM and Ogg-framed Vorbis data.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuiltinDecoder;

impl Decompress for BuiltinDecoder {
    fn decompress(
        &self,
        format: AudioFormat,
        data: &[u8],
        _sample_rate: u32,
        channels: NonZeroU16,
    ) -> Result<Vec<u8>, ExtractError> {
        match format {
            AudioFormat::Mpeg => mpeg::decode(data),
            AudioFormat::ImaAdpcm => adpcm::decode(data, channels),
            AudioFormat::Vorbis => vorbis::decode(data),
            _ => Err(ExtractError::unsupported(format)),
        }
    }
}

/// A sample converted to PCM where possible.
///
/// Samples whose format could not be decoded keep their original format and bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedSample {
    name: Box<str>,
    format: AudioFormat,
    sample_rate: u32,
    channels: NonZeroU16,
    data: Vec<u8>,
}

impl DecodedSample {
    /// Returns the name of the sample.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the format of [`DecodedSample::data`]: a PCM format, unless decoding was not possible.
    #[must_use]
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Returns the sample rate, in Hz.
    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the number of channels.
    #[must_use]
    pub fn channels(&self) -> NonZeroU16 {
        self.channels
    }

    /// Returns the sample data.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the sample, returning its data.
    #[must_use]
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Writes the sample to `sink` as a WAV file.
    ///
    /// # Errors
    /// Fails if the sample is not PCM or if writing fails.
    pub fn write_wav<W: Write + Seek>(&self, sink: W) -> Result<(), ExportError> {
        write_wav(self.format, self.sample_rate, self.channels, &self.data, sink)
    }
}

pub(crate) fn extract(
    descriptor: &SampleDescriptor,
    data: &[u8],
    decoder: &impl Decompress,
) -> Result<DecodedSample, ExtractError> {
    let format = descriptor.format;

    let (format, data) = match format {
        _ if format.is_pcm() => (format, data.to_vec()),
        AudioFormat::Mpeg | AudioFormat::ImaAdpcm | AudioFormat::Vorbis => {
            match decoder.decompress(format, data, descriptor.sample_rate, descriptor.channels) {
                Ok(pcm) => {
                    debug!(
                        "decoded \"{}\" from {format}: {} bytes to {} bytes",
                        descriptor.name,
                        data.len(),
                        pcm.len()
                    );
                    (AudioFormat::Pcm16, pcm)
                }
                Err(e) if e.kind() == ExtractErrorKind::Unsupported => {
                    warn!("{e}; keeping raw data of \"{}\"", descriptor.name);
                    (format, data.to_vec())
                }
                Err(e) => return Err(e),
            }
        }
        _ => {
            warn!(
                "no decoder for audio format {format}; keeping raw data of \"{}\"",
                descriptor.name
            );
            (format, data.to_vec())
        }
    };

    Ok(DecodedSample {
        name: descriptor.name.clone(),
        format,
        sample_rate: descriptor.sample_rate,
        channels: descriptor.channels,
        data,
    })
}
