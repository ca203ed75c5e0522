use crate::header::AudioFormat;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::{
    error::Error,
    fmt::{Display, Formatter, Result as FmtResult},
    io::{Seek, Write},
    num::NonZeroU16,
};

/// Writes little-endian PCM `data` to `sink` as a WAV file.
pub(crate) fn write_wav<W: Write + Seek>(
    format: AudioFormat,
    sample_rate: u32,
    channels: NonZeroU16,
    data: &[u8],
    sink: W,
) -> Result<(), ExportError> {
    let (bits_per_sample, sample_format) = match format {
        AudioFormat::PcmFloat => (32, SampleFormat::Float),
        _ => match format.bits_per_sample() {
            Some(bits) => (bits, SampleFormat::Int),
            None => return Err(ExportError::new(ExportErrorKind::NotPcm { format })),
        },
    };

    let width = usize::from(bits_per_sample / 8);
    let frame_size = width * usize::from(channels.get());

    if data.len() % frame_size != 0 {
        return Err(ExportError::new(ExportErrorKind::PartialFrame {
            len: data.len(),
            frame_size,
        }));
    }

    let mut writer = WavWriter::new(
        sink,
        WavSpec {
            channels: channels.get(),
            sample_rate,
            bits_per_sample,
            sample_format,
        },
    )
    .map_err(ExportError::from_hound(ExportErrorKind::CreateEncoder))?;

    let write_error = ExportError::from_hound(ExportErrorKind::EncodeSample);

    let result = match format {
        // 8-bit samples are stored unsigned, and hound takes them as i8
        AudioFormat::Pcm8 => data
            .iter()
            .try_for_each(|&byte| writer.write_sample(i8::from_le_bytes([byte ^ 0x80]))),
        AudioFormat::Pcm16 => data
            .chunks_exact(2)
            .try_for_each(|s| writer.write_sample(i16::from_le_bytes([s[0], s[1]]))),
        AudioFormat::Pcm24 => data.chunks_exact(3).try_for_each(|s| {
            // sign-extend from the top byte
            writer.write_sample(i32::from_le_bytes([0, s[0], s[1], s[2]]) >> 8)
        }),
        AudioFormat::Pcm32 => data
            .chunks_exact(4)
            .try_for_each(|s| writer.write_sample(i32::from_le_bytes([s[0], s[1], s[2], s[3]]))),
        _ => data
            .chunks_exact(4)
            .try_for_each(|s| writer.write_sample(f32::from_le_bytes([s[0], s[1], s[2], s[3]]))),
    };

    result.map_err(write_error)?;

    writer
        .finalize()
        .map_err(ExportError::from_hound(ExportErrorKind::Finalize))
}

/// Error returned when sample data could not be written as a WAV file.
#[derive(Debug)]
pub struct ExportError {
    kind: ExportErrorKind,
    source: Option<hound::Error>,
}

/// Category of an [`ExportError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ExportErrorKind {
    /// Only PCM data can be written as WAV.
    NotPcm {
        /// The format of the data.
        format: AudioFormat,
    },
    /// The data does not divide into whole frames (one sample per channel).
    PartialFrame {
        /// Length of the data, in bytes.
        len: usize,
        /// Size of one frame, in bytes.
        frame_size: usize,
    },
    /// The WAV header could not be written.
    CreateEncoder,
    /// A sample could not be written.
    EncodeSample,
    /// The WAV file could not be completed.
    Finalize,
}

impl ExportError {
    fn new(kind: ExportErrorKind) -> Self {
        Self { kind, source: None }
    }

    fn from_hound(kind: ExportErrorKind) -> impl FnOnce(hound::Error) -> Self {
        move |source| Self {
            kind,
            source: Some(source),
        }
    }

    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> ExportErrorKind {
        self.kind
    }
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.kind {
            ExportErrorKind::NotPcm { format } => {
                f.write_str(&format!("audio format {format} is not PCM"))
            }
            ExportErrorKind::PartialFrame { len, frame_size } => f.write_str(&format!(
                "data length ({len} bytes) is not a multiple of the frame size ({frame_size} bytes)"
            )),
            ExportErrorKind::CreateEncoder => f.write_str("failed to create WAV encoder"),
            ExportErrorKind::EncodeSample => f.write_str("failed to encode sample"),
            ExportErrorKind::Finalize => f.write_str("failed to finish writing WAV file"),
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.source {
            Some(source) => Some(source),
            None => None,
        }
    }
}
