use crate::header::AudioFormat;
use hound::{SampleFormat, WavReader};
use std::{
    error::Error,
    fmt::{Display, Formatter, Result as FmtResult},
    io::Read,
    num::NonZeroU16,
    path::{Path, PathBuf},
};

/// PCM audio read from a source file, ready to be packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceAudio {
    /// Format of [`SourceAudio::data`]; always a PCM format.
    pub format: AudioFormat,
    /// Sample rate, in Hz.
    pub sample_rate: u32,
    /// Number of channels.
    pub channels: NonZeroU16,
    /// Interleaved little-endian samples.
    pub data: Vec<u8>,
}

/// Reads audio files to be packed into a sound bank.
pub trait SourceReader {
    /// Reads the audio file at `path`.
    ///
    /// # Errors
    /// Fails if the file can't be opened or decoded.
    fn read(&self, path: &Path) -> Result<SourceAudio, SourceError>;
}

/// Reads WAV files with 8, 16, 24 or 32-bit integer samples, or 32-bit float samples.
#[derive(Clone, Copy, Debug, Default)]
pub struct WavSource;

impl SourceReader for WavSource {
    fn read(&self, path: &Path) -> Result<SourceAudio, SourceError> {
        let reader = WavReader::open(path).map_err(SourceError::factory(path))?;
        read_wav(reader).map_err(SourceError::factory(path))
    }
}

fn read_wav<R: Read>(reader: WavReader<R>) -> Result<SourceAudio, hound::Error> {
    let spec = reader.spec();

    let format = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 8) => AudioFormat::Pcm8,
        (SampleFormat::Int, 16) => AudioFormat::Pcm16,
        (SampleFormat::Int, 24) => AudioFormat::Pcm24,
        (SampleFormat::Int, 32) => AudioFormat::Pcm32,
        (SampleFormat::Float, 32) => AudioFormat::PcmFloat,
        _ => return Err(hound::Error::Unsupported),
    };

    let channels = NonZeroU16::new(spec.channels).ok_or(hound::Error::FormatError(
        "number of channels is zero",
    ))?;

    let data = match format {
        // stored unsigned, the way sound banks and WAV files both keep 8-bit PCM
        AudioFormat::Pcm8 => collect_bytes(reader.into_samples::<i8>(), |s| {
            [s.to_le_bytes()[0] ^ 0x80]
        })?,
        AudioFormat::Pcm16 => collect_bytes(reader.into_samples::<i16>(), i16::to_le_bytes)?,
        AudioFormat::Pcm24 => collect_bytes(reader.into_samples::<i32>(), |s| {
            let [low, mid, high, _] = s.to_le_bytes();
            [low, mid, high]
        })?,
        AudioFormat::Pcm32 => collect_bytes(reader.into_samples::<i32>(), i32::to_le_bytes)?,
        _ => collect_bytes(reader.into_samples::<f32>(), f32::to_le_bytes)?,
    };

    Ok(SourceAudio {
        format,
        sample_rate: spec.sample_rate,
        channels,
        data,
    })
}

fn collect_bytes<S, const N: usize>(
    samples: impl Iterator<Item = Result<S, hound::Error>>,
    to_bytes: impl Fn(S) -> [u8; N],
) -> Result<Vec<u8>, hound::Error> {
    let mut data = Vec::new();

    for sample in samples {
        data.extend_from_slice(&to_bytes(sample?));
    }

    Ok(data)
}

/// Error returned when a source audio file could not be read.
#[derive(Debug)]
pub struct SourceError {
    path: PathBuf,
    source: Box<dyn Error + Send + Sync>,
}

impl SourceError {
    /// Creates an error for the file at `path`.
    pub fn new(path: impl Into<PathBuf>, source: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
        }
    }

    fn factory(path: &Path) -> impl FnOnce(hound::Error) -> Self + '_ {
        move |source| Self::new(path, source)
    }

    /// Returns the path of the file that could not be read.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&format!("failed to read audio file {}", self.path.display()))
    }
}

impl Error for SourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.source.as_ref())
    }
}

#[cfg(test)]
mod test {
    use super::{SourceReader, WavSource};
    use crate::header::AudioFormat;
    use hound::{SampleFormat, WavSpec, WavWriter};
    use std::path::Path;
    use tempfile::tempdir;

    fn write_fixture(path: &Path, bits_per_sample: u16, sample_format: SampleFormat) {
        let spec = WavSpec {
            channels: 2,
            sample_rate: 22050,
            bits_per_sample,
            sample_format,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();

        match (sample_format, bits_per_sample) {
            (SampleFormat::Float, _) => {
                writer.write_sample(0.25f32).unwrap();
                writer.write_sample(-0.25f32).unwrap();
            }
            (_, 8) => {
                writer.write_sample(-128i8).unwrap();
                writer.write_sample(127i8).unwrap();
            }
            (_, 16) => {
                writer.write_sample(-2i16).unwrap();
                writer.write_sample(300i16).unwrap();
            }
            _ => {
                writer.write_sample(-2i32).unwrap();
                writer.write_sample(0x12_3456i32).unwrap();
            }
        }

        writer.finalize().unwrap();
    }

    #[test]
    fn read_wav_sources() {
        let dir = tempdir().unwrap();

        let cases: [(u16, SampleFormat, AudioFormat, Vec<u8>); 5] = [
            (8, SampleFormat::Int, AudioFormat::Pcm8, vec![0x00, 0xFF]),
            (16, SampleFormat::Int, AudioFormat::Pcm16, vec![0xFE, 0xFF, 0x2C, 0x01]),
            (
                24,
                SampleFormat::Int,
                AudioFormat::Pcm24,
                vec![0xFE, 0xFF, 0xFF, 0x56, 0x34, 0x12],
            ),
            (
                32,
                SampleFormat::Int,
                AudioFormat::Pcm32,
                vec![0xFE, 0xFF, 0xFF, 0xFF, 0x56, 0x34, 0x12, 0x00],
            ),
            (
                32,
                SampleFormat::Float,
                AudioFormat::PcmFloat,
                [0.25f32, -0.25].iter().flat_map(|s| s.to_le_bytes()).collect(),
            ),
        ];

        for (bits, sample_format, format, data) in cases {
            let path = dir.path().join(format!("{bits}-{sample_format:?}.wav"));
            write_fixture(&path, bits, sample_format);

            let audio = WavSource.read(&path).unwrap();

            assert_eq!(audio.format, format);
            assert_eq!(audio.sample_rate, 22050);
            assert_eq!(audio.channels.get(), 2);
            assert_eq!(audio.data, data);
        }
    }

    #[test]
    fn missing_file_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.wav");

        assert!(WavSource.read(&path).is_err_and(|e| e.path() == path));
    }

    #[test]
    fn non_wav_file_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("noise.wav");
        std::fs::write(&path, b"not a riff file").unwrap();

        assert!(WavSource.read(&path).is_err());
    }
}
