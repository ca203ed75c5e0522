use crate::header::{
    name,
    sample::{RecordLayout, SampleRecord, MAX_CHANNELS},
    AudioFormat, ContainerHeader, Loop, Version, HEADER_SIZE,
};
use crate::source::{SourceAudio, SourceReader};
use crate::write::Writer;
use error::{PackError, PackErrorKind};
use log::debug;
use std::{io::Write, num::NonZeroU16, path::Path};

pub(crate) mod error;

/// Audio to be packed into a sound bank.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Sample {
    name: Box<str>,
    format: AudioFormat,
    sample_rate: u32,
    channels: NonZeroU16,
    stream_loop: Option<Loop>,
    data: Vec<u8>,
}

impl Sample {
    /// Creates a sample from data already in `format`. The data is stored as is.
    pub fn new(
        name: impl Into<Box<str>>,
        format: AudioFormat,
        sample_rate: u32,
        channels: NonZeroU16,
        data: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            format,
            sample_rate,
            channels,
            stream_loop: None,
            data,
        }
    }

    /// Creates a sample of interleaved 16-bit little-endian PCM.
    pub fn pcm16(
        name: impl Into<Box<str>>,
        sample_rate: u32,
        channels: NonZeroU16,
        data: Vec<u8>,
    ) -> Self {
        Self::new(name, AudioFormat::Pcm16, sample_rate, channels, data)
    }

    /// Creates a sample from audio read by a [`SourceReader`].
    pub fn from_source(name: impl Into<Box<str>>, audio: SourceAudio) -> Self {
        Self::new(
            name,
            audio.format,
            audio.sample_rate,
            audio.channels,
            audio.data,
        )
    }

    /// Sets the loop points of the sample. A loop of `0..0` means no loop.
    #[must_use]
    pub fn with_loop(self, start: u32, end: u32) -> Self {
        Self {
            stream_loop: Loop::new(start, end),
            ..self
        }
    }

    /// Returns the name of the sample.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the audio format of the sample data.
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

    /// Returns the loop points of the sample, if it loops.
    #[must_use]
    pub fn stream_loop(&self) -> Option<Loop> {
        self.stream_loop
    }

    /// Returns the sample data.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Sizes of every section and the sample header of each sample, computed before anything is written.
#[derive(Debug)]
struct Layout {
    layout: RecordLayout,
    sample_headers_size: u32,
    name_table_size: u32,
    payload_size: u32,
    records: Vec<SampleRecord>,
}

impl Layout {
    fn new(samples: &[Sample], version: Version) -> Result<Self, PackError> {
        if samples.is_empty() {
            return Err(PackError::new(PackErrorKind::EmptyInput));
        }

        let layout = RecordLayout::from(version);

        for (index, sample) in samples.iter().enumerate() {
            check_sample(layout, index, sample)?;
        }

        let sample_headers_size = to_u32(
            samples
                .iter()
                .map(|sample| layout.record_size(sample.stream_loop))
                .sum(),
        )?;
        let name_table_size = to_u32(name::table_size(samples.iter().map(Sample::name)))?;

        let sizes = samples
            .iter()
            .enumerate()
            .map(|(index, sample)| {
                u32::try_from(sample.data.len())
                    .map_err(|_| PackError::at(index, PackErrorKind::TooLarge))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let data_start = to_u32(HEADER_SIZE)?
            .checked_add(sample_headers_size)
            .and_then(|start| start.checked_add(name_table_size))
            .ok_or_else(|| PackError::new(PackErrorKind::TooLarge))?;

        // offset of each sample is the running total of the sizes before it
        let offsets = sizes
            .iter()
            .try_fold(vec![data_start], |mut offsets, &size| {
                let next = offsets.last()?.checked_add(size)?;
                offsets.push(next);
                Some(offsets)
            })
            .ok_or_else(|| PackError::new(PackErrorKind::TooLarge))?;

        let payload_size = offsets[sizes.len()] - data_start;

        let records = samples
            .iter()
            .zip(sizes)
            .zip(offsets)
            .map(|((sample, size), offset)| SampleRecord {
                size,
                offset,
                format: sample.format,
                channels: sample.channels,
                sample_rate: sample.sample_rate,
                stream_loop: sample.stream_loop,
            })
            .collect();

        Ok(Self {
            layout,
            sample_headers_size,
            name_table_size,
            payload_size,
            records,
        })
    }
}

fn check_sample(layout: RecordLayout, index: usize, sample: &Sample) -> Result<(), PackError> {
    let channels = sample.channels.get();

    if channels > MAX_CHANNELS {
        return Err(PackError::at(
            index,
            PackErrorKind::TooManyChannels { channels },
        ));
    }

    if !layout.can_store(sample.format) {
        return Err(PackError::at(
            index,
            PackErrorKind::UnrepresentableFormat {
                format: sample.format,
            },
        ));
    }

    if sample.name.contains('\0') {
        return Err(PackError::at(index, PackErrorKind::NameContainsNul));
    }

    Ok(())
}

fn to_u32(value: usize) -> Result<u32, PackError> {
    u32::try_from(value).map_err(|_| PackError::new(PackErrorKind::TooLarge))
}

/// Writes a sound bank holding `samples`, in order, to `sink`.
///
/// Every size and offset is computed before the first byte is written,
/// so a sample that can't be stored is rejected without touching `sink`.
///
/// # Errors
/// Fails if `samples` is empty, if a sample can't be stored in the sample headers of `version`,
/// if the sound bank would be larger than 4 GiB, or if writing to `sink` fails.
pub fn write_bank<W: Write>(samples: &[Sample], version: Version, sink: W) -> Result<(), PackError> {
    let layout = Layout::new(samples, version)?;

    let container = ContainerHeader {
        version,
        sample_count: to_u32(samples.len())?,
        sample_headers_size: layout.sample_headers_size,
        name_table_size: layout.name_table_size,
        payload_size: layout.payload_size,
        mode_flags: 0,
    };

    debug!(
        "packing {} samples as {version:?}: {} bytes of sample headers, {} bytes of names, {} bytes of sample data",
        container.sample_count,
        container.sample_headers_size,
        container.name_table_size,
        container.payload_size
    );

    let mut writer = Writer::new(sink);

    container.write(&mut writer)?;

    for record in &layout.records {
        layout.layout.write(&mut writer, record)?;
    }

    name::write_names(&mut writer, samples.iter().map(Sample::name))?;

    for sample in samples {
        writer.bytes(&sample.data)?;
    }

    writer.flush()?;

    debug!("wrote sound bank of {} bytes", writer.position());

    Ok(())
}

/// Creates a sound bank holding `samples`, in order.
///
/// # Errors
/// See [`write_bank`].
pub fn pack(samples: &[Sample], version: Version) -> Result<Vec<u8>, PackError> {
    let mut bytes = Vec::new();
    write_bank(samples, version, &mut bytes)?;
    Ok(bytes)
}

/// Creates a sound bank from audio files, naming each sample after its file name without the extension.
///
/// Every path is checked before any file is read.
///
/// # Errors
/// Fails with [`PackErrorKind::MissingInput`] if a file does not exist, and with
/// [`PackErrorKind::SourceAudio`] if `reader` can't read one. Otherwise, see [`write_bank`].
pub fn pack_files<P: AsRef<Path>>(
    paths: &[P],
    version: Version,
    reader: &impl SourceReader,
) -> Result<Vec<u8>, PackError> {
    if paths.is_empty() {
        return Err(PackError::new(PackErrorKind::EmptyInput));
    }

    for (index, path) in paths.iter().enumerate() {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(PackError::missing(index, path));
        }
    }

    let samples = paths
        .iter()
        .enumerate()
        .map(|(index, path)| {
            let path = path.as_ref();
            let name = path
                .file_stem()
                .map_or_else(String::new, |stem| stem.to_string_lossy().into_owned());

            reader
                .read(path)
                .map(|audio| Sample::from_source(name, audio))
                .map_err(PackError::source_audio(index))
        })
        .collect::<Result<Vec<_>, _>>()?;

    pack(&samples, version)
}

#[cfg(test)]
mod test {
    use super::error::PackErrorKind;
    use super::{pack, pack_files, write_bank, Layout, Sample};
    use crate::bank::parse;
    use crate::header::{AudioFormat, Version, HEADER_SIZE};
    use crate::source::{SourceAudio, SourceError, SourceReader, WavSource};
    use hound::{SampleFormat, WavSpec, WavWriter};
    use std::cell::Cell;
    use std::io::{Result as IoResult, Write};
    use std::num::NonZeroU16;
    use std::path::Path;
    use tempfile::tempdir;

    fn channels(n: u16) -> NonZeroU16 {
        NonZeroU16::new(n).unwrap()
    }

    #[test]
    fn reject_empty_input() {
        for version in [Version::V1, Version::V5] {
            assert!(pack(&[], version).is_err_and(|e| e.kind() == PackErrorKind::EmptyInput));
        }

        let no_paths: [&str; 0] = [];
        assert!(pack_files(&no_paths, Version::V5, &WavSource)
            .is_err_and(|e| e.kind() == PackErrorKind::EmptyInput));
    }

    #[test]
    fn layout_offsets_follow_sections() {
        let samples = [
            Sample::pcm16("a", 44100, channels(1), vec![0; 10]),
            Sample::pcm16("bb", 44100, channels(1), vec![0; 6]).with_loop(0, 3),
            Sample::pcm16("", 44100, channels(1), vec![]),
        ];
        let layout = Layout::new(&samples, Version::V5).unwrap();

        assert_eq!(layout.sample_headers_size, 12 + 20 + 12);
        assert_eq!(layout.name_table_size, 2 + 3 + 1);
        assert_eq!(layout.payload_size, 16);

        let start = u32::try_from(HEADER_SIZE).unwrap() + 44 + 6;
        let offsets = layout
            .records
            .iter()
            .map(|record| record.offset)
            .collect::<Vec<_>>();
        assert_eq!(offsets, [start, start + 10, start + 16]);
    }

    #[test]
    fn payloads_are_stored_in_order() {
        let samples = [
            Sample::pcm16("x", 8000, channels(1), vec![1; 4]),
            Sample::pcm16("y", 8000, channels(1), vec![2; 4]),
        ];
        let bytes = pack(&samples, Version::V3).unwrap();
        let descriptors = parse(&bytes).unwrap();

        assert_eq!(descriptors[0].data(&bytes), Some([1; 4].as_slice()));
        assert_eq!(descriptors[1].data(&bytes), Some([2; 4].as_slice()));
    }

    #[test]
    fn reject_unrepresentable_samples() {
        let too_wide = [
            Sample::pcm16("ok", 44100, channels(2), vec![0; 4]),
            Sample::pcm16("wide", 44100, channels(6), vec![0; 12]),
        ];
        assert!(pack(&too_wide, Version::V5).is_err_and(|e| e.kind()
            == PackErrorKind::TooManyChannels { channels: 6 }
            && e.index() == Some(1)));

        let vorbis = [Sample::new("v", AudioFormat::Vorbis, 44100, channels(1), vec![0; 4])];
        assert!(pack(&vorbis, Version::V2).is_err_and(|e| e.kind()
            == PackErrorKind::UnrepresentableFormat {
                format: AudioFormat::Vorbis
            }));
        assert!(pack(&vorbis, Version::V4).is_ok());

        let nul = [Sample::pcm16("a\0b", 44100, channels(1), vec![0; 2])];
        assert!(pack(&nul, Version::V5).is_err_and(|e| e.kind() == PackErrorKind::NameContainsNul));
    }

    #[test]
    fn rejected_samples_write_nothing() {
        let samples = [Sample::pcm16("wide", 44100, channels(5), vec![0; 10])];
        let mut sink = Vec::new();

        assert!(write_bank(&samples, Version::V1, &mut sink).is_err());
        assert!(sink.is_empty());
    }

    #[test]
    fn write_failure_is_io_error() {
        struct FullWriter;

        impl Write for FullWriter {
            fn write(&mut self, _buf: &[u8]) -> IoResult<usize> {
                Ok(0)
            }

            fn flush(&mut self) -> IoResult<()> {
                Ok(())
            }
        }

        let samples = [Sample::pcm16("a", 44100, channels(1), vec![0; 2])];

        assert!(write_bank(&samples, Version::V5, FullWriter)
            .is_err_and(|e| e.kind() == PackErrorKind::Io));
    }

    #[test]
    fn pack_loops_and_formats() {
        let samples = [
            Sample::new("f", AudioFormat::PcmFloat, 48000, channels(2), vec![0; 16])
                .with_loop(2, 7),
            Sample::new("m", AudioFormat::Mpeg, 32000, channels(1), vec![0xFF; 3]),
            Sample::pcm16("n", 32000, channels(1), vec![0; 2]).with_loop(0, 0),
        ];

        for version in [Version::V3, Version::V5] {
            let bytes = pack(&samples, version).unwrap();
            let descriptors = parse(&bytes).unwrap();

            assert!(descriptors[0]
                .stream_loop()
                .is_some_and(|l| l.start() == 2 && l.end() == 7));
            assert_eq!(descriptors[1].format(), AudioFormat::Mpeg);
            assert_eq!(descriptors[2].stream_loop(), None);
        }
    }

    fn write_wav(path: &Path, values: &[i16]) {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 24000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &value in values {
            writer.write_sample(value).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn pack_wav_files() {
        let dir = tempdir().unwrap();
        let kick = dir.path().join("kick.wav");
        let snare = dir.path().join("snare.wav");
        write_wav(&kick, &[1, -1]);
        write_wav(&snare, &[256]);

        let bytes = pack_files(&[&kick, &snare], Version::V5, &WavSource).unwrap();
        let descriptors = parse(&bytes).unwrap();

        assert_eq!(descriptors[0].name(), "kick");
        assert_eq!(descriptors[0].sample_rate(), 24000);
        assert_eq!(descriptors[0].format(), AudioFormat::Pcm16);
        assert_eq!(descriptors[0].data(&bytes), Some([1, 0, 0xFF, 0xFF].as_slice()));
        assert_eq!(descriptors[1].name(), "snare");
        assert_eq!(descriptors[1].data(&bytes), Some([0, 1].as_slice()));
    }

    // Counts reads, so tests can tell whether any file was read at all.
    struct CountingSource(Cell<u32>);

    impl SourceReader for CountingSource {
        fn read(&self, path: &Path) -> Result<SourceAudio, SourceError> {
            self.0.set(self.0.get() + 1);
            WavSource.read(path)
        }
    }

    #[test]
    fn missing_file_fails_before_reading() {
        let dir = tempdir().unwrap();
        let present = dir.path().join("present.wav");
        let absent = dir.path().join("absent.wav");
        write_wav(&present, &[0]);

        let source = CountingSource(Cell::new(0));
        let result = pack_files(&[&present, &absent], Version::V5, &source);

        assert!(result.is_err_and(|e| e.kind() == PackErrorKind::MissingInput
            && e.index() == Some(1)
            && e.path() == Some(absent.as_path())));
        assert_eq!(source.0.get(), 0);
    }

    #[test]
    fn unreadable_file_is_source_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.wav");
        std::fs::write(&path, b"RIFF").unwrap();

        assert!(pack_files(&[&path], Version::V5, &WavSource)
            .is_err_and(|e| e.kind() == PackErrorKind::SourceAudio && e.index() == Some(0)));
    }
}
