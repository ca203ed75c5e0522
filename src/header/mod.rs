use crate::read::Reader;
use crate::write::{WriteResult, Writer};
pub(crate) mod error;
pub(crate) mod name;
pub(crate) mod sample;
pub(crate) mod table;
use error::{HeaderError, HeaderErrorKind};
use log::debug;
use sample::RecordLayout;
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    io::{Read, Write},
    iter::zip,
    num::NonZeroU16,
};

pub(crate) const FSB_MAGIC: [u8; 4] = *b"FSB5";

/// Size of the fixed container header: the signature followed by six 32-bit fields.
pub(crate) const HEADER_SIZE: usize = 28;

/// Fixed-size header at the start of every sound bank.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ContainerHeader {
    pub(crate) version: Version,
    pub(crate) sample_count: u32,
    pub(crate) sample_headers_size: u32,
    pub(crate) name_table_size: u32,
    pub(crate) payload_size: u32,
    pub(crate) mode_flags: u32,
}

impl ContainerHeader {
    pub(crate) fn parse<R: Read>(reader: &mut Reader<R>) -> Result<Self, HeaderError> {
        // check for file signature
        match reader.take_const() {
            Ok(data) if data == FSB_MAGIC => Ok(()),
            Err(e) => Err(HeaderError::new_with_source(HeaderErrorKind::Magic, e)),
            _ => Err(HeaderError::new(HeaderErrorKind::Magic)),
        }?;

        // determines how sample headers are read
        let version = reader
            .le_u32()
            .map_err(HeaderError::factory(HeaderErrorKind::Version))
            .and_then(Version::from_number)?;

        let sample_count = reader
            .le_u32()
            .map_err(HeaderError::factory(HeaderErrorKind::SampleCount))?;

        let sample_headers_size = reader
            .le_u32()
            .map_err(HeaderError::factory(HeaderErrorKind::SampleHeadersSize))?;

        let name_table_size = reader
            .le_u32()
            .map_err(HeaderError::factory(HeaderErrorKind::NameTableSize))?;

        let payload_size = reader
            .le_u32()
            .map_err(HeaderError::factory(HeaderErrorKind::PayloadSize))?;

        // no mode flags are interpreted, but they are kept for inspection
        let mode_flags = reader
            .le_u32()
            .map_err(HeaderError::factory(HeaderErrorKind::ModeFlags))?;

        Ok(Self {
            version,
            sample_count,
            sample_headers_size,
            name_table_size,
            payload_size,
            mode_flags,
        })
    }

    pub(crate) fn write<W: Write>(&self, writer: &mut Writer<W>) -> WriteResult<()> {
        writer.bytes(&FSB_MAGIC)?;
        writer.le_u32(self.version.into())?;
        writer.le_u32(self.sample_count)?;
        writer.le_u32(self.sample_headers_size)?;
        writer.le_u32(self.name_table_size)?;
        writer.le_u32(self.payload_size)?;
        writer.le_u32(self.mode_flags)
    }
}

/// Everything stored in a sound bank before its sample data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Header {
    pub(crate) container: ContainerHeader,
    pub(crate) samples: Box<[SampleDescriptor]>,
}

impl Header {
    pub(crate) fn parse<R: Read>(reader: &mut Reader<R>) -> Result<Self, HeaderError> {
        let container = ContainerHeader::parse(reader)?;

        debug!(
            "read {:?} header: {} samples, {} bytes of sample headers, {} bytes of names, {} bytes of sample data",
            container.version,
            container.sample_count,
            container.sample_headers_size,
            container.name_table_size,
            container.payload_size
        );

        let layout = RecordLayout::from(container.version);
        let mut records = Vec::new();

        for index in 0..container.sample_count {
            records.push(layout.parse(reader, index)?);
        }

        let actual = reader.position();
        let header_size = usize::try_from(container.sample_headers_size)
            .ok()
            .and_then(|size| HEADER_SIZE.checked_add(size))
            .ok_or_else(|| {
                HeaderError::new(HeaderErrorKind::WrongHeaderSize {
                    expected: usize::MAX,
                    actual,
                })
            })?;

        // make sure base header + sample headers have been read
        reader
            .advance_to(header_size)
            .map_err(HeaderError::factory(HeaderErrorKind::WrongHeaderSize {
                expected: header_size,
                actual,
            }))?;

        let names = name::read_names(reader, container.sample_count, container.name_table_size)?;

        let samples = zip(records, names)
            .map(|(record, name)| record.with_name(name))
            .collect();

        Ok(Self { container, samples })
    }
}

/// Layout version of a sound bank, from FSB1 to FSB5.
///
/// The version decides how each sample header is laid out:
/// FSB1 and FSB2 store a 3-bit audio format, FSB3 and FSB4 widen it to 5 bits,
/// and FSB5 packs format, channels and a sample rate index into one 32-bit word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Version {
    /// FSB1.
    V1,
    /// FSB2. Same sample header layout as FSB1.
    V2,
    /// FSB3.
    V3,
    /// FSB4. Same sample header layout as FSB3, plus an unused 32-bit flags word.
    V4,
    /// FSB5.
    V5,
}

impl Version {
    pub(crate) fn from_number(value: u32) -> Result<Self, HeaderError> {
        match value {
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            3 => Ok(Self::V3),
            4 => Ok(Self::V4),
            5 => Ok(Self::V5),
            version => Err(HeaderError::new(HeaderErrorKind::UnknownVersion { version })),
        }
    }
}

impl From<Version> for u32 {
    fn from(value: Version) -> Self {
        match value {
            Version::V1 => 1,
            Version::V2 => 2,
            Version::V3 => 3,
            Version::V4 => 4,
            Version::V5 => 5,
        }
    }
}

/// Represents known audio formats of samples within a sound bank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum AudioFormat {
    /// PCM with 8-bit integer samples.
    Pcm8,
    /// PCM with 16-bit integer samples.
    Pcm16,
    /// PCM with 24-bit integer samples.
    Pcm24,
    /// PCM with 32-bit integer samples.
    Pcm32,
    /// PCM with 32-bit float (IEEE 754) samples.
    PcmFloat,
    /// GC ADPCM, used in games for the GameCube, Wii and Wii U.
    GcAdpcm,
    /// IMA ADPCM, developed by the
    /// [Interactive Multimedia Association](https://en.wikipedia.org/wiki/Interactive_Multimedia_Association).
    ImaAdpcm,
    /// VAG, an ADPCM format used in games for the PS1, PS2, and PSP.
    Vag,
    /// HEVAG, an ADPCM format used in games for the PS Vita and PS4.
    /// HEVAG is an improved version of VAG that is compatible with the original format.
    HeVag,
    /// XMA, used in games for the Xbox 360.
    /// XMA is based on the Windows Media format (WMA).
    Xma,
    /// MPEG, developed by the
    /// [ISO/IEC Moving Picture Experts Group](https://en.wikipedia.org/wiki/Moving_Picture_Experts_Group).
    Mpeg,
    /// CELT, developed by the [Xiph.Org Foundation](https://en.wikipedia.org/wiki/Xiph.Org_Foundation).
    /// The CELT format is obsolete, and its functionality has been merged into Opus.
    Celt,
    /// ATRAC9, used in PlayStation games and debuting with the PS Vita.
    /// ATRAC9 is part of the ATRAC family of audio formats.
    Atrac9,
    /// xWMA, used in games for Windows and Xbox systems.
    /// xWMA is similar to the WAVE and XMA formats.
    Xwma,
    /// Vorbis, developed by the [Xiph.Org Foundation](https://en.wikipedia.org/wiki/Xiph.Org_Foundation).
    Vorbis,
    /// FADPCM, an ADPCM format developed by Firelight Technologies for use with FMOD.
    FAdpcm,
    /// Opus, developed by the [Xiph.Org Foundation](https://en.wikipedia.org/wiki/Xiph.Org_Foundation).
    /// Opus is intended to replace older Xiph.Org formats such as Vorbis.
    Opus,
}

impl AudioFormat {
    pub(crate) fn from_flag(flag: u8) -> Option<Self> {
        match flag {
            1 => Some(Self::Pcm8),
            2 => Some(Self::Pcm16),
            3 => Some(Self::Pcm24),
            4 => Some(Self::Pcm32),
            5 => Some(Self::PcmFloat),
            6 => Some(Self::GcAdpcm),
            7 => Some(Self::ImaAdpcm),
            8 => Some(Self::Vag),
            9 => Some(Self::HeVag),
            10 => Some(Self::Xma),
            11 => Some(Self::Mpeg),
            12 => Some(Self::Celt),
            13 => Some(Self::Atrac9),
            14 => Some(Self::Xwma),
            15 => Some(Self::Vorbis),
            16 => Some(Self::FAdpcm),
            17 => Some(Self::Opus),
            _ => None,
        }
    }

    pub(crate) fn flag(self) -> u8 {
        match self {
            Self::Pcm8 => 1,
            Self::Pcm16 => 2,
            Self::Pcm24 => 3,
            Self::Pcm32 => 4,
            Self::PcmFloat => 5,
            Self::GcAdpcm => 6,
            Self::ImaAdpcm => 7,
            Self::Vag => 8,
            Self::HeVag => 9,
            Self::Xma => 10,
            Self::Mpeg => 11,
            Self::Celt => 12,
            Self::Atrac9 => 13,
            Self::Xwma => 14,
            Self::Vorbis => 15,
            Self::FAdpcm => 16,
            Self::Opus => 17,
        }
    }

    /// Returns `true` for the uncompressed PCM formats.
    #[must_use]
    pub fn is_pcm(self) -> bool {
        self.bits_per_sample().is_some()
    }

    /// Returns the width of one PCM sample in bits, or `None` for compressed formats.
    #[must_use]
    pub fn bits_per_sample(self) -> Option<u16> {
        match self {
            Self::Pcm8 => Some(8),
            Self::Pcm16 => Some(16),
            Self::Pcm24 => Some(24),
            Self::Pcm32 | Self::PcmFloat => Some(32),
            _ => None,
        }
    }
}

impl Display for AudioFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::Pcm8 => "PCM (8-bit, integer)",
            Self::Pcm16 => "PCM (16-bit, integer)",
            Self::Pcm24 => "PCM (24-bit, integer)",
            Self::Pcm32 => "PCM (32-bit, integer)",
            Self::PcmFloat => "PCM (32-bit, float)",
            Self::GcAdpcm => "GC ADPCM",
            Self::ImaAdpcm => "IMA ADPCM",
            Self::Vag => "VAG",
            Self::HeVag => "HEVAG",
            Self::Xma => "XMA",
            Self::Mpeg => "MPEG",
            Self::Celt => "CELT",
            Self::Atrac9 => "ATRAC9",
            Self::Xwma => "xWMA",
            Self::Vorbis => "Vorbis",
            Self::FAdpcm => "FADPCM",
            Self::Opus => "Opus",
        })
    }
}

/// Loop points of a sample.
///
/// A loop of `0..0` is how sound banks say "no loop", so it is never represented by this type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Loop {
    start: u32,
    end: u32,
}

impl Loop {
    pub(crate) fn new(start: u32, end: u32) -> Option<Self> {
        (start != 0 || end != 0).then_some(Self { start, end })
    }

    /// Returns the starting position of the loop.
    #[must_use]
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Returns the ending position of the loop.
    #[must_use]
    pub fn end(&self) -> u32 {
        self.end
    }
}

/// Metadata of one sample in a sound bank, and where its data is.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SampleDescriptor {
    pub(crate) name: Box<str>,
    pub(crate) format: AudioFormat,
    pub(crate) sample_rate: u32,
    pub(crate) channels: NonZeroU16,
    pub(crate) stream_loop: Option<Loop>,
    pub(crate) size: u32,
    pub(crate) offset: u32,
}

impl SampleDescriptor {
    /// Returns the name of the sample.
    /// Samples without a stored name are named `sample_{index}`.
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

    /// Returns the size of the sample data, in bytes.
    #[must_use]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Returns the offset of the sample data, in bytes, from the start of the sound bank.
    #[must_use]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Returns this sample's data within the sound bank it was read from,
    /// or `None` if the data doesn't fit in `bank`.
    #[must_use]
    pub fn data<'bank>(&self, bank: &'bank [u8]) -> Option<&'bank [u8]> {
        let start = self.offset as usize;
        bank.get(start..start.checked_add(self.size as usize)?)
    }
}

#[cfg(test)]
mod test {
    use super::error::{HeaderErrorKind::*, SampleErrorKind};
    use super::{AudioFormat, ContainerHeader, Header, Loop, FSB_MAGIC};
    use crate::read::{Needed, ReadErrorKind, Reader};
    use crate::write::Writer;

    fn header_bytes(version: u32, sample_count: u32, sizes: [u32; 3]) -> Vec<u8> {
        let mut buf = Vec::from(FSB_MAGIC);
        for field in [version, sample_count, sizes[0], sizes[1], sizes[2], 0] {
            buf.extend_from_slice(&field.to_le_bytes());
        }
        buf
    }

    #[test]
    fn read_magic() {
        let mut reader;

        reader = Reader::new(b"".as_slice());
        assert!(ContainerHeader::parse(&mut reader).is_err_and(|e| e.kind() == Magic));

        reader = Reader::new(b"abcd".as_slice());
        assert!(ContainerHeader::parse(&mut reader).is_err_and(|e| e.kind() == Magic));

        reader = Reader::new(b"FSB4\x04\x00\x00\x00".as_slice());
        assert!(ContainerHeader::parse(&mut reader).is_err_and(|e| e.kind() == Magic));
        assert_eq!(reader.position(), 4);

        reader = Reader::new(FSB_MAGIC.as_slice());
        assert!(ContainerHeader::parse(&mut reader).is_err_and(|e| e.kind() == Version));
    }

    #[test]
    fn read_version() {
        let mut reader;

        let data = b"FSB5\x01\x00";
        reader = Reader::new(data.as_slice());
        assert!(ContainerHeader::parse(&mut reader).is_err_and(|e| e.kind() == Version));

        for version in [0, 6, 0xFF] {
            let data = header_bytes(version, 1, [0; 3]);
            reader = Reader::new(data.as_slice());
            assert!(ContainerHeader::parse(&mut reader)
                .is_err_and(|e| e.kind() == UnknownVersion { version }));
        }

        let data = b"FSB5\x05\x00\x00\x00";
        reader = Reader::new(data.as_slice());
        assert!(ContainerHeader::parse(&mut reader).is_err_and(|e| e.kind() == SampleCount));
    }

    #[test]
    fn read_size_fields() {
        let full = header_bytes(3, 2, [44, 10, 100]);

        let cases = [
            (12, SampleHeadersSize),
            (16, NameTableSize),
            (20, PayloadSize),
            (24, ModeFlags),
        ];

        for (len, kind) in cases {
            let mut reader = Reader::new(&full[..len]);
            assert!(ContainerHeader::parse(&mut reader).is_err_and(|e| e.kind() == kind));
        }

        let mut reader = Reader::new(full.as_slice());
        let header = ContainerHeader::parse(&mut reader).unwrap();

        assert_eq!(
            header,
            ContainerHeader {
                version: super::Version::V3,
                sample_count: 2,
                sample_headers_size: 44,
                name_table_size: 10,
                payload_size: 100,
                mode_flags: 0,
            }
        );
        assert_eq!(reader.position(), 28);
    }

    #[test]
    fn write_container_header() {
        let header = ContainerHeader {
            version: super::Version::V5,
            sample_count: 1,
            sample_headers_size: 12,
            name_table_size: 4,
            payload_size: 8,
            mode_flags: 0,
        };

        let mut buf = Vec::new();
        header.write(&mut Writer::new(&mut buf)).unwrap();

        assert_eq!(buf, header_bytes(5, 1, [12, 4, 8]));
    }

    fn explicit_record(offset: u32, flags: u16, sample_rate: u32, extra_flags: bool) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&4u32.to_le_bytes());
        buf.extend_from_slice(&offset.to_le_bytes());
        buf.extend_from_slice(&flags.to_le_bytes());
        buf.extend_from_slice(&sample_rate.to_le_bytes());
        buf.extend_from_slice(&[0; 8]);
        if extra_flags {
            buf.extend_from_slice(&[0; 4]);
        }
        buf
    }

    #[test]
    fn read_minimal_bank_per_version() {
        // the payload follows a 28-byte header, one record, and the 5-byte name table
        let compact = {
            let mut buf = Vec::new();
            buf.extend_from_slice(&4u32.to_le_bytes());
            buf.extend_from_slice(&0x02u32.to_le_bytes());
            buf.extend_from_slice(&45u32.to_le_bytes());
            buf
        };

        // (version, sample header bytes, expected format, channels, sample rate)
        let cases = [
            (1, explicit_record(55, 0x0001, 8000, false), AudioFormat::Pcm8, 1, 8000),
            (2, explicit_record(55, 0x000B, 11025, false), AudioFormat::Pcm24, 2, 11025),
            (3, explicit_record(55, 0x0025, 32000, false), AudioFormat::PcmFloat, 2, 32000),
            (4, explicit_record(59, 0x0065, 32000, true), AudioFormat::PcmFloat, 4, 32000),
            (5, compact, AudioFormat::Pcm16, 1, 4000),
        ];

        for (version, record, format, channels, sample_rate) in cases {
            let record_len = u32::try_from(record.len()).unwrap();
            let mut data = header_bytes(version, 1, [record_len, 5, 4]);
            data.extend_from_slice(&record);
            data.extend_from_slice(b"tone\0");
            data.extend_from_slice(&[1, 2, 3, 4]);

            let mut reader = Reader::new(data.as_slice());
            let header = Header::parse(&mut reader).unwrap();
            let sample = &header.samples[0];

            assert_eq!(header.samples.len(), 1);
            assert_eq!(sample.name(), "tone");
            assert_eq!(sample.format(), format);
            assert_eq!(sample.channels().get(), channels);
            assert_eq!(sample.sample_rate(), sample_rate);
            assert_eq!(sample.stream_loop(), None);
            assert_eq!(sample.size(), 4);
            assert_eq!(sample.data(&data), Some([1, 2, 3, 4].as_slice()));
        }
    }

    #[test]
    fn read_sample_headers() {
        // declares one sample but stops after the container header
        let data = header_bytes(5, 1, [12, 0, 0]);
        let mut reader = Reader::new(data.as_slice());

        assert!(Header::parse(&mut reader).is_err_and(|e| e.kind() == SampleHeader
            && e.sample_err_kind() == Some(SampleErrorKind::Size)
            && e.read_error_kind().is_some_and(|kind| matches!(
                kind,
                ReadErrorKind::Incomplete(Needed::Size(_))
            ))));
    }

    #[test]
    fn sample_headers_larger_than_declared() {
        let mut data = header_bytes(5, 1, [8, 0, 0]);
        data.extend_from_slice(b"\x00\x00\x00\x00\x02\x00\x00\x00\x24\x00\x00\x00");
        let mut reader = Reader::new(data.as_slice());

        assert!(Header::parse(&mut reader).is_err_and(|e| e.kind()
            == WrongHeaderSize {
                expected: 36,
                actual: 40
            }));
    }

    #[test]
    fn huge_sample_headers_size() {
        let data = header_bytes(5, 0, [u32::MAX, 0, 0]);
        let mut reader = Reader::new(data.as_slice());

        assert!(Header::parse(&mut reader)
            .is_err_and(|e| matches!(e.kind(), WrongHeaderSize { actual: 28, .. })));
    }

    #[test]
    fn sample_headers_padding_is_skipped() {
        let mut data = header_bytes(5, 1, [16, 2, 0]);
        data.extend_from_slice(b"\x00\x00\x00\x00\x02\x00\x00\x00\x2E\x00\x00\x00");
        data.extend_from_slice(&[0xAA; 4]);
        data.extend_from_slice(b"a\0");
        let mut reader = Reader::new(data.as_slice());
        let header = Header::parse(&mut reader).unwrap();

        assert_eq!(header.samples[0].name(), "a");
        assert_eq!(reader.position(), 46);
    }

    #[test]
    fn read_name_table() {
        let mut data = header_bytes(5, 1, [12, 10, 0]);
        data.extend_from_slice(b"\x00\x00\x00\x00\x02\x00\x00\x00\x32\x00\x00\x00");
        data.extend_from_slice(b"abc\0");
        let mut reader = Reader::new(data.as_slice());

        assert!(Header::parse(&mut reader).is_err_and(|e| e.kind() == NameTable));
    }

    #[test]
    fn loop_points() {
        assert_eq!(Loop::new(0, 0), None);
        assert!(Loop::new(0, 10).is_some_and(|l| l.start() == 0 && l.end() == 10));
        assert!(Loop::new(10, 0).is_some());
    }

    #[test]
    fn format_flags_are_consistent() {
        for flag in 0..=u8::MAX {
            if let Some(format) = AudioFormat::from_flag(flag) {
                assert_eq!(format.flag(), flag);
            }
        }
        assert_eq!(AudioFormat::from_flag(0), None);
        assert_eq!(AudioFormat::from_flag(18), None);
        assert_eq!(AudioFormat::from_flag(2), Some(AudioFormat::Pcm16));
    }

    #[test]
    fn version_numbers() {
        for (number, version) in [
            (1, super::Version::V1),
            (2, super::Version::V2),
            (3, super::Version::V3),
            (4, super::Version::V4),
            (5, super::Version::V5),
        ] {
            assert_eq!(u32::from(version), number);
            assert!(super::Version::from_number(number).is_ok_and(|v| v == version));
        }
    }
}
