use super::error::{SampleError, SampleErrorKind};
use super::table::{index_from_rate, rate_from_index, DEFAULT_RATE_INDEX};
use super::{AudioFormat, Loop, SampleDescriptor, Version};
use crate::read::Reader;
use crate::write::{WriteResult, Writer};
use bilge::prelude::*;
use log::{trace, warn};
use packed::{CompactMetadata, ExtendedFlags, LegacyFlags};
use std::{
    io::{Read, Write},
    num::NonZeroU16,
};
use tap::Pipe;

// Accessors and setters are generated for every field, and not all of them are used.
#[allow(dead_code, unreachable_pub)]
mod packed {
    use bilge::prelude::*;

    // FSB1 and FSB2 pack the format into 3 bits.
    #[bitsize(16)]
    #[derive(FromBits)]
    pub(super) struct LegacyFlags {
        pub(super) format: u3,
        pub(super) channels: u2,
        pub(super) rest: u11,
    }

    // FSB3 and FSB4 widen the format to 5 bits.
    #[bitsize(16)]
    #[derive(FromBits)]
    pub(super) struct ExtendedFlags {
        pub(super) format: u5,
        pub(super) channels: u2,
        pub(super) rest: u9,
    }

    // FSB5 folds format, channels and sample rate into a single word.
    #[bitsize(32)]
    #[derive(FromBits)]
    pub(super) struct CompactMetadata {
        pub(super) format: u5,
        pub(super) channels: u2,
        pub(super) sample_rate: u4,
        pub(super) has_loop: bool,
        pub(super) rest: u20,
    }
}

/// The largest channel count any record layout can store (2 bits holding `channels - 1`).
pub(crate) const MAX_CHANNELS: u16 = 4;

/// Per-sample metadata as stored in one sample header, before a name is attached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SampleRecord {
    pub(crate) size: u32,
    pub(crate) offset: u32,
    pub(crate) format: AudioFormat,
    pub(crate) channels: NonZeroU16,
    pub(crate) sample_rate: u32,
    pub(crate) stream_loop: Option<Loop>,
}

impl SampleRecord {
    pub(crate) fn with_name(self, name: Box<str>) -> SampleDescriptor {
        SampleDescriptor {
            name,
            format: self.format,
            sample_rate: self.sample_rate,
            channels: self.channels,
            stream_loop: self.stream_loop,
            size: self.size,
            offset: self.offset,
        }
    }
}

/// How sample headers are laid out on disk. Each version maps to exactly one layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RecordLayout {
    /// FSB1, FSB2
    Legacy,
    /// FSB3, FSB4 (FSB4 appends an unused 32-bit flags word)
    Extended { extra_flags: bool },
    /// FSB5
    Compact,
}

impl From<Version> for RecordLayout {
    fn from(value: Version) -> Self {
        match value {
            Version::V1 | Version::V2 => Self::Legacy,
            Version::V3 => Self::Extended { extra_flags: false },
            Version::V4 => Self::Extended { extra_flags: true },
            Version::V5 => Self::Compact,
        }
    }
}

impl RecordLayout {
    /// Number of bytes one record occupies. Only FSB5 records vary, depending on loop presence.
    pub(crate) fn record_size(self, stream_loop: Option<Loop>) -> usize {
        match self {
            Self::Legacy | Self::Extended { extra_flags: false } => 22,
            Self::Extended { extra_flags: true } => 26,
            Self::Compact => match stream_loop {
                Some(_) => 20,
                None => 12,
            },
        }
    }

    /// Returns whether the format flag fits in this layout's format field.
    pub(crate) fn can_store(self, format: AudioFormat) -> bool {
        match self {
            Self::Legacy => format.flag() <= 0b111,
            Self::Extended { .. } | Self::Compact => format.flag() <= 0b1_1111,
        }
    }

    pub(crate) fn parse<R: Read>(
        self,
        reader: &mut Reader<R>,
        index: u32,
    ) -> Result<SampleRecord, SampleError> {
        let record = match self {
            Self::Legacy | Self::Extended { .. } => parse_explicit(self, reader, index)?,
            Self::Compact => parse_compact(reader, index)?,
        };

        trace!(
            "sample header {index}: {} ({} ch, {} Hz), {} bytes at offset {}",
            record.format,
            record.channels,
            record.sample_rate,
            record.size,
            record.offset
        );

        Ok(record)
    }

    /// Writes one record. The record must already have passed `can_store` and the channel limit.
    pub(crate) fn write<W: Write>(
        self,
        writer: &mut Writer<W>,
        record: &SampleRecord,
    ) -> WriteResult<()> {
        let channel_bits = channel_bits(record.channels);
        let (loop_start, loop_end) = record
            .stream_loop
            .map_or((0, 0), |stream_loop| (stream_loop.start(), stream_loop.end()));

        match self {
            Self::Legacy | Self::Extended { .. } => {
                let flags = match self {
                    Self::Legacy => u16::from(LegacyFlags::new(
                        u3::new(record.format.flag() & 0b111),
                        channel_bits,
                        u11::new(0),
                    )),
                    _ => u16::from(ExtendedFlags::new(
                        u5::new(record.format.flag() & 0b1_1111),
                        channel_bits,
                        u9::new(0),
                    )),
                };

                writer.le_u32(record.size)?;
                writer.le_u32(record.offset)?;
                writer.le_u16(flags)?;
                writer.le_u32(record.sample_rate)?;
                writer.le_u32(loop_start)?;
                writer.le_u32(loop_end)?;

                if self == (Self::Extended { extra_flags: true }) {
                    writer.le_u32(0)?;
                }
            }
            Self::Compact => {
                let rate_index = index_from_rate(record.sample_rate).unwrap_or_else(|| {
                    warn!(
                        "sample rate {} Hz has no FSB5 index; it will be stored as 44100 Hz",
                        record.sample_rate
                    );
                    DEFAULT_RATE_INDEX
                });

                let metadata = CompactMetadata::new(
                    u5::new(record.format.flag() & 0b1_1111),
                    channel_bits,
                    u4::new(rate_index),
                    record.stream_loop.is_some(),
                    u20::new(0),
                );

                writer.le_u32(record.size)?;
                writer.le_u32(u32::from(metadata))?;
                writer.le_u32(record.offset)?;

                if record.stream_loop.is_some() {
                    writer.le_u32(loop_start)?;
                    writer.le_u32(loop_end)?;
                }
            }
        }

        Ok(())
    }
}

fn parse_format(index: u32, flag: u8) -> Result<AudioFormat, SampleError> {
    AudioFormat::from_flag(flag)
        .ok_or_else(|| SampleError::new(index, SampleErrorKind::UnknownAudioFormat { flag }))
}

fn channel_bits(channels: NonZeroU16) -> u2 {
    // callers check MAX_CHANNELS first
    u2::new(u8::try_from(channels.get().min(MAX_CHANNELS) - 1).unwrap_or(3))
}

fn channels_from_bits(bits: u8) -> NonZeroU16 {
    NonZeroU16::MIN.saturating_add(u16::from(bits))
}

fn parse_explicit<R: Read>(
    layout: RecordLayout,
    reader: &mut Reader<R>,
    index: u32,
) -> Result<SampleRecord, SampleError> {
    let size = reader
        .le_u32()
        .map_err(SampleError::factory(index, SampleErrorKind::Size))?;

    let offset = reader
        .le_u32()
        .map_err(SampleError::factory(index, SampleErrorKind::Offset))?;

    let flags = reader
        .le_u16()
        .map_err(SampleError::factory(index, SampleErrorKind::Flags))?;

    let (format_flag, channel_bits) = if layout == RecordLayout::Legacy {
        let flags = LegacyFlags::from(flags);
        (flags.format().value(), flags.channels().value())
    } else {
        let flags = ExtendedFlags::from(flags);
        (flags.format().value(), flags.channels().value())
    };

    let sample_rate = reader
        .le_u32()
        .map_err(SampleError::factory(index, SampleErrorKind::SampleRate))?;

    let loop_start = reader
        .le_u32()
        .map_err(SampleError::factory(index, SampleErrorKind::LoopStart))?;

    let loop_end = reader
        .le_u32()
        .map_err(SampleError::factory(index, SampleErrorKind::LoopEnd))?;

    if layout == (RecordLayout::Extended { extra_flags: true }) {
        reader
            .skip(4)
            .map_err(SampleError::factory(index, SampleErrorKind::ExtraFlags))?;
    }

    Ok(SampleRecord {
        size,
        offset,
        format: parse_format(index, format_flag)?,
        channels: channels_from_bits(channel_bits),
        sample_rate,
        stream_loop: Loop::new(loop_start, loop_end),
    })
}

fn parse_compact<R: Read>(
    reader: &mut Reader<R>,
    index: u32,
) -> Result<SampleRecord, SampleError> {
    let size = reader
        .le_u32()
        .map_err(SampleError::factory(index, SampleErrorKind::Size))?;

    let metadata = reader
        .le_u32()
        .map_err(SampleError::factory(index, SampleErrorKind::Metadata))?
        .pipe(CompactMetadata::from);

    let offset = reader
        .le_u32()
        .map_err(SampleError::factory(index, SampleErrorKind::Offset))?;

    let stream_loop = if metadata.has_loop() {
        let start = reader
            .le_u32()
            .map_err(SampleError::factory(index, SampleErrorKind::LoopStart))?;

        let end = reader
            .le_u32()
            .map_err(SampleError::factory(index, SampleErrorKind::LoopEnd))?;

        Loop::new(start, end)
    } else {
        None
    };

    Ok(SampleRecord {
        size,
        offset,
        format: parse_format(index, metadata.format().value())?,
        channels: channels_from_bits(metadata.channels().value()),
        sample_rate: rate_from_index(metadata.sample_rate().value()),
        stream_loop,
    })
}
