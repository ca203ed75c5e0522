// FSB5 sample headers store the sample rate as a 4-bit index into this table instead of a value.
// Entries are append-only: existing indices must never change meaning.

use phf::{phf_map, Map};

pub(crate) const SAMPLE_RATES: [Option<u32>; 16] = [
    Some(4000),
    Some(8000),
    Some(11025),
    Some(12000),
    Some(16000),
    Some(22050),
    Some(24000),
    Some(32000),
    Some(44100),
    Some(48000),
    Some(96000),
    Some(192_000),
    Some(384_000),
    None,
    None,
    None,
];

/// Index of 44100 Hz, used for unassigned indices on decode and unlisted rates on encode.
pub(crate) const DEFAULT_RATE_INDEX: u8 = 8;

const DEFAULT_RATE: u32 = 44100;

static RATE_INDICES: Map<u32, u8> = phf_map! {
    4000u32 => 0u8,
    8000u32 => 1u8,
    11025u32 => 2u8,
    12000u32 => 3u8,
    16000u32 => 4u8,
    22050u32 => 5u8,
    24000u32 => 6u8,
    32000u32 => 7u8,
    44100u32 => 8u8,
    48000u32 => 9u8,
    96000u32 => 10u8,
    192000u32 => 11u8,
    384000u32 => 12u8,
};

pub(crate) fn rate_from_index(index: u8) -> u32 {
    SAMPLE_RATES
        .get(usize::from(index))
        .copied()
        .flatten()
        .unwrap_or(DEFAULT_RATE)
}

/// Exact match only. `None` means the rate has no index and the caller must fall back.
pub(crate) fn index_from_rate(rate: u32) -> Option<u8> {
    RATE_INDICES.get(&rate).copied()
}
