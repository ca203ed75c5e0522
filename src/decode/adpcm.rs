use super::error::ExtractError;
use crate::header::AudioFormat;
use std::num::NonZeroU16;

const INDEX_TABLE: [i8; 16] = [-1, -1, -1, -1, 2, 4, 6, 8, -1, -1, -1, -1, 2, 4, 6, 8];

const STEP_TABLE: [i32; 89] = [
    7, 8, 9, 10, 11, 12, 13, 14, 16, 17, 19, 21, 23, 25, 28, 31, 34, 37, 41, 45, 50, 55, 60, 66,
    73, 80, 88, 97, 107, 118, 130, 143, 157, 173, 190, 209, 230, 253, 279, 307, 337, 371, 408,
    449, 494, 544, 598, 658, 724, 796, 876, 963, 1060, 1166, 1282, 1411, 1552, 1707, 1878, 2066,
    2272, 2499, 2749, 3024, 3327, 3660, 4026, 4428, 4871, 5358, 5894, 6484, 7132, 7845, 8630,
    9493, 10442, 11487, 12635, 13899, 15289, 16818, 18500, 20350, 22385, 24623, 27086, 29794,
    32767,
];

/// Bytes of one block for one channel: a 4-byte header followed by 32 bytes of nibbles.
const BLOCK_SIZE: usize = 36;
const HEADER_SIZE: usize = 4;
/// Channels take turns every 4 bytes within the data part of a block.
const WORD_SIZE: usize = 4;
/// The header sample plus two samples per data byte.
const SAMPLES_PER_BLOCK: usize = 1 + (BLOCK_SIZE - HEADER_SIZE) * 2;

#[derive(Clone, Copy)]
struct Channel {
    predictor: i32,
    step_index: usize,
}

impl Channel {
    fn from_header(header: &[u8]) -> Self {
        Self {
            predictor: i32::from(i16::from_le_bytes([header[0], header[1]])),
            step_index: usize::from(header[2]).min(STEP_TABLE.len() - 1),
        }
    }

    fn expand(&mut self, nibble: u8) -> i16 {
        let step = STEP_TABLE[self.step_index];
        let mut diff = step >> 3;

        if nibble & 4 != 0 {
            diff += step;
        }
        if nibble & 2 != 0 {
            diff += step >> 1;
        }
        if nibble & 1 != 0 {
            diff += step >> 2;
        }
        if nibble & 8 != 0 {
            diff = -diff;
        }

        self.predictor = (self.predictor + diff).clamp(i32::from(i16::MIN), i32::from(i16::MAX));
        self.step_index = self
            .step_index
            .saturating_add_signed(isize::from(INDEX_TABLE[usize::from(nibble)]))
            .min(STEP_TABLE.len() - 1);

        // clamped to the i16 range above
        i16::try_from(self.predictor).unwrap_or_default()
    }
}

/// Decodes Xbox IMA ADPCM: fixed 36-byte blocks per channel, channels interleaved every 4 bytes.
pub(super) fn decode(data: &[u8], channels: NonZeroU16) -> Result<Vec<u8>, ExtractError> {
    let channel_count = usize::from(channels.get());
    let frame_size = BLOCK_SIZE * channel_count;

    if data.len() % frame_size != 0 {
        return Err(ExtractError::malformed(AudioFormat::ImaAdpcm));
    }

    let frames = data.len() / frame_size;
    let mut pcm = vec![0; frames * SAMPLES_PER_BLOCK * channel_count];

    let frames_out = pcm.chunks_exact_mut(SAMPLES_PER_BLOCK * channel_count);

    for (frame, out) in data.chunks_exact(frame_size).zip(frames_out) {
        let (headers, body) = frame.split_at(HEADER_SIZE * channel_count);

        for (channel, header) in headers.chunks_exact(HEADER_SIZE).enumerate() {
            let mut state = Channel::from_header(header);
            out[channel] = i16::try_from(state.predictor).unwrap_or_default();

            let words = body
                .chunks_exact(WORD_SIZE)
                .skip(channel)
                .step_by(channel_count);

            let mut position = 1;
            for byte in words.flatten() {
                for nibble in [byte & 0x0F, byte >> 4] {
                    out[position * channel_count + channel] = state.expand(nibble);
                    position += 1;
                }
            }
        }
    }

    Ok(pcm.into_iter().flat_map(i16::to_le_bytes).collect())
}
