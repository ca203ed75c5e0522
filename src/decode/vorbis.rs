use super::error::ExtractError;
use crate::header::AudioFormat;
use lewton::inside_ogg::OggStreamReader;
use std::io::Cursor;

const OGG_CAPTURE_PATTERN: &[u8; 4] = b"OggS";

// FSB5 stores bare Vorbis packets whose setup header lives outside the bank.
// Only data that carries its own Ogg framing can be decoded here.
pub(super) fn decode(data: &[u8]) -> Result<Vec<u8>, ExtractError> {
    if !data.starts_with(OGG_CAPTURE_PATTERN) {
        return Err(ExtractError::unsupported(AudioFormat::Vorbis));
    }

    let mut reader = OggStreamReader::new(Cursor::new(data)).map_err(ExtractError::from_lewton)?;
    let mut pcm = Vec::new();

    while let Some(packet) = reader
        .read_dec_packet_itl()
        .map_err(ExtractError::from_lewton)?
    {
        pcm.extend(packet.into_iter().flat_map(i16::to_le_bytes));
    }

    Ok(pcm)
}
