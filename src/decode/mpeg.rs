use super::error::ExtractError;
use crate::header::AudioFormat;
use std::io::{Cursor, ErrorKind};
use symphonia::core::{
    audio::SampleBuffer,
    codecs::DecoderOptions,
    errors::Error as SymphoniaError,
    formats::FormatOptions,
    io::{MediaSourceStream, MediaSourceStreamOptions},
    meta::MetadataOptions,
    probe::Hint,
};

pub(super) fn decode(data: &[u8]) -> Result<Vec<u8>, ExtractError> {
    let to_error = || ExtractError::from_symphonia(AudioFormat::Mpeg);

    let source = MediaSourceStream::new(
        Box::new(Cursor::new(data.to_vec())),
        MediaSourceStreamOptions::default(),
    );

    let mut hint = Hint::new();
    let _ = hint.with_extension("mp3");

    let mut reader = symphonia::default::get_probe()
        .format(
            &hint,
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(to_error())?
        .format;

    let track = reader
        .default_track()
        .ok_or_else(|| ExtractError::malformed(AudioFormat::Mpeg))?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(to_error())?;

    let mut pcm = Vec::new();

    loop {
        let packet = match reader.next_packet() {
            Ok(packet) => packet,
            // end of data
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(to_error()(e)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // a corrupt frame is dropped, the rest of the stream is still usable
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(to_error()(e)),
        };

        let mut buffer = SampleBuffer::<i16>::new(decoded.capacity() as u64, *decoded.spec());
        buffer.copy_interleaved_ref(decoded);
        pcm.extend(buffer.samples().iter().flat_map(|sample| sample.to_le_bytes()));
    }

    Ok(pcm)
}
