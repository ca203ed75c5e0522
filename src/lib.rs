//! # fsbank
//!
//! `fsbank` is a library for reading and writing FMOD sound banks (FSB files), layout versions FSB1 to FSB5.
//!
//! Reading a sound bank gives the metadata of every sample and where its data is:
//!
//! ```no_run
//! let bytes = std::fs::read("music.fsb")?;
//!
//! for sample in fsbank::parse(&bytes)? {
//!     println!("{}: {}, {} Hz", sample.name(), sample.format(), sample.sample_rate());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Samples in MPEG, IMA ADPCM or Vorbis can be converted to PCM with [`extract_all_to_pcm`],
//! and a new sound bank is created from PCM (or already-encoded) data with [`pack`]:
//!
//! ```
//! use fsbank::{pack, parse, Sample, Version};
//! use std::num::NonZeroU16;
//!
//! let samples = [Sample::pcm16("beep", 44100, NonZeroU16::MIN, vec![0; 64])];
//! let bytes = pack(&samples, Version::V5)?;
//!
//! assert_eq!(parse(&bytes)?[0].name(), "beep");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Diagnostics are emitted through the [`log`] facade.

#![warn(clippy::pedantic, future_incompatible)]
#![deny(
    let_underscore_drop,
    macro_use_extern_crate,
    meta_variable_misuse,
    missing_abi,
    missing_debug_implementations,
    missing_docs,
    non_ascii_idents,
    nonstandard_style,
    noop_method_call,
    rust_2018_idioms,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unsafe_op_in_unsafe_fn,
    unused,
    unused_crate_dependencies,
    unused_import_braces,
    unused_lifetimes,
    unused_macro_rules,
    unused_qualifications,
    unused_results,
    unused_tuple_struct_fields
)]

mod bank;
mod decode;
mod error;
mod export;
mod header;
mod pack;
mod read;
mod source;
mod stream;
mod write;

pub use bank::{parse, Bank};
pub use decode::{
    error::{ExtractError, ExtractErrorKind},
    BuiltinDecoder, DecodedSample, Decompress,
};
pub use error::{DecodeError, DecodeErrorKind, Error};
pub use export::{ExportError, ExportErrorKind};
pub use header::{AudioFormat, Loop, SampleDescriptor, Version};
pub use pack::{
    error::{PackError, PackErrorKind},
    pack, pack_files, write_bank, Sample,
};
pub use source::{SourceAudio, SourceError, SourceReader, WavSource};
pub use stream::{Stream, StreamIntoIter};

/// Reads every sample of an in-memory sound bank and converts it to PCM where possible.
///
/// PCM samples are returned unchanged. MPEG, IMA ADPCM and Vorbis samples are passed to `decoder`
/// and come back as 16-bit PCM. Samples in any other format, and samples the decoder reports as
/// [unsupported](ExtractErrorKind::Unsupported), keep their original bytes and a warning is logged.
///
/// # Errors
/// Fails if the sound bank can't be read (see [`parse`]), or if `decoder` fails on a sample it supports.
pub fn extract_all_to_pcm(
    bytes: &[u8],
    decoder: &impl Decompress,
) -> Result<Vec<DecodedSample>, Error> {
    parse(bytes)?
        .iter()
        .zip(0..)
        .map(|(descriptor, index)| {
            // bounds were checked while parsing
            let data = descriptor.data(bytes).unwrap_or_default();
            decode::extract(descriptor, data, decoder).map_err(|source| Error::Extract { index, source })
        })
        .collect()
}
