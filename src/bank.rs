use crate::error::DecodeError;
use crate::header::{Header, SampleDescriptor, Version};
use crate::read::Reader;
use crate::stream::StreamIntoIter;
use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    io::Read,
};

/// A sound bank whose headers have been read, with sample data still waiting in the reader.
///
/// Sample data is read in order by iterating over the bank:
///
/// ```no_run
/// use fsbank::Bank;
/// use std::fs::File;
/// use std::io::BufReader;
///
/// let file = BufReader::new(File::open("music.fsb")?);
/// let bank = Bank::new(file)?;
///
/// for stream in bank {
///     let stream = stream?;
///     println!("{}: {} bytes", stream.descriptor().name(), stream.data().len());
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Bank<R: Read> {
    header: Header,
    read: Reader<R>,
}

impl<R: Read> Bank<R> {
    /// Reads the container header, sample headers and name table from `source`.
    ///
    /// # Errors
    /// Fails if the data is not a sound bank, if its version is not supported,
    /// or if the headers could not be read in full.
    pub fn new(source: R) -> Result<Self, DecodeError> {
        let mut read = Reader::new(source);
        let header = Header::parse(&mut read)?;
        Ok(Self { header, read })
    }

    /// Returns the layout version of the sound bank.
    #[must_use]
    pub fn version(&self) -> Version {
        self.header.container.version
    }

    /// Returns the mode flags stored in the container header. They are not interpreted.
    #[must_use]
    pub fn mode_flags(&self) -> u32 {
        self.header.container.mode_flags
    }

    /// Returns the metadata of every sample, in the order they are stored.
    #[must_use]
    pub fn samples(&self) -> &[SampleDescriptor] {
        &self.header.samples
    }
}

impl<R: Read> Debug for Bank<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Bank")
            .field("header", &self.header)
            .field("position", &self.read.position())
            .finish_non_exhaustive()
    }
}

impl<R: Read> From<Bank<R>> for StreamIntoIter<R> {
    fn from(value: Bank<R>) -> Self {
        Self::new(value.header.samples, value.read)
    }
}

impl<R: Read> IntoIterator for Bank<R> {
    type IntoIter = StreamIntoIter<R>;
    type Item = <StreamIntoIter<R> as Iterator>::Item;

    fn into_iter(self) -> Self::IntoIter {
        Self::IntoIter::from(self)
    }
}

/// Reads the metadata of every sample in an in-memory sound bank.
///
/// Sample data is not copied: use [`SampleDescriptor::data`] on the same bytes to get it.
///
/// # Errors
/// Besides the errors of [`Bank::new`], this fails with [`DecodeErrorKind::Truncated`] if the data of any
/// sample lies past the end of `bytes`.
///
/// [`DecodeErrorKind::Truncated`]: crate::DecodeErrorKind::Truncated
pub fn parse(bytes: &[u8]) -> Result<Vec<SampleDescriptor>, DecodeError> {
    let bank = Bank::new(bytes)?;

    for (sample, index) in bank.samples().iter().zip(0..) {
        if sample.data(bytes).is_none() {
            let end = u64::from(sample.offset()) + u64::from(sample.size());
            return Err(DecodeError::out_of_bounds(index, end, bytes.len()));
        }
    }

    Ok(bank.header.samples.into_vec())
}

#[cfg(test)]
mod test {
    use super::{parse, Bank};
    use crate::error::DecodeErrorKind;
    use crate::header::{AudioFormat, Version};
    use crate::pack::{pack, Sample};
    use std::num::NonZeroU16;

    fn channels(n: u16) -> NonZeroU16 {
        NonZeroU16::new(n).unwrap()
    }

    fn sample_set() -> Vec<Sample> {
        vec![
            Sample::pcm16("kick", 44100, channels(1), vec![1, 0, 2, 0, 3, 0]),
            Sample::pcm16("", 22050, channels(2), vec![9; 8]),
            Sample::new("hat", AudioFormat::Pcm8, 8000, channels(1), vec![0x80; 5]).with_loop(1, 4),
        ]
    }

    #[test]
    fn parse_packed_bank_per_version() {
        for version in [
            Version::V1,
            Version::V2,
            Version::V3,
            Version::V4,
            Version::V5,
        ] {
            let samples = sample_set();
            let bytes = pack(&samples, version).unwrap();
            let descriptors = parse(&bytes).unwrap();

            assert_eq!(descriptors.len(), samples.len());

            for (descriptor, sample) in descriptors.iter().zip(&samples) {
                assert_eq!(descriptor.format(), sample.format());
                assert_eq!(descriptor.channels(), sample.channels());
                assert_eq!(descriptor.sample_rate(), sample.sample_rate());
                assert_eq!(descriptor.stream_loop(), sample.stream_loop());
                assert_eq!(descriptor.data(&bytes), Some(sample.data()));
            }

            assert_eq!(descriptors[0].name(), "kick");
            assert_eq!(descriptors[1].name(), "sample_1");
            assert_eq!(descriptors[2].name(), "hat");
        }
    }

    #[test]
    fn payload_offsets_are_contiguous() {
        for version in [Version::V1, Version::V2, Version::V3, Version::V4, Version::V5] {
            let bytes = pack(&sample_set(), version).unwrap();
            let descriptors = parse(&bytes).unwrap();

            for pair in descriptors.windows(2) {
                assert_eq!(pair[1].offset(), pair[0].offset() + pair[0].size());
            }

            let last = descriptors.last().unwrap();
            assert_eq!((last.offset() + last.size()) as usize, bytes.len());
        }
    }

    #[test]
    fn unlisted_rate_reads_back_as_default() {
        let samples = [Sample::pcm16("odd", 22000, channels(1), vec![0; 4])];

        let bytes = pack(&samples, Version::V5).unwrap();
        assert_eq!(parse(&bytes).unwrap()[0].sample_rate(), 44100);

        let bytes = pack(&samples, Version::V3).unwrap();
        assert_eq!(parse(&bytes).unwrap()[0].sample_rate(), 22000);
    }

    #[test]
    fn reject_bad_magic() {
        let mut bytes = pack(&sample_set(), Version::V5).unwrap();
        bytes[..4].copy_from_slice(b"RIFF");

        assert!(parse(&bytes).is_err_and(|e| e.kind() == DecodeErrorKind::BadMagic));
    }

    #[test]
    fn reject_unsupported_version() {
        let mut bytes = pack(&sample_set(), Version::V5).unwrap();
        bytes[4..8].copy_from_slice(&6u32.to_le_bytes());

        assert!(parse(&bytes).is_err_and(|e| e.kind() == DecodeErrorKind::UnsupportedVersion));
    }

    #[test]
    fn reject_unknown_audio_format() {
        let samples = [Sample::pcm16("a", 44100, channels(1), vec![0; 2])];
        let mut bytes = pack(&samples, Version::V5).unwrap();
        // format is the low 5 bits of the metadata word after the 28-byte header and 4-byte size
        bytes[32] = 0x1F;

        assert!(parse(&bytes).is_err_and(|e| e.kind() == DecodeErrorKind::UnknownAudioFormat));
    }

    #[test]
    fn reject_truncated_bank() {
        for version in [Version::V2, Version::V5] {
            let bytes = pack(&sample_set(), version).unwrap();

            assert!(parse(&bytes[..28]).is_err_and(|e| e.kind() == DecodeErrorKind::Truncated));
            assert!(parse(&bytes[..bytes.len() - 1])
                .is_err_and(|e| e.kind() == DecodeErrorKind::Truncated));
        }
    }

    #[test]
    fn iterate_over_streams() {
        let samples = sample_set();
        let bytes = pack(&samples, Version::V4).unwrap();
        let bank = Bank::new(bytes.as_slice()).unwrap();

        assert_eq!(bank.version(), Version::V4);
        assert_eq!(bank.mode_flags(), 0);

        let streams = bank.into_iter().collect::<Result<Vec<_>, _>>().unwrap();

        assert_eq!(streams.len(), 3);
        for ((stream, sample), index) in streams.iter().zip(&samples).zip(0..) {
            assert_eq!(stream.index(), index);
            assert_eq!(stream.data(), sample.data());
        }
    }

    #[test]
    fn stream_iteration_stops_at_missing_data() {
        let bytes = pack(&sample_set(), Version::V5).unwrap();
        let mut iter = Bank::new(&bytes[..bytes.len() - 2]).unwrap().into_iter();

        assert_eq!(iter.len(), 3);
        assert!(iter.next().is_some_and(|stream| stream.is_ok()));
        assert!(iter.next().is_some_and(|stream| stream.is_ok()));
        assert!(iter
            .next()
            .is_some_and(|stream| stream.is_err_and(|e| e.kind() == DecodeErrorKind::Truncated)));
        assert!(iter.next().is_none());
    }

    #[test]
    fn offsets_pointing_backwards_are_inconsistent() {
        let samples = [
            Sample::pcm16("a", 44100, channels(1), vec![1, 2]),
            Sample::pcm16("b", 44100, channels(1), vec![3, 4]),
        ];
        let mut bytes = pack(&samples, Version::V5).unwrap();
        // point the second sample back at the first sample's data
        let first_offset = bytes[36..40].to_vec();
        bytes[48..52].copy_from_slice(&first_offset);

        let mut iter = Bank::new(bytes.as_slice()).unwrap().into_iter();

        assert!(iter.next().is_some_and(|stream| stream.is_ok()));
        assert!(iter
            .next()
            .is_some_and(|stream| stream.is_err_and(|e| e.kind() == DecodeErrorKind::Inconsistent)));
    }
}
