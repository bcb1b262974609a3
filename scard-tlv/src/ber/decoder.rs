//! BER-TLV decoder
//!
//! # Usage Example
//!
//! ```rust
//! use scard_tlv::ber::TlvDecoder;
//!
//! let data = [0x06, 0x04, 0x42, 0x33, 0x00, 0x06];
//! for record in TlvDecoder::new(&data) {
//!     let record = record?;
//!     assert_eq!(record.tag().head().as_byte(), 0x06);
//!     assert_eq!(record.value(), &[0x42, 0x33, 0x00, 0x06]);
//! }
//! # Ok::<(), scard_tlv::TlvError>(())
//! ```

use std::iter::FusedIterator;

use log::{debug, trace};
use scard_core::{TlvError, TlvResult};

use crate::ber::cursor::Cursor;
use crate::ber::types::{Length, Tag, END_OF_CONTENTS, MAX_VALUE_LENGTH};

/// One decoded record
///
/// Both the tag continuation bytes and the value borrow from the decoded
/// buffer; call `to_vec()` on the value to keep it past the buffer's scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tlv<'a> {
    tag: Tag<'a>,
    value: &'a [u8],
}

impl<'a> Tlv<'a> {
    /// Create a record from a tag and its value
    pub fn new(tag: Tag<'a>, value: &'a [u8]) -> Self {
        Self { tag, value }
    }

    /// Get the tag
    pub fn tag(&self) -> Tag<'a> {
        self.tag
    }

    /// Get the value bytes
    pub fn value(&self) -> &'a [u8] {
        self.value
    }

    /// Find the first record in `buffer` whose tag is the single byte `head`
    ///
    /// Returns `Ok(None)` when the buffer ends without a match; decoding
    /// errors met before a match are returned.
    pub fn find(buffer: &'a [u8], head: u8) -> TlvResult<Option<Self>> {
        for record in TlvDecoder::new(buffer) {
            let record = record?;
            let tag = record.tag();
            if tag.head().as_byte() == head && tag.extra().is_empty() {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ready,
    Exhausted,
}

/// Sequential BER-TLV decoder over a complete in-memory buffer
///
/// Each call to [`read_next`](Self::read_next) reads one tag, one length and
/// the value span, and leaves the position after the record (after the
/// `00 00` terminator for indeterminate lengths).
///
/// # State
///
/// The decoder is `Ready` until it reaches the end of the buffer or a call
/// fails; it is then exhausted and every further call returns
/// [`TlvError::Eof`] until [`reset`](Self::reset). No partial record is ever
/// returned and the position only advances on success.
///
/// # Iteration
///
/// As an [`Iterator`] the decoder yields `TlvResult<Tlv>` items: `Eof` ends
/// the iteration and any other error is yielded once before it ends.
#[derive(Debug, Clone)]
pub struct TlvDecoder<'a> {
    buffer: &'a [u8],
    position: usize,
    state: State,
}

impl<'a> TlvDecoder<'a> {
    /// Create a decoder positioned at the start of `buffer`
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
            state: State::Ready,
        }
    }

    /// Offset of the next record in the buffer
    pub fn position(&self) -> usize {
        self.position
    }

    /// Get remaining bytes
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Check if no further record can be read
    pub fn is_exhausted(&self) -> bool {
        self.state == State::Exhausted || self.position >= self.buffer.len()
    }

    /// Rewind to the start of the buffer
    pub fn reset(&mut self) {
        self.position = 0;
        self.state = State::Ready;
    }

    /// Decode the next record
    ///
    /// # Error Handling
    /// - `Eof`: no record left (normal end of the sequence)
    /// - `Malformed`: truncated tag or value, or missing `00 00` terminator
    /// - `InvalidLength`: truncated length field
    /// - `UnsupportedLength`: more than 2 length octets, or an indeterminate
    ///   value longer than 65535 bytes
    pub fn read_next(&mut self) -> TlvResult<Tlv<'a>> {
        if self.state == State::Exhausted {
            return Err(TlvError::Eof);
        }

        match self.decode_record() {
            Ok((record, next_position)) => {
                trace!(
                    "TLV tag=0x{:02X} extra={:02X?} len={} at {}",
                    record.tag.head().as_byte(),
                    record.tag.extra(),
                    record.value.len(),
                    self.position
                );
                self.position = next_position;
                Ok(record)
            }
            Err(err) => {
                self.state = State::Exhausted;
                if !err.is_eof() {
                    debug!("TLV decoding stopped at {}: {}", self.position, err);
                }
                Err(err)
            }
        }
    }

    fn decode_record(&self) -> TlvResult<(Tlv<'a>, usize)> {
        let mut cursor = Cursor::at(self.buffer, self.position);

        let tag = Tag::read(&mut cursor)?;
        let value = match Length::read(&mut cursor)? {
            Length::Definite(length) => cursor
                .read_bytes(length as usize)
                .ok_or(TlvError::Malformed("value truncated"))?,
            Length::Indeterminate => {
                // The first 00 00 ends the value, even inside a nested
                // indeterminate-length record.
                let length = find_end_of_contents(cursor.rest())
                    .ok_or(TlvError::Malformed("missing end-of-contents terminator"))?;
                if length > MAX_VALUE_LENGTH {
                    return Err(TlvError::UnsupportedLength);
                }
                let value = cursor
                    .read_bytes(length)
                    .ok_or(TlvError::Malformed("value truncated"))?;
                cursor
                    .read_bytes(END_OF_CONTENTS.len())
                    .ok_or(TlvError::Malformed("missing end-of-contents terminator"))?;
                value
            }
        };

        Ok((Tlv { tag, value }, cursor.position()))
    }
}

fn find_end_of_contents(bytes: &[u8]) -> Option<usize> {
    bytes
        .windows(END_OF_CONTENTS.len())
        .position(|window| window == END_OF_CONTENTS)
}

impl<'a> Iterator for TlvDecoder<'a> {
    type Item = TlvResult<Tlv<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_next() {
            Err(TlvError::Eof) => None,
            other => Some(other),
        }
    }
}

impl FusedIterator for TlvDecoder<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ber::encoder::write_tlv;
    use crate::ber::types::TagClass;

    #[test]
    fn test_decode_sequence() {
        let data = [0x04, 0x02, 0x01, 0x02, 0x80, 0x00, 0x5F, 0x2D, 0x01, 0x65];
        let records: Vec<_> = TlvDecoder::new(&data)
            .collect::<TlvResult<_>>()
            .unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].tag(), Tag::short(0x04).unwrap());
        assert_eq!(records[0].value(), &[0x01, 0x02]);
        assert_eq!(records[1].tag().class(), TagClass::ContextSpecific);
        assert!(records[1].value().is_empty());
        assert_eq!(records[2].tag().extra(), &[0x2D]);
        assert_eq!(records[2].value(), &[0x65]);
    }

    #[test]
    fn test_empty_buffer_is_eof() {
        let mut decoder = TlvDecoder::new(&[]);
        assert!(decoder.is_exhausted());
        assert_eq!(decoder.read_next(), Err(TlvError::Eof));
        assert_eq!(decoder.next(), None);
    }

    #[test]
    fn test_round_trip_lengths() {
        for length in [0usize, 1, 126, 127, 129, 255, 256, 65535] {
            let value: Vec<u8> = (0..length).map(|i| (i % 251) as u8 + 1).collect();
            let mut encoded = Vec::new();
            write_tlv(0x53, &value, &mut encoded).unwrap();

            let mut decoder = TlvDecoder::new(&encoded);
            let record = decoder.read_next().unwrap();
            assert_eq!(record.tag(), Tag::short(0x53).unwrap(), "length {length}");
            assert_eq!(record.value(), &value[..], "length {length}");
            assert_eq!(decoder.read_next(), Err(TlvError::Eof), "length {length}");
        }
    }

    #[test]
    fn test_length_128_uses_terminator() {
        let value = [0xA5u8; 128];
        let mut encoded = Vec::new();
        write_tlv(0x53, &value, &mut encoded).unwrap();

        assert_eq!(encoded.len(), 128 + 4);
        assert_eq!(&encoded[..2], &[0x53, 0x80]);
        assert_eq!(&encoded[2..130], &value[..]);
        assert_eq!(&encoded[130..], &[0x00, 0x00]);

        let mut decoder = TlvDecoder::new(&encoded);
        let record = decoder.read_next().unwrap();
        assert_eq!(record.value(), &value[..]);
        assert_eq!(decoder.position(), 128 + 4);
    }

    #[test]
    fn test_long_form_tag() {
        let data = [0x1F, 0x81, 0x23, 0x01, 0xEE];
        let record = TlvDecoder::new(&data).read_next().unwrap();
        assert!(record.tag().head().is_long_form());
        assert_eq!(record.tag().extra(), &[0x81, 0x23]);
        assert_eq!(record.value(), &[0xEE]);
    }

    #[test]
    fn test_truncated_value_is_malformed() {
        let data = [0x04, 0x05, 0x01, 0x02];
        let mut decoder = TlvDecoder::new(&data);
        assert!(matches!(decoder.read_next(), Err(TlvError::Malformed(_))));
        assert_eq!(decoder.position(), 0);

        // Tag and length only, no value bytes at all
        let mut decoder = TlvDecoder::new(&[0x04, 0x05]);
        assert_eq!(
            decoder.read_next(),
            Err(TlvError::Malformed("value truncated"))
        );
        assert_eq!(decoder.position(), 0);
        assert_eq!(decoder.read_next(), Err(TlvError::Eof));
    }

    #[test]
    fn test_truncated_long_form_tag_is_malformed() {
        let mut decoder = TlvDecoder::new(&[0x9F, 0x81]);
        assert!(matches!(decoder.read_next(), Err(TlvError::Malformed(_))));
    }

    #[test]
    fn test_indeterminate_length() {
        let data = [0x30, 0x80, 0xAA, 0xBB, 0x00, 0x00];
        let mut decoder = TlvDecoder::new(&data);
        let record = decoder.read_next().unwrap();
        assert_eq!(record.tag(), Tag::short(0x30).unwrap());
        assert_eq!(record.value(), &[0xAA, 0xBB]);
        assert_eq!(decoder.position(), data.len());
        assert_eq!(decoder.read_next(), Err(TlvError::Eof));
    }

    #[test]
    fn test_long_form_head_reads_marker_as_tag_byte() {
        // 0x7F has type_short 31: 80 AA BB 00 are continuation bytes and the
        // final 00 is the length
        let data = [0x7F, 0x80, 0xAA, 0xBB, 0x00, 0x00];
        let mut decoder = TlvDecoder::new(&data);
        let record = decoder.read_next().unwrap();
        assert_eq!(record.tag().head().as_byte(), 0x7F);
        assert!(record.tag().head().is_long_form());
        assert_eq!(record.tag().extra(), &[0x80, 0xAA, 0xBB, 0x00]);
        assert!(record.value().is_empty());
        assert_eq!(decoder.read_next(), Err(TlvError::Eof));
    }

    #[test]
    fn test_indeterminate_length_limit() {
        for (length, expected) in [
            (MAX_VALUE_LENGTH, Ok(MAX_VALUE_LENGTH)),
            (MAX_VALUE_LENGTH + 1, Err(TlvError::UnsupportedLength)),
        ] {
            let mut data = vec![0x30, 0x80];
            data.extend(std::iter::repeat_n(0x11u8, length));
            data.extend_from_slice(&END_OF_CONTENTS);

            let mut decoder = TlvDecoder::new(&data);
            let result = decoder.read_next().map(|record| record.value().len());
            assert_eq!(result, expected, "length {length}");
        }
    }

    #[test]
    fn test_indeterminate_length_stops_at_first_terminator() {
        // Inner record 0x30 0x80 ... 00 00 ends the outer one early
        let data = [0x30, 0x80, 0x30, 0x80, 0x01, 0x00, 0x00, 0x00, 0x00];
        let mut decoder = TlvDecoder::new(&data);
        let outer = decoder.read_next().unwrap();
        assert_eq!(outer.value(), &[0x30, 0x80, 0x01]);
        assert_eq!(decoder.position(), 7);
        // Remaining 00 00 decodes as an empty universal record
        let trailing = decoder.read_next().unwrap();
        assert_eq!(trailing.tag(), Tag::short(0x00).unwrap());
        assert!(trailing.value().is_empty());
    }

    #[test]
    fn test_missing_terminator_is_malformed() {
        let mut decoder = TlvDecoder::new(&[0x30, 0x80, 0x01, 0x00]);
        assert!(matches!(decoder.read_next(), Err(TlvError::Malformed(_))));
    }

    #[test]
    fn test_length_errors() {
        let mut decoder = TlvDecoder::new(&[0x04]);
        assert_eq!(decoder.read_next(), Err(TlvError::InvalidLength));

        let mut decoder = TlvDecoder::new(&[0x04, 0x82, 0x01]);
        assert_eq!(decoder.read_next(), Err(TlvError::InvalidLength));

        let mut decoder = TlvDecoder::new(&[0x04, 0x84, 0x00, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(decoder.read_next(), Err(TlvError::UnsupportedLength));
    }

    #[test]
    fn test_error_exhausts_decoder() {
        let data = [0x01, 0x01, 0xAA, 0x02, 0x09, 0xBB];
        let mut decoder = TlvDecoder::new(&data);
        assert!(decoder.read_next().is_ok());
        assert!(matches!(decoder.read_next(), Err(TlvError::Malformed(_))));
        assert!(decoder.is_exhausted());
        assert_eq!(decoder.read_next(), Err(TlvError::Eof));

        let items: Vec<_> = TlvDecoder::new(&data).collect();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(items[1].is_err());
    }

    #[test]
    fn test_reset_replays_records() {
        let data = [0x01, 0x01, 0xAA, 0x02, 0x01, 0xBB];
        let mut decoder = TlvDecoder::new(&data);
        let first: Vec<_> = decoder.by_ref().collect::<TlvResult<_>>().unwrap();
        assert!(decoder.is_exhausted());

        decoder.reset();
        assert_eq!(decoder.remaining(), data.len());
        let second: Vec<_> = decoder.collect::<TlvResult<_>>().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_find() {
        let data = [0x01, 0x01, 0xAA, 0x9F, 0x02, 0x00, 0x02, 0x01, 0xBB];
        let record = Tlv::find(&data, 0x02).unwrap().unwrap();
        assert_eq!(record.value(), &[0xBB]);
        assert_eq!(Tlv::find(&data, 0x03).unwrap(), None);
        assert!(Tlv::find(&[0x02, 0x05], 0x02).is_err());
    }
}
