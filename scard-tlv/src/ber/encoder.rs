//! BER-TLV encoder
//!
//! # Usage Example
//!
//! ```rust
//! use scard_tlv::ber::{write_tlv, TlvEncoder};
//!
//! let mut sink = Vec::new();
//! write_tlv(0x55, &[], &mut sink)?;
//! assert_eq!(sink, [0x55, 0x00]);
//!
//! let mut encoder = TlvEncoder::new();
//! encoder.encode(0x81, &[0x01, 0x02])?;
//! assert_eq!(encoder.as_bytes(), &[0x81, 0x02, 0x01, 0x02]);
//! # Ok::<(), scard_tlv::TlvError>(())
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use log::trace;
use scard_core::TlvResult;

use crate::ber::types::{length_prefix, END_OF_CONTENTS};

/// Append one record to `sink`
///
/// # Encoding Process
/// 1. Write the tag byte verbatim
/// 2. Select the length field for `value.len()` (see [`length_prefix`])
/// 3. Write the length field and the value; a 128-byte value is written as
///    `0x80`, the value, then `00 00`
///
/// # Error Handling
/// Returns `UnsupportedLength` for values longer than 65535 bytes. The tag
/// byte has already been appended to `sink` at that point; nothing else is.
pub fn write_tlv<B: BufMut>(tag: u8, value: &[u8], sink: &mut B) -> TlvResult<()> {
    sink.put_u8(tag);

    let prefix = length_prefix(value.len())?;
    if prefix.is_indeterminate() {
        sink.put_slice(prefix.as_bytes());
        sink.put_slice(value);
        sink.put_slice(&END_OF_CONTENTS);
        trace!("TLV tag=0x{:02X} len={} (indeterminate) written", tag, value.len());
        return Ok(());
    }

    sink.put_slice(prefix.as_bytes());
    sink.put_slice(value);
    trace!("TLV tag=0x{:02X} len={} written", tag, value.len());
    Ok(())
}

/// BER-TLV encoder accumulating records in an owned buffer
#[derive(Debug, Default)]
pub struct TlvEncoder {
    buffer: BytesMut,
}

impl TlvEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an encoder with `capacity` bytes pre-allocated
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Append one record, see [`write_tlv`]
    pub fn encode(&mut self, tag: u8, value: &[u8]) -> TlvResult<()> {
        write_tlv(tag, value, &mut self.buffer)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Bytes {
        self.buffer.freeze()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
