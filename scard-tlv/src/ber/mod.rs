//! BER-TLV (Basic Encoding Rules Tag-Length-Value) encoder and decoder
//!
//! Records follow ISO/IEC 8825-1 as profiled by ISO 7816-4. Each record is a
//! TLV triplet:
//!
//! ```text
//! [Tag] [Length] [Value]
//! ```
//!
//! ## Tag Encoding
//!
//! ```text
//! Bits: 8 7 6 5 4 3 2 1
//!       C C F T T T T T
//! ```
//! Where:
//! - CC = Class (00=Universal, 01=Application, 10=Context, 11=Private)
//! - F = Primitive (0) or Constructed (1)
//! - TTTTT = Type (0-30), or 11111 for a long-form tag followed by
//!   continuation bytes (bit 8 set on every byte except the last)
//!
//! ## Length Encoding
//!
//! | First byte | Meaning                                              |
//! |------------|------------------------------------------------------|
//! | `0x00-0x7F`| Length 0-127                                         |
//! | `0x80`     | Indeterminate, value terminated by `00 00`           |
//! | `0x81`     | One length byte follows (0-255)                      |
//! | `0x82`     | Two big-endian length bytes follow (0-65535)         |
//! | `0x83-0xFF`| Unsupported                                          |
//!
//! # Limitations
//!
//! 1. **Nested indeterminate lengths**: the terminator scan stops at the first
//!    `00 00` after the length byte, so an inner indeterminate-length record
//!    ends the outer one early.
//! 2. **Length 128 on encode**: a value of exactly 128 bytes is written with the
//!    indeterminate form (`0x80`, value, `00 00`) instead of `0x81 0x80`. Any
//!    value containing `00 00` can therefore not be written at that length
//!    without being truncated on decode.
//! 3. **Write path tags**: the encoder writes a single raw tag byte; long-form
//!    tags are only supported when decoding.
//! 4. **Constructed values** are not expanded. Feed a constructed record's value
//!    to a new [`TlvDecoder`] to walk its children.

mod cursor;
pub mod decoder;
pub mod encoder;
pub mod types;

pub use decoder::{Tlv, TlvDecoder};
pub use encoder::{write_tlv, TlvEncoder};
pub use types::{length_prefix, Length, LengthOctet, LengthPrefix, Tag, TagClass, TagForm, TagHead};
