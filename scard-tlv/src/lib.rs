//! BER-TLV processing for smart-card reader payloads
//!
//! This crate provides a sequential BER-TLV decoder over an in-memory buffer
//! and a single-record encoder, as used for PC/SC feature discovery and other
//! structured control responses.

pub mod ber;

pub use ber::{
    length_prefix, write_tlv, Length, LengthOctet, LengthPrefix, Tag, TagClass, TagForm, TagHead,
    Tlv, TlvDecoder, TlvEncoder,
};
pub use scard_core::{TlvError, TlvResult};
