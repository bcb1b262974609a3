//! BER-TLV codec and test-harness helpers for PC/SC smart-card readers
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `scard-core`: Error types shared by the other crates
//! - `scard-tlv`: BER-TLV decoder (iterator) and encoder
//! - `scard-harness`: Feature discovery, reader TLV properties, control codes
//!   and short APDU framing, on top of the native binding's control and
//!   transmit calls
//!
//! # Usage
//!
//! ```rust
//! use scard::tlv::{write_tlv, TlvDecoder};
//!
//! let mut payload = Vec::new();
//! write_tlv(0x12, &0x4233_0012u32.to_be_bytes(), &mut payload)?;
//!
//! let features = scard::harness::FeatureTable::parse(&payload)?;
//! assert_eq!(
//!     features.get(scard::harness::Feature::GetTlvProperties),
//!     Some(0x4233_0012)
//! );
//!
//! let record = TlvDecoder::new(&payload).read_next()?;
//! assert_eq!(record.value().len(), 4);
//! # Ok::<(), scard::ScardError>(())
//! ```

// Re-export core types
pub use scard_core::{ScardError, ScardResult, TlvError, TlvResult};

// Re-export the codec
pub mod tlv {
    pub use scard_tlv::*;
}

// Re-export harness helpers
pub mod harness {
    pub use scard_harness::*;
}
