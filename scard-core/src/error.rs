use thiserror::Error;

/// Errors produced by the BER-TLV codec
///
/// Every variant is terminal for the call that produced it. `Eof` is the
/// normal end-of-sequence signal of the decoder and is not a format error.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlvError {
    #[error("End of input")]
    Eof,

    #[error("Malformed TLV: {0}")]
    Malformed(&'static str),

    #[error("Invalid length: length octets truncated")]
    InvalidLength,

    #[error("Unsupported length encoding")]
    UnsupportedLength,
}

impl TlvError {
    /// Whether this error is the end-of-input signal rather than a format error
    pub fn is_eof(&self) -> bool {
        matches!(self, TlvError::Eof)
    }
}

/// Result type alias for codec operations
pub type TlvResult<T> = Result<T, TlvError>;

/// Main error type for harness operations
#[derive(Error, Debug)]
pub enum ScardError {
    #[error("TLV error: {0}")]
    Tlv(#[from] TlvError),

    #[error("Control error: {0}")]
    Control(String),

    #[error("Transmit error: {0}")]
    Transmit(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Feature not supported by reader: 0x{0:02X}")]
    FeatureNotSupported(u8),

    #[error("APDU error: {0}")]
    Apdu(String),
}

/// Result type alias for harness operations
pub type ScardResult<T> = Result<T, ScardError>;
