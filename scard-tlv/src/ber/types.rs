//! BER-TLV encoding types (Tag, Length)

use crate::ber::cursor::Cursor;
use scard_core::{TlvError, TlvResult};

/// `type_short` value announcing continuation bytes after the tag head
pub const LONG_FORM_TYPE: u8 = 0x1F;

/// Length byte announcing an indeterminate length
pub const INDETERMINATE_LENGTH: u8 = 0x80;

/// Terminator following an indeterminate-length value
pub const END_OF_CONTENTS: [u8; 2] = [0x00, 0x00];

/// Largest value length this profile can represent
pub const MAX_VALUE_LENGTH: usize = u16::MAX as usize;

/// Continuation bit of long-form tag bytes and long-form flag of the length byte
const HIGH_BIT: u8 = 0x80;
const LOW_SEVEN_BITS: u8 = 0x7F;

/// BER Tag Class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagClass {
    /// Universal class (00)
    Universal = 0,
    /// Application class (01)
    Application = 1,
    /// Context-specific class (10)
    ContextSpecific = 2,
    /// Private class (11)
    Private = 3,
}

impl TagClass {
    /// Get tag class from the two low bits of `bits`
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => TagClass::Universal,
            1 => TagClass::Application,
            2 => TagClass::ContextSpecific,
            _ => TagClass::Private,
        }
    }

    /// Two-bit class value (not shifted into position)
    pub fn to_bits(self) -> u8 {
        self as u8
    }
}

/// Primitive or constructed encoding of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagForm {
    Primitive = 0,
    Constructed = 1,
}

/// First byte of a tag
///
/// Fields are packed most-significant bit first:
///
/// ```text
/// Bits: 8 7 | 6 | 5 4 3 2 1
///       class|form| type_short
/// ```
///
/// `type_short` 0-30 is the literal type; 31 ([`LONG_FORM_TYPE`]) means
/// continuation bytes follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TagHead(u8);

impl TagHead {
    const CLASS_SHIFT: u8 = 6;
    const FORM_SHIFT: u8 = 5;
    const TYPE_MASK: u8 = 0x1F;

    /// Wrap a raw head byte
    pub const fn from_byte(byte: u8) -> Self {
        Self(byte)
    }

    /// Compose a head from its fields; `type_short` is truncated to 5 bits
    pub fn new(class: TagClass, form: TagForm, type_short: u8) -> Self {
        Self(
            (class.to_bits() << Self::CLASS_SHIFT)
                | ((form as u8) << Self::FORM_SHIFT)
                | (type_short & Self::TYPE_MASK),
        )
    }

    /// Get the raw head byte
    pub const fn as_byte(self) -> u8 {
        self.0
    }

    /// Get the class (bits 8-7)
    pub fn class(self) -> TagClass {
        TagClass::from_bits(self.0 >> Self::CLASS_SHIFT)
    }

    /// Get the form (bit 6)
    pub fn form(self) -> TagForm {
        if (self.0 >> Self::FORM_SHIFT) & 0x01 == 0 {
            TagForm::Primitive
        } else {
            TagForm::Constructed
        }
    }

    /// Get the 5-bit type (bits 5-1)
    pub const fn type_short(self) -> u8 {
        self.0 & Self::TYPE_MASK
    }

    /// Check if continuation bytes follow
    pub const fn is_long_form(self) -> bool {
        self.type_short() == LONG_FORM_TYPE
    }
}

impl From<u8> for TagHead {
    fn from(byte: u8) -> Self {
        Self::from_byte(byte)
    }
}

/// Decoded BER tag
///
/// `extra` holds the long-form continuation bytes exactly as they appear in
/// the source buffer and is empty for short-form tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag<'a> {
    head: TagHead,
    extra: &'a [u8],
}

impl<'a> Tag<'a> {
    /// Single-byte tag with no continuation bytes
    ///
    /// Returns `None` if `head` announces a long-form tag, which always needs
    /// continuation bytes.
    pub fn short(head: u8) -> Option<Self> {
        let head = TagHead::from_byte(head);
        if head.is_long_form() {
            return None;
        }
        Some(Self { head, extra: &[] })
    }

    /// Read one tag from the cursor
    ///
    /// # Error Handling
    /// - `Eof` if no byte is left for the head
    /// - `Malformed` if the buffer ends before a continuation byte with bit 8 clear
    pub(crate) fn read(cursor: &mut Cursor<'a>) -> TlvResult<Self> {
        let head = TagHead::from_byte(cursor.read_u8().ok_or(TlvError::Eof)?);
        if !head.is_long_form() {
            return Ok(Self { head, extra: &[] });
        }

        let start = cursor.position();
        loop {
            let byte = cursor
                .read_u8()
                .ok_or(TlvError::Malformed("truncated long-form tag"))?;
            if byte & HIGH_BIT == 0 {
                break;
            }
        }

        Ok(Self {
            head,
            extra: cursor.consumed_since(start),
        })
    }

    /// Get the head byte
    pub fn head(&self) -> TagHead {
        self.head
    }

    /// Long-form continuation bytes, borrowed from the decoded buffer
    pub fn extra(&self) -> &'a [u8] {
        self.extra
    }

    /// Get the tag class
    pub fn class(&self) -> TagClass {
        self.head.class()
    }

    /// Get the tag form
    pub fn form(&self) -> TagForm {
        self.head.form()
    }

    /// Check if the value holds nested records
    pub fn is_constructed(&self) -> bool {
        self.form() == TagForm::Constructed
    }

    /// Tag number
    ///
    /// For short-form tags this is `type_short`. For long-form tags the 7-bit
    /// payloads of the continuation bytes are concatenated big-endian; `None`
    /// if the result does not fit in a `u32`.
    pub fn number(&self) -> Option<u32> {
        if !self.head.is_long_form() {
            return Some(self.head.type_short() as u32);
        }
        self.extra.iter().try_fold(0u32, |number, &byte| {
            number
                .checked_mul(128)
                .map(|n| n | (byte & LOW_SEVEN_BITS) as u32)
        })
    }

    /// Number of bytes the tag occupies on the wire
    pub fn encoded_len(&self) -> usize {
        1 + self.extra.len()
    }
}

/// Length byte
///
/// ```text
/// Bits: 8 | 7 6 5 4 3 2 1
///    long | value
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LengthOctet(u8);

impl LengthOctet {
    /// Wrap a raw length byte
    pub const fn from_byte(byte: u8) -> Self {
        Self(byte)
    }

    /// Get the low 7 bits
    pub const fn value(self) -> u8 {
        self.0 & LOW_SEVEN_BITS
    }

    /// Check if length octets follow
    pub const fn is_long_form(self) -> bool {
        self.0 & HIGH_BIT != 0
    }

    /// Check for the indeterminate-length marker `0x80`
    pub const fn is_indeterminate(self) -> bool {
        self.is_long_form() && self.value() == 0
    }
}

/// Decoded length field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Length {
    /// Value length stated up front
    Definite(u16),
    /// Value runs until the next `00 00`
    Indeterminate,
}

impl Length {
    /// Read a length field from the cursor
    ///
    /// The indeterminate case only reports the marker; locating the
    /// terminator is left to the decoder.
    ///
    /// # Error Handling
    /// - `InvalidLength` if the length byte or the length octets are truncated
    /// - `UnsupportedLength` if more than 2 length octets are announced
    pub(crate) fn read(cursor: &mut Cursor<'_>) -> TlvResult<Self> {
        let octet = LengthOctet::from_byte(cursor.read_u8().ok_or(TlvError::InvalidLength)?);
        if !octet.is_long_form() {
            return Ok(Length::Definite(octet.value() as u16));
        }

        match octet.value() {
            0 => Ok(Length::Indeterminate),
            count @ (1 | 2) => {
                let octets = cursor
                    .read_bytes(count as usize)
                    .ok_or(TlvError::InvalidLength)?;
                let length = octets
                    .iter()
                    .fold(0u16, |length, &byte| (length << 8) | byte as u16);
                Ok(Length::Definite(length))
            }
            _ => Err(TlvError::UnsupportedLength),
        }
    }
}

/// Encoded length field, at most 3 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthPrefix {
    octets: [u8; 3],
    len: usize,
}

impl LengthPrefix {
    /// Get the prefix bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.octets[..self.len]
    }

    /// Whether the value must be followed by [`END_OF_CONTENTS`]
    pub fn is_indeterminate(&self) -> bool {
        self.len == 1 && self.octets[0] == INDETERMINATE_LENGTH
    }
}

/// Select the length field for a value of `length` bytes
///
/// | Length      | Prefix                          |
/// |-------------|---------------------------------|
/// | 0-127       | `length`                        |
/// | 128         | `0x80` (indeterminate)          |
/// | 129-255     | `0x81`, `length`                |
/// | 256-65535   | `0x82`, `length` big-endian     |
///
/// The 128 row is triggered by the numeric length alone; callers writing
/// a 128-byte value get the indeterminate form whether they want it or not.
///
/// # Error Handling
/// Returns `UnsupportedLength` for lengths above 65535.
pub fn length_prefix(length: usize) -> TlvResult<LengthPrefix> {
    let prefix = match length {
        0..=127 => LengthPrefix {
            octets: [length as u8, 0, 0],
            len: 1,
        },
        128 => LengthPrefix {
            octets: [INDETERMINATE_LENGTH, 0, 0],
            len: 1,
        },
        129..=255 => LengthPrefix {
            octets: [0x81, length as u8, 0],
            len: 2,
        },
        256..=MAX_VALUE_LENGTH => {
            let [high, low] = (length as u16).to_be_bytes();
            LengthPrefix {
                octets: [0x82, high, low],
                len: 3,
            }
        }
        _ => return Err(TlvError::UnsupportedLength),
    };
    Ok(prefix)
}
