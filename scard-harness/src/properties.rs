//! Reader properties reported by `FEATURE_GET_TLV_PROPERTIES`
//!
//! The response is a sequence of BER-TLV records. Unlike the feature list,
//! integer values are little-endian and 1, 2 or 4 bytes wide.

use std::ops::RangeInclusive;

use log::{debug, warn};
use scard_core::{ScardError, ScardResult};
use scard_tlv::TlvDecoder;

use crate::config::HarnessConfig;
use crate::control::ControlChannel;
use crate::feature::{Feature, FeatureTable};

const LCD_LAYOUT: u8 = 0x01;
const ENTRY_VALIDATION_CONDITION: u8 = 0x02;
const TIMEOUT2: u8 = 0x03;
const LCD_MAX_CHARACTERS: u8 = 0x04;
const LCD_MAX_LINES: u8 = 0x05;
const MIN_PIN_SIZE: u8 = 0x06;
const MAX_PIN_SIZE: u8 = 0x07;
const FIRMWARE_ID: u8 = 0x08;
const PPDU_SUPPORT: u8 = 0x09;
const MAX_APDU_DATA_SIZE: u8 = 0x0A;
const VENDOR_ID: u8 = 0x0B;
const PRODUCT_ID: u8 = 0x0C;

/// Decoded `FEATURE_GET_TLV_PROPERTIES` response
///
/// Properties the reader did not report are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReaderProperties {
    /// wLcdLayout
    pub lcd_layout: Option<u32>,
    /// bEntryValidationCondition
    pub entry_validation_condition: Option<u32>,
    /// bTimeOut2
    pub timeout2: Option<u32>,
    /// wLcdMaxCharacters
    pub lcd_max_characters: Option<u32>,
    /// wLcdMaxLines
    pub lcd_max_lines: Option<u32>,
    /// bMinPINSize
    pub min_pin_size: Option<u32>,
    /// bMaxPINSize
    pub max_pin_size: Option<u32>,
    /// sFirmwareID, raw bytes
    pub firmware_id: Option<Vec<u8>>,
    /// bPPDUSupport
    pub ppdu_support: Option<u32>,
    /// dwMaxAPDUDataSize
    pub max_apdu_data_size: Option<u32>,
    /// wIdVendor
    pub vendor_id: Option<u32>,
    /// wIdProduct
    pub product_id: Option<u32>,
    /// Records with tags not listed above, in reader order
    pub unknown: Vec<(u8, Vec<u8>)>,
}

impl ReaderProperties {
    /// Parse a `FEATURE_GET_TLV_PROPERTIES` response
    ///
    /// # Error Handling
    /// - `Tlv` if the response is not well-formed BER-TLV
    /// - `InvalidData` if an integer property is not 1, 2 or 4 bytes wide
    pub fn parse(response: &[u8]) -> ScardResult<Self> {
        let mut properties = Self::default();

        for record in TlvDecoder::new(response) {
            let record = record?;
            let tag = record.tag().head().as_byte();
            let value = record.value();

            let slot = match tag {
                FIRMWARE_ID => {
                    properties.firmware_id = Some(value.to_vec());
                    continue;
                }
                LCD_LAYOUT => &mut properties.lcd_layout,
                ENTRY_VALIDATION_CONDITION => &mut properties.entry_validation_condition,
                TIMEOUT2 => &mut properties.timeout2,
                LCD_MAX_CHARACTERS => &mut properties.lcd_max_characters,
                LCD_MAX_LINES => &mut properties.lcd_max_lines,
                MIN_PIN_SIZE => &mut properties.min_pin_size,
                MAX_PIN_SIZE => &mut properties.max_pin_size,
                PPDU_SUPPORT => &mut properties.ppdu_support,
                MAX_APDU_DATA_SIZE => &mut properties.max_apdu_data_size,
                VENDOR_ID => &mut properties.vendor_id,
                PRODUCT_ID => &mut properties.product_id,
                other => {
                    warn!("Unknown reader property 0x{:02X} ({} bytes)", other, value.len());
                    properties.unknown.push((other, value.to_vec()));
                    continue;
                }
            };
            *slot = Some(le_integer(tag, value)?);
        }

        Ok(properties)
    }

    /// PIN length range accepted by the PIN pad, when both bounds are reported
    pub fn pin_size_range(&self) -> Option<RangeInclusive<u32>> {
        Some(self.min_pin_size?..=self.max_pin_size?)
    }
}

fn le_integer(tag: u8, value: &[u8]) -> ScardResult<u32> {
    match *value {
        [b0] => Ok(b0 as u32),
        [b0, b1] => Ok(u16::from_le_bytes([b0, b1]) as u32),
        [b0, b1, b2, b3] => Ok(u32::from_le_bytes([b0, b1, b2, b3])),
        _ => Err(ScardError::InvalidData(format!(
            "Property 0x{:02X}: integer must be 1, 2 or 4 bytes, got {}",
            tag,
            value.len()
        ))),
    }
}

/// Read the reader's TLV properties through its `GetTlvProperties` feature
///
/// # Error Handling
/// Returns `FeatureNotSupported` if `features` has no `GetTlvProperties` entry.
pub fn query_properties<C>(
    channel: &mut C,
    features: &FeatureTable,
    config: &HarnessConfig,
) -> ScardResult<ReaderProperties>
where
    C: ControlChannel + ?Sized,
{
    let code = features.require(Feature::GetTlvProperties)?;
    debug!("Requesting reader TLV properties (control code 0x{:08X})", code);
    let response = channel.control(code, &[], config.response_len())?;
    ReaderProperties::parse(&response)
}
