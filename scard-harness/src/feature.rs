//! PC/SC part 10 reader feature discovery
//!
//! A reader answers `CM_IOCTL_GET_FEATURE_REQUEST` with one TLV record per
//! supported feature:
//!
//! ```text
//! [feature tag] [0x04] [control code, 4 bytes big-endian]
//! ```

use std::fmt;

use log::{debug, warn};
use scard_core::{ScardError, ScardResult};
use scard_tlv::TlvDecoder;

use crate::config::HarnessConfig;
use crate::control::ControlChannel;

/// Reader feature announced by `CM_IOCTL_GET_FEATURE_REQUEST`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    VerifyPinStart,
    VerifyPinFinish,
    ModifyPinStart,
    ModifyPinFinish,
    GetKeyPressed,
    VerifyPinDirect,
    ModifyPinDirect,
    MctReaderDirect,
    MctUniversal,
    IfdPinProperties,
    Abort,
    SetSpeMessage,
    VerifyPinDirectAppId,
    ModifyPinDirectAppId,
    WriteDisplay,
    GetKey,
    IfdDisplayProperties,
    GetTlvProperties,
    CcidEscCommand,
    ExecutePace,
    /// Tag not defined by PC/SC part 10
    Unknown(u8),
}

impl Feature {
    pub fn from_code(code: u8) -> Self {
        match code {
            0x01 => Feature::VerifyPinStart,
            0x02 => Feature::VerifyPinFinish,
            0x03 => Feature::ModifyPinStart,
            0x04 => Feature::ModifyPinFinish,
            0x05 => Feature::GetKeyPressed,
            0x06 => Feature::VerifyPinDirect,
            0x07 => Feature::ModifyPinDirect,
            0x08 => Feature::MctReaderDirect,
            0x09 => Feature::MctUniversal,
            0x0A => Feature::IfdPinProperties,
            0x0B => Feature::Abort,
            0x0C => Feature::SetSpeMessage,
            0x0D => Feature::VerifyPinDirectAppId,
            0x0E => Feature::ModifyPinDirectAppId,
            0x0F => Feature::WriteDisplay,
            0x10 => Feature::GetKey,
            0x11 => Feature::IfdDisplayProperties,
            0x12 => Feature::GetTlvProperties,
            0x13 => Feature::CcidEscCommand,
            0x20 => Feature::ExecutePace,
            other => Feature::Unknown(other),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Feature::VerifyPinStart => 0x01,
            Feature::VerifyPinFinish => 0x02,
            Feature::ModifyPinStart => 0x03,
            Feature::ModifyPinFinish => 0x04,
            Feature::GetKeyPressed => 0x05,
            Feature::VerifyPinDirect => 0x06,
            Feature::ModifyPinDirect => 0x07,
            Feature::MctReaderDirect => 0x08,
            Feature::MctUniversal => 0x09,
            Feature::IfdPinProperties => 0x0A,
            Feature::Abort => 0x0B,
            Feature::SetSpeMessage => 0x0C,
            Feature::VerifyPinDirectAppId => 0x0D,
            Feature::ModifyPinDirectAppId => 0x0E,
            Feature::WriteDisplay => 0x0F,
            Feature::GetKey => 0x10,
            Feature::IfdDisplayProperties => 0x11,
            Feature::GetTlvProperties => 0x12,
            Feature::CcidEscCommand => 0x13,
            Feature::ExecutePace => 0x20,
            Feature::Unknown(code) => code,
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feature::Unknown(code) => write!(f, "FEATURE_0x{:02X}", code),
            known => write!(f, "{:?}", known),
        }
    }
}

/// Features supported by a reader with their control codes, in reader order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureTable {
    entries: Vec<(Feature, u32)>,
}

impl FeatureTable {
    /// Parse a `CM_IOCTL_GET_FEATURE_REQUEST` response
    ///
    /// When a feature is announced twice the first control code is kept.
    ///
    /// # Error Handling
    /// - `Tlv` if the response is not well-formed BER-TLV
    /// - `InvalidData` if a record value is not exactly 4 bytes
    pub fn parse(response: &[u8]) -> ScardResult<Self> {
        let mut table = Self::default();

        for record in TlvDecoder::new(response) {
            let record = record?;
            let tag = record.tag();
            let code = tag.head().as_byte();
            let control_code: [u8; 4] = record.value().try_into().map_err(|_| {
                ScardError::InvalidData(format!(
                    "Feature 0x{:02X}: control code must be 4 bytes, got {}",
                    code,
                    record.value().len()
                ))
            })?;
            let control_code = u32::from_be_bytes(control_code);

            let feature = Feature::from_code(code);
            if let Feature::Unknown(_) = feature {
                warn!("Unknown reader feature 0x{:02X} (control code 0x{:08X})", code, control_code);
            }
            if table.get(feature).is_some() {
                debug!("Ignoring duplicate feature {}", feature);
                continue;
            }
            table.entries.push((feature, control_code));
        }

        Ok(table)
    }

    /// Control code of `feature`, if the reader supports it
    pub fn get(&self, feature: Feature) -> Option<u32> {
        self.entries
            .iter()
            .find(|(f, _)| *f == feature)
            .map(|(_, code)| *code)
    }

    /// Control code of `feature`, or `FeatureNotSupported`
    pub fn require(&self, feature: Feature) -> ScardResult<u32> {
        self.get(feature)
            .ok_or(ScardError::FeatureNotSupported(feature.code()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, u32)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ask the reader for its PC/SC part 10 features
pub fn discover_features<C>(channel: &mut C, config: &HarnessConfig) -> ScardResult<FeatureTable>
where
    C: ControlChannel + ?Sized,
{
    let code = config.feature_request_code();
    debug!("Requesting reader features (control code 0x{:08X})", code);
    let response = channel.control(code, &[], config.response_len())?;
    let table = FeatureTable::parse(&response)?;
    for (feature, control_code) in table.iter() {
        debug!("Reader feature {} -> 0x{:08X}", feature, control_code);
    }
    Ok(table)
}
