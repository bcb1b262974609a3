//! Reader control channel and control codes

use scard_core::ScardResult;

/// Function number of the PC/SC part 10 feature request
pub const CM_IOCTL_GET_FEATURE_REQUEST: u32 = 3400;

/// `FILE_DEVICE_SMARTCARD` device type on Windows
const FILE_DEVICE_SMARTCARD: u32 = 0x31;

/// `CTL_CODE` function field width
const CTL_FUNCTION_MASK: u32 = 0x0FFF;

/// How a control function number maps to a control code (`SCARD_CTL_CODE`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCodeScheme {
    /// pcsc-lite: `0x42000000 + function`
    PcscLite,
    /// WinSCard: `CTL_CODE(FILE_DEVICE_SMARTCARD, function, METHOD_BUFFERED, FILE_ANY_ACCESS)`
    WinSCard,
}

impl ControlCodeScheme {
    /// Scheme of the platform this crate is built for
    pub const fn native() -> Self {
        if cfg!(windows) {
            ControlCodeScheme::WinSCard
        } else {
            ControlCodeScheme::PcscLite
        }
    }

    /// Control code of `function`
    ///
    /// pcsc-lite wraps around past `u32::MAX`. WinSCard keeps only the low
    /// 12 bits of `function`, the width of the `CTL_CODE` function field.
    pub const fn ctl_code(self, function: u32) -> u32 {
        match self {
            ControlCodeScheme::PcscLite => 0x4200_0000u32.wrapping_add(function),
            ControlCodeScheme::WinSCard => {
                (FILE_DEVICE_SMARTCARD << 16) | ((function & CTL_FUNCTION_MASK) << 2)
            }
        }
    }
}

impl Default for ControlCodeScheme {
    fn default() -> Self {
        Self::native()
    }
}

/// Control call of a connected reader (`SCardControl`)
///
/// Implemented by the native binding; the harness only needs the raw
/// response bytes.
#[cfg_attr(test, mockall::automock)]
pub trait ControlChannel {
    /// Send `input` with control code `code` and return at most
    /// `max_response` bytes of response
    fn control(&mut self, code: u32, input: &[u8], max_response: usize) -> ScardResult<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_request_codes() {
        assert_eq!(
            ControlCodeScheme::PcscLite.ctl_code(CM_IOCTL_GET_FEATURE_REQUEST),
            0x4200_0D48
        );
        assert_eq!(
            ControlCodeScheme::WinSCard.ctl_code(CM_IOCTL_GET_FEATURE_REQUEST),
            0x0031_3520
        );
    }

    #[test]
    fn test_out_of_range_functions() {
        assert_eq!(
            ControlCodeScheme::WinSCard.ctl_code(0x1000 | CM_IOCTL_GET_FEATURE_REQUEST),
            0x0031_3520
        );
        assert_eq!(ControlCodeScheme::WinSCard.ctl_code(u32::MAX), 0x0031_3FFC);
        assert_eq!(ControlCodeScheme::PcscLite.ctl_code(u32::MAX), 0x41FF_FFFF);
        assert_eq!(ControlCodeScheme::PcscLite.ctl_code(0xBE00_0000), 0x0000_0000);
    }

    #[test]
    fn test_default_is_native() {
        assert_eq!(ControlCodeScheme::default(), ControlCodeScheme::native());
    }
}
