//! Harness configuration
//!
//! # Usage Example
//!
//! ```rust
//! use scard_harness::{ControlCodeScheme, HarnessConfig};
//!
//! let config = HarnessConfig::new()
//!     .control_scheme(ControlCodeScheme::PcscLite)
//!     .max_response_len(512);
//! assert_eq!(config.feature_request_code(), 0x4200_0D48);
//! ```

use crate::control::{ControlCodeScheme, CM_IOCTL_GET_FEATURE_REQUEST};

/// Receive buffer length for control calls
pub const DEFAULT_MAX_RESPONSE_LEN: usize = 256;

/// Settings shared by the harness control calls
///
/// # Default Settings
/// - Control code scheme: native to the build target
/// - Max response length: 256 bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    control_scheme: ControlCodeScheme,
    max_response_len: usize,
}

impl HarnessConfig {
    pub fn new() -> Self {
        Self {
            control_scheme: ControlCodeScheme::native(),
            max_response_len: DEFAULT_MAX_RESPONSE_LEN,
        }
    }

    /// Override the control code scheme, e.g. when talking to a remote
    /// pcsc-lite daemon from another platform
    pub fn control_scheme(mut self, scheme: ControlCodeScheme) -> Self {
        self.control_scheme = scheme;
        self
    }

    pub fn max_response_len(mut self, len: usize) -> Self {
        self.max_response_len = len;
        self
    }

    pub fn scheme(&self) -> ControlCodeScheme {
        self.control_scheme
    }

    pub fn response_len(&self) -> usize {
        self.max_response_len
    }

    /// Control code of `CM_IOCTL_GET_FEATURE_REQUEST` under the configured scheme
    pub fn feature_request_code(&self) -> u32 {
        self.control_scheme.ctl_code(CM_IOCTL_GET_FEATURE_REQUEST)
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self::new()
    }
}
