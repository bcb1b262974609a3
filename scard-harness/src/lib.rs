//! Test-harness helpers for smart-card readers
//!
//! This crate sits on top of the native PC/SC binding, which is reached only
//! through the [`ControlChannel`] and [`CardChannel`] traits. It provides:
//!
//! - control-code computation for pcsc-lite and WinSCard
//! - PC/SC part 10 feature discovery (`CM_IOCTL_GET_FEATURE_REQUEST`)
//! - reader TLV properties (`FEATURE_GET_TLV_PROPERTIES`)
//! - short command/response APDU framing

pub mod apdu;
pub mod config;
pub mod control;
pub mod feature;
pub mod properties;

pub use apdu::{transmit_apdu, CardChannel, CommandApdu, ResponseApdu};
pub use config::HarnessConfig;
pub use control::{ControlChannel, ControlCodeScheme, CM_IOCTL_GET_FEATURE_REQUEST};
pub use feature::{discover_features, Feature, FeatureTable};
pub use properties::{query_properties, ReaderProperties};
pub use scard_core::{ScardError, ScardResult};
