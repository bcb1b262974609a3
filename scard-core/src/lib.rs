//! Core types for the smart-card TLV codec and its test harness
//!
//! This crate provides the error taxonomy used throughout the workspace.

pub mod error;

pub use error::{ScardError, ScardResult, TlvError, TlvResult};
