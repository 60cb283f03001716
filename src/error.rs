//! Aggregate error type (§7).
//!
//! Per-component errors (`ParseError`, `ReservedKey`, ...) are kept local to
//! their modules; `DeviceError` exists only at the boundaries that need to
//! report one of several failure kinds to a caller, such as device
//! construction. Internal paths that §7 calls "discard silently" or
//! "ignore" never produce a `DeviceError` — they log at debug level and
//! return early instead.

use thiserror::Error;

use crate::parse::ParseError;
use crate::property::ReservedKey;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("no signal named '{0}'")]
    UnknownSignal(String),

    #[error("a signal named '{0}' is already registered")]
    DuplicateSignal(String),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Property(#[from] ReservedKey),

    #[error("device configuration is invalid: {0}")]
    InvalidConfig(String),
}
