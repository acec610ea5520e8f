use std::time::SystemTimeError;

use crate::base32;
use crate::counter::CounterOverflow;
use crate::encoding::Encoding;

/// Error type for secret handling and token generation
#[derive(Debug, thiserror::Error)]
pub enum OtpError {
    /// Digits, window or step outside their allowed range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] validator::ValidationErrors),

    /// Token length outside 1 to 10 digits
    #[error("Invalid digits: {0}, expected 1 to 10")]
    InvalidDigits(u8),

    /// Token text that is not all decimal digits
    #[error("Invalid token: expected decimal digits")]
    InvalidToken,

    /// A TOTP step of zero seconds
    #[error("Invalid step: must be at least one second")]
    InvalidStep,

    /// A random secret was requested with a size of zero
    #[error("Invalid secret size: {0}")]
    InvalidSecretSize(usize),

    /// Unrecognised hash algorithm name
    #[error("Unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    /// Unrecognised text encoding name
    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),

    /// Base32 text with a character outside the alphabet
    #[error("Failed to decode base32: {0}")]
    Base32(#[from] base32::DecodeError),

    /// Text or bytes not valid in the requested encoding
    #[error("Invalid {encoding} data")]
    InvalidText {
        /// The encoding that rejected the input
        encoding: Encoding,
    },

    /// Counter bytes wider than 64 bits
    #[error(transparent)]
    CounterOverflow(#[from] CounterOverflow),

    /// The MAC implementation rejected the key
    #[error("Invalid HMAC key length")]
    HmacKey(#[from] hmac::digest::InvalidLength),

    /// The system clock reads earlier than the Unix epoch
    #[error("System clock error: {0}")]
    Clock(#[from] SystemTimeError),
}
