#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![doc = include_str!("../README.md")]

/// Moving factor to HMAC message conversion
pub mod counter;

/// Base32 encoding and decoding with pluggable alphabets
pub mod base32;

/// Text encodings for secrets
pub mod encoding;

/// Hash algorithms and HMAC computation
pub mod algorithm;

/// Shared secret key material
pub mod secret;

/// One-time password tokens and dynamic truncation
pub mod token;

/// HOTP (HMAC-based One-Time Password) generation and verification
pub mod hotp;

/// TOTP (Time-based One-Time Password) generation and verification
pub mod totp;

/// `otpauth://` provisioning URIs
pub mod uri;

/// Error types
pub mod error;

pub use algorithm::Algorithm;
pub use encoding::Encoding;
pub use error::OtpError;
pub use hotp::{Hotp, HotpConfig, HotpOverrides, SequentialHotp};
pub use secret::Secret;
pub use token::Token;
pub use totp::{Totp, TotpConfig, TotpOverrides};
pub use uri::{KeyUri, OtpKind};
