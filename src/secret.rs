use std::fmt;

use rand::{CryptoRng, Rng};

use crate::algorithm::Algorithm;
use crate::encoding::Encoding;
use crate::error::OtpError;

/// The default length of a random secret in bytes
pub const DEFAULT_SECRET_SIZE: usize = 32;

/// Shared key material for HOTP and TOTP
///
/// The bytes are fixed at construction. `Debug` does not print them.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Box<[u8]>);

impl AsRef<[u8]> for Secret {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secret")
            .field("len", &self.0.len())
            .finish_non_exhaustive()
    }
}

impl Secret {
    /// Create a secret from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes.into())
    }

    /// Decode a secret from text in the given encoding
    pub fn from_encoded(text: impl AsRef<str>, encoding: Encoding) -> Result<Self, OtpError> {
        let bytes = encoding.decode(text.as_ref())?;
        Ok(Self(bytes.into_boxed_slice()))
    }

    /// Decode a secret from RFC 4648 base32, padded or not
    pub fn try_from_base32(text: impl AsRef<str>) -> Result<Self, OtpError> {
        Self::from_encoded(text, Encoding::Base32)
    }

    /// Create a random secret of [DEFAULT_SECRET_SIZE] bytes
    pub fn random() -> Self {
        Self::random_bytes(DEFAULT_SECRET_SIZE, &mut rand::rng())
    }

    /// Create a random secret sized for `algorithm`
    pub fn random_for(algorithm: Algorithm) -> Self {
        Self::random_for_with_rng(algorithm, &mut rand::rng())
    }

    /// Create a random secret sized for `algorithm` with a custom rng
    pub fn random_for_with_rng(algorithm: Algorithm, rng: &mut (impl CryptoRng + Rng)) -> Self {
        let secret = Self::random_bytes(algorithm.recommended_secret_size(), rng);
        tracing::debug!(%algorithm, size = secret.len(), "generated secret");
        secret
    }

    /// Create a random secret of `size` bytes
    pub fn random_sized(size: usize) -> Result<Self, OtpError> {
        Self::random_sized_with_rng(size, &mut rand::rng())
    }

    /// Create a random secret of `size` bytes with a custom rng
    pub fn random_sized_with_rng(
        size: usize,
        rng: &mut (impl CryptoRng + Rng),
    ) -> Result<Self, OtpError> {
        if size == 0 {
            return Err(OtpError::InvalidSecretSize(size));
        }
        let secret = Self::random_bytes(size, rng);
        tracing::debug!(size, "generated secret");
        Ok(secret)
    }

    fn random_bytes(size: usize, rng: &mut (impl CryptoRng + Rng)) -> Self {
        let mut bytes = vec![0u8; size];
        rng.fill(bytes.as_mut_slice());
        Self(bytes.into_boxed_slice())
    }

    /// The raw key bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length of the key in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the key is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render the secret as text in the given encoding
    ///
    /// Base32 output keeps its `=` padding.
    pub fn to_text(&self, encoding: Encoding) -> Result<String, OtpError> {
        encoding.encode(&self.0)
    }

    /// Render the secret as padded RFC 4648 base32
    pub fn to_base32(&self) -> String {
        crate::base32::encode(&self.0)
    }
}
