use std::fmt;
use std::str::FromStr;

use ::hmac::digest::core_api::BlockSizeUser;
use ::hmac::digest::{Digest, InvalidLength, KeyInit};
use ::hmac::{Mac, SimpleHmac};
use ring::hmac as ring_hmac;
use serde::{Deserialize, Serialize};
use sha2::{Sha224, Sha512_224, Sha512_256};
use sha3::{Sha3_224, Sha3_256, Sha3_384, Sha3_512};

use crate::error::OtpError;

/// Hash algorithm backing the HMAC of a one-time password
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    /// SHA-1, the RFC 4226 default
    #[default]
    #[serde(rename = "sha1")]
    Sha1,
    /// SHA-224
    #[serde(rename = "sha224")]
    Sha224,
    /// SHA-256
    #[serde(rename = "sha256")]
    Sha256,
    /// SHA-384
    #[serde(rename = "sha384")]
    Sha384,
    /// SHA-512
    #[serde(rename = "sha512")]
    Sha512,
    /// SHA-512/224
    #[serde(rename = "sha-512/224")]
    Sha512_224,
    /// SHA-512/256
    #[serde(rename = "sha-512/256")]
    Sha512_256,
    /// SHA3-224
    #[serde(rename = "sha3-224")]
    Sha3_224,
    /// SHA3-256
    #[serde(rename = "sha3-256")]
    Sha3_256,
    /// SHA3-384
    #[serde(rename = "sha3-384")]
    Sha3_384,
    /// SHA3-512
    #[serde(rename = "sha3-512")]
    Sha3_512,
}

impl Algorithm {
    /// Every supported algorithm
    pub const ALL: [Algorithm; 11] = [
        Algorithm::Sha1,
        Algorithm::Sha224,
        Algorithm::Sha256,
        Algorithm::Sha384,
        Algorithm::Sha512,
        Algorithm::Sha512_224,
        Algorithm::Sha512_256,
        Algorithm::Sha3_224,
        Algorithm::Sha3_256,
        Algorithm::Sha3_384,
        Algorithm::Sha3_512,
    ];

    /// Lowercase canonical name, e.g. `sha-512/256`
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Sha1 => "sha1",
            Algorithm::Sha224 => "sha224",
            Algorithm::Sha256 => "sha256",
            Algorithm::Sha384 => "sha384",
            Algorithm::Sha512 => "sha512",
            Algorithm::Sha512_224 => "sha-512/224",
            Algorithm::Sha512_256 => "sha-512/256",
            Algorithm::Sha3_224 => "sha3-224",
            Algorithm::Sha3_256 => "sha3-256",
            Algorithm::Sha3_384 => "sha3-384",
            Algorithm::Sha3_512 => "sha3-512",
        }
    }

    /// Name used in the `algorithm` parameter of a key URI
    pub fn uri_name(self) -> String {
        self.name().to_ascii_uppercase()
    }

    /// Digest length in bytes
    pub fn digest_len(self) -> usize {
        match self {
            Algorithm::Sha1 => 20,
            Algorithm::Sha224 | Algorithm::Sha512_224 | Algorithm::Sha3_224 => 28,
            Algorithm::Sha256 | Algorithm::Sha512_256 | Algorithm::Sha3_256 => 32,
            Algorithm::Sha384 | Algorithm::Sha3_384 => 48,
            Algorithm::Sha512 | Algorithm::Sha3_512 => 64,
        }
    }

    /// Recommended secret length in bytes
    ///
    /// RFC 2104 advises keys no shorter than the digest, longer keys add
    /// little strength.
    pub fn recommended_secret_size(self) -> usize {
        self.digest_len()
    }

    /// Compute `HMAC(key, message)` with this algorithm
    pub fn sign(self, key: &[u8], message: &[u8]) -> Result<Vec<u8>, InvalidLength> {
        let ring_algorithm = match self {
            Algorithm::Sha1 => ring_hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY,
            Algorithm::Sha256 => ring_hmac::HMAC_SHA256,
            Algorithm::Sha384 => ring_hmac::HMAC_SHA384,
            Algorithm::Sha512 => ring_hmac::HMAC_SHA512,
            Algorithm::Sha224 => return simple_hmac::<Sha224>(key, message),
            Algorithm::Sha512_224 => return simple_hmac::<Sha512_224>(key, message),
            Algorithm::Sha512_256 => return simple_hmac::<Sha512_256>(key, message),
            Algorithm::Sha3_224 => return simple_hmac::<Sha3_224>(key, message),
            Algorithm::Sha3_256 => return simple_hmac::<Sha3_256>(key, message),
            Algorithm::Sha3_384 => return simple_hmac::<Sha3_384>(key, message),
            Algorithm::Sha3_512 => return simple_hmac::<Sha3_512>(key, message),
        };
        let key = ring_hmac::Key::new(ring_algorithm, key);
        Ok(ring_hmac::sign(&key, message).as_ref().to_vec())
    }
}

// ring only ships the SHA-1 and SHA-2 (256/384/512) HMACs
fn simple_hmac<D: Digest + BlockSizeUser>(
    key: &[u8],
    message: &[u8],
) -> Result<Vec<u8>, InvalidLength> {
    let mut mac = <SimpleHmac<D> as KeyInit>::new_from_slice(key)?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = OtpError;

    /// Accepts canonical names case-insensitively, plus `sha512/224` style
    /// spellings without the dash
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_ascii_lowercase();
        let normalized = match normalized.as_str() {
            "sha512/224" | "sha-512-224" => "sha-512/224",
            "sha512/256" | "sha-512-256" => "sha-512/256",
            other => other,
        };
        Algorithm::ALL
            .into_iter()
            .find(|algorithm| algorithm.name() == normalized)
            .ok_or_else(|| OtpError::UnknownAlgorithm(s.to_owned()))
    }
}
