use std::fmt;
use std::ops::RangeInclusive;

use compact_str::{CompactString, format_compact};
use serde::{Deserialize, Serialize};

use crate::algorithm::Algorithm;
use crate::counter;
use crate::error::OtpError;

/// Allowed token lengths. The truncated value is 31 bits, so longer tokens
/// would only add leading zeros.
pub const DIGITS_RANGE: RangeInclusive<u8> = 1..=10;

/// A one-time password: exactly `digits` decimal characters, zero padded
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct Token(CompactString);

impl Token {
    /// Compute the token for `counter` following RFC 4226 section 5.3
    pub fn compute(
        secret: &[u8],
        counter: u64,
        algorithm: Algorithm,
        digits: u8,
    ) -> Result<Self, OtpError> {
        let modulus = check_digits(digits)?;
        let digest = algorithm.sign(secret, &counter::encode(counter))?;
        let code = u64::from(truncate(&digest)) % modulus;
        Ok(Self(format_compact!("{:0width$}", code, width = usize::from(digits))))
    }

    /// The token text
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Number of digits in the token
    pub fn digits(&self) -> usize {
        self.0.len()
    }

    /// Compare against a candidate in constant time
    ///
    /// Tokens of different length compare unequal without inspecting
    /// their contents.
    pub fn matches(&self, candidate: &str) -> bool {
        constant_time_eq(self.0.as_bytes(), candidate.as_bytes())
    }
}

impl TryFrom<String> for Token {
    type Error = OtpError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        let digits = u8::try_from(text.len()).unwrap_or(u8::MAX);
        check_digits(digits)?;
        if !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OtpError::InvalidToken);
        }
        Ok(Self(text.into()))
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check a token length and return `10^digits`
pub(crate) fn check_digits(digits: u8) -> Result<u64, OtpError> {
    if !DIGITS_RANGE.contains(&digits) {
        return Err(OtpError::InvalidDigits(digits));
    }
    10u64
        .checked_pow(u32::from(digits))
        .ok_or(OtpError::InvalidDigits(digits))
}

/// Dynamic truncation: pick 4 bytes at the offset given by the low nibble of
/// the last digest byte and clear the sign bit.
///
/// `digest` must be at least 20 bytes long.
pub(crate) fn truncate(digest: &[u8]) -> u32 {
    let offset = usize::from(digest[digest.len() - 1] & 0x0f);
    u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ])
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use data_encoding::HEXLOWER;

    #[test]
    fn truncates_rfc4226_example() {
        // RFC 4226 section 5.4
        let digest = HEXLOWER
            .decode(b"1f8698690e02ca16618550ef7f19da8e945b555a")
            .unwrap();
        assert_eq!(truncate(&digest), 0x50ef7f19);
    }

    #[test]
    fn truncation_clears_the_sign_bit() {
        let mut digest = [0xffu8; 20];
        digest[19] = 0x00;
        assert_eq!(truncate(&digest), 0x7fff_ffff);
    }

    #[test]
    fn pads_with_leading_zeros() {
        // counter 1111111109 / 30 with the RFC 6238 sha1 seed gives 07081804
        let token = Token::compute(b"12345678901234567890", 0x23523EC, Algorithm::Sha1, 8).unwrap();
        assert_eq!(token.as_str(), "07081804");
        assert_eq!(token.digits(), 8);
    }

    #[test]
    fn ten_digit_tokens_stay_in_range() {
        let token = Token::compute(b"12345678901234567890", 0, Algorithm::Sha1, 10).unwrap();
        assert_eq!(token.as_str(), "1284755224");
    }

    #[test]
    fn rejects_lengths_outside_one_to_ten() {
        for digits in [0, 11, 20, u8::MAX] {
            assert!(matches!(
                Token::compute(b"12345678901234567890", 0, Algorithm::Sha1, digits),
                Err(OtpError::InvalidDigits(d)) if d == digits
            ));
        }
        let one = Token::compute(b"12345678901234567890", 0, Algorithm::Sha1, 1).unwrap();
        assert_eq!(one.as_str(), "4");
    }

    #[test]
    fn deserializing_checks_the_token_shape() {
        let token: Token = serde_json::from_str("\"07081804\"").unwrap();
        assert_eq!(token.as_str(), "07081804");
        assert!(serde_json::from_str::<Token>("\"abc\"").is_err());
        assert!(serde_json::from_str::<Token>("\"\"").is_err());
        assert!(serde_json::from_str::<Token>("\"12345678901\"").is_err());
        assert_eq!(serde_json::to_string(&token).unwrap(), "\"07081804\"");
    }

    #[test]
    fn matching_is_length_checked() {
        let token = Token::compute(b"12345678901234567890", 0, Algorithm::Sha1, 6).unwrap();
        assert!(token.matches("755224"));
        assert!(!token.matches("755225"));
        assert!(!token.matches("0755224"));
        assert!(!token.matches("75522"));
        assert!(!token.matches(""));
    }
}
