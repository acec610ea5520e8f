use std::fmt;
use std::str::FromStr;

use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};
use fast32::base64;
use serde::{Deserialize, Serialize};

use crate::base32;
use crate::error::OtpError;

/// Text encodings a [Secret](crate::secret::Secret) can be read from and rendered to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// UTF-8 text, bytes taken verbatim
    Utf8,
    /// 7-bit ASCII text
    Ascii,
    /// ISO-8859-1, one byte per character
    Latin1,
    /// Hexadecimal, lowercase on output, either case on input
    Hex,
    /// RFC 4648 base32
    #[default]
    Base32,
    /// RFC 4648 base64 with padding
    Base64,
    /// URL-safe base64 without padding
    Base64Url,
}

impl Encoding {
    /// Canonical name of the encoding
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf8",
            Encoding::Ascii => "ascii",
            Encoding::Latin1 => "latin1",
            Encoding::Hex => "hex",
            Encoding::Base32 => "base32",
            Encoding::Base64 => "base64",
            Encoding::Base64Url => "base64url",
        }
    }

    /// Decode `text` into bytes
    pub fn decode(self, text: &str) -> Result<Vec<u8>, OtpError> {
        let invalid = || OtpError::InvalidText { encoding: self };
        match self {
            Encoding::Utf8 => Ok(text.as_bytes().to_vec()),
            Encoding::Ascii => text
                .is_ascii()
                .then(|| text.as_bytes().to_vec())
                .ok_or_else(invalid),
            Encoding::Latin1 => text
                .chars()
                .map(|c| u8::try_from(c).map_err(|_| invalid()))
                .collect(),
            Encoding::Hex => HEXLOWER_PERMISSIVE
                .decode(text.as_bytes())
                .map_err(|_| invalid()),
            Encoding::Base32 => Ok(base32::decode(text)?),
            Encoding::Base64 => base64::RFC4648.decode_str(text).map_err(|_| invalid()),
            Encoding::Base64Url => base64::RFC4648_URL_NOPAD
                .decode_str(text)
                .map_err(|_| invalid()),
        }
    }

    /// Render `bytes` as text
    ///
    /// Fails for [Encoding::Utf8] and [Encoding::Ascii] when the bytes are not
    /// valid in that encoding.
    pub fn encode(self, bytes: &[u8]) -> Result<String, OtpError> {
        let invalid = || OtpError::InvalidText { encoding: self };
        match self {
            Encoding::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|_| invalid()),
            Encoding::Ascii => bytes
                .is_ascii()
                .then(|| bytes.iter().copied().map(char::from).collect())
                .ok_or_else(invalid),
            Encoding::Latin1 => Ok(bytes.iter().copied().map(char::from).collect()),
            Encoding::Hex => Ok(HEXLOWER.encode(bytes)),
            Encoding::Base32 => Ok(base32::encode(bytes)),
            Encoding::Base64 => Ok(base64::RFC4648.encode(bytes)),
            Encoding::Base64Url => Ok(base64::RFC4648_URL_NOPAD.encode(bytes)),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = OtpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Encoding::Utf8),
            "ascii" => Ok(Encoding::Ascii),
            "latin1" | "binary" => Ok(Encoding::Latin1),
            "hex" => Ok(Encoding::Hex),
            "base32" => Ok(Encoding::Base32),
            "base64" => Ok(Encoding::Base64),
            "base64url" => Ok(Encoding::Base64Url),
            _ => Err(OtpError::UnknownEncoding(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn parses_aliases() {
        assert_eq!("utf-8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert_eq!("UTF8".parse::<Encoding>().unwrap(), Encoding::Utf8);
        assert_eq!("binary".parse::<Encoding>().unwrap(), Encoding::Latin1);
        assert!(matches!(
            "ucs2".parse::<Encoding>(),
            Err(OtpError::UnknownEncoding(name)) if name == "ucs2"
        ));
    }

    #[test]
    fn decodes_each_encoding() {
        assert_eq!(Encoding::Ascii.decode("abc").unwrap(), b"abc");
        assert_eq!(Encoding::Hex.decode("3132FF").unwrap(), [0x31, 0x32, 0xFF]);
        assert_eq!(Encoding::Latin1.decode("\u{e9}").unwrap(), [0xE9]);
        assert_eq!(Encoding::Utf8.decode("\u{e9}").unwrap(), [0xC3, 0xA9]);
        assert_eq!(Encoding::Base32.decode("MZXW6===").unwrap(), b"foo");
        assert_eq!(Encoding::Base64.decode("Zm9vYg==").unwrap(), b"foob");
        assert_eq!(Encoding::Base64Url.decode("-_8").unwrap(), [0xFB, 0xFF]);
    }

    #[test]
    fn rejects_text_outside_the_encoding() {
        assert!(matches!(
            Encoding::Ascii.decode("\u{e9}"),
            Err(OtpError::InvalidText { encoding: Encoding::Ascii })
        ));
        assert!(Encoding::Latin1.decode("\u{20ac}").is_err());
        assert!(Encoding::Hex.decode("zz").is_err());
        assert!(matches!(Encoding::Base32.decode("M1"), Err(OtpError::Base32(_))));
    }

    #[test]
    fn renders_bytes() {
        assert_eq!(Encoding::Hex.encode(&[0xAB, 0x01]).unwrap(), "ab01");
        assert_eq!(Encoding::Base32.encode(b"foo").unwrap(), "MZXW6===");
        assert_eq!(Encoding::Latin1.encode(&[0xE9]).unwrap(), "\u{e9}");
        assert!(Encoding::Utf8.encode(&[0xFF]).is_err());
        assert!(Encoding::Ascii.encode(&[0x80]).is_err());
    }
}
