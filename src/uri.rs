use urlencoding::encode;

use crate::algorithm::Algorithm;
use crate::error::OtpError;
use crate::secret::Secret;
use crate::token::check_digits;

/// The moving factor advertised by a key URI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpKind {
    /// Counter based, with the counter the next token will use
    Hotp {
        /// Initial counter value
        counter: u64,
    },
    /// Time based, with the step length in seconds
    Totp {
        /// Step length in seconds
        period: u64,
    },
}

/// An `otpauth://` provisioning URI for authenticator apps
///
/// See the [Key Uri Format](https://github.com/google/google-authenticator/wiki/Key-Uri-Format)
#[derive(Debug, Clone)]
pub struct KeyUri<'a> {
    /// HOTP or TOTP, with its counter or period
    pub kind: OtpKind,
    /// The shared secret
    pub secret: &'a Secret,
    /// Account name, usually an email address or user name
    pub account: &'a str,
    /// Provider name, omitted from the URI when `None` or empty
    pub issuer: Option<&'a str>,
    /// HMAC algorithm
    pub algorithm: Algorithm,
    /// Token length
    pub digits: u8,
}

impl KeyUri<'_> {
    /// Serialize to `otpauth://{hotp|totp}/{issuer:}account?...`
    ///
    /// Fails with [`OtpError::InvalidDigits`] when `digits` is outside 1..=10
    /// and with [`OtpError::InvalidStep`] for a zero TOTP period, since
    /// authenticator apps reject such URIs.
    pub fn build(&self) -> Result<String, OtpError> {
        check_digits(self.digits)?;
        let (kind, factor_name, factor) = match self.kind {
            OtpKind::Hotp { counter } => ("hotp", "counter", counter),
            OtpKind::Totp { period: 0 } => return Err(OtpError::InvalidStep),
            OtpKind::Totp { period } => ("totp", "period", period),
        };
        let mut uri = format!("otpauth://{kind}/");
        if let Some(issuer) = self.issuer() {
            uri.push_str(&encode(issuer));
            uri.push(':');
        }
        let secret = self.secret.to_base32();
        uri.push_str(&format!(
            "{}?secret={}&algorithm={}&digits={}&{factor_name}={factor}",
            encode(self.account),
            encode(secret.trim_end_matches('=')),
            encode(&self.algorithm.uri_name()),
            self.digits,
        ));
        if let Some(issuer) = self.issuer() {
            uri.push_str("&issuer=");
            uri.push_str(&encode(issuer));
        }
        Ok(uri)
    }

    fn issuer(&self) -> Option<&str> {
        self.issuer.filter(|issuer| !issuer.is_empty())
    }
}
