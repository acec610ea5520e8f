use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::algorithm::Algorithm;
use crate::counter::CounterOverflow;
use crate::error::OtpError;
use crate::secret::Secret;
use crate::token::Token;
use crate::uri::{KeyUri, OtpKind};

/// The default token length
pub const DEFAULT_DIGITS: u8 = 6;

/// The default number of counter steps searched on each side during validation
pub const DEFAULT_WINDOW: u32 = 1;

/// HOTP engine configuration
///
/// Keep `window` small: validation costs one HMAC per counter tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct HotpConfig {
    /// HMAC algorithm
    pub algorithm: Algorithm,
    /// Token length, 1 to 10. The truncated value is 31 bits, so longer
    /// tokens would only add leading zeros.
    #[validate(range(min = 1, max = 10))]
    pub digits: u8,
    /// Counter steps searched on each side of the expected counter
    pub window: u32,
}

impl Default for HotpConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Sha1,
            digits: DEFAULT_DIGITS,
            window: DEFAULT_WINDOW,
        }
    }
}

/// Per-call replacements for fields of a [HotpConfig]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HotpOverrides {
    /// Replaces [HotpConfig::algorithm]
    pub algorithm: Option<Algorithm>,
    /// Replaces [HotpConfig::digits]
    pub digits: Option<u8>,
    /// Replaces [HotpConfig::window]
    pub window: Option<u32>,
}

impl HotpConfig {
    /// Apply `overrides` on top of this configuration and validate the result
    pub fn resolve(&self, overrides: &HotpOverrides) -> Result<HotpConfig, OtpError> {
        let resolved = HotpConfig {
            algorithm: overrides.algorithm.unwrap_or(self.algorithm),
            digits: overrides.digits.unwrap_or(self.digits),
            window: overrides.window.unwrap_or(self.window),
        };
        resolved.validate()?;
        Ok(resolved)
    }
}

/// HOTP (RFC 4226) token generation and verification
///
/// The engine holds no counter: every call names the counter it uses. For
/// sequential issuance see [SequentialHotp].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hotp {
    config: HotpConfig,
}

impl Hotp {
    /// Create an engine, rejecting out-of-range configuration
    pub fn new(config: HotpConfig) -> Result<Self, OtpError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The engine configuration
    pub fn config(&self) -> &HotpConfig {
        &self.config
    }

    /// Generate the token for `counter`
    pub fn generate(&self, secret: &Secret, counter: u64) -> Result<Token, OtpError> {
        generate(&self.config, secret, counter)
    }

    /// Generate the token for `counter` with per-call overrides
    pub fn generate_with(
        &self,
        secret: &Secret,
        counter: u64,
        overrides: &HotpOverrides,
    ) -> Result<Token, OtpError> {
        generate(&self.config.resolve(overrides)?, secret, counter)
    }

    /// Check `token` against `counter` exactly, in constant time
    pub fn equals(&self, token: &str, secret: &Secret, counter: u64) -> Result<bool, OtpError> {
        Ok(self.generate(secret, counter)?.matches(token))
    }

    /// [Hotp::equals] with per-call overrides
    pub fn equals_with(
        &self,
        token: &str,
        secret: &Secret,
        counter: u64,
        overrides: &HotpOverrides,
    ) -> Result<bool, OtpError> {
        Ok(self.generate_with(secret, counter, overrides)?.matches(token))
    }

    /// Search the window around `counter` for `token`
    ///
    /// Tries offsets 0, +1, -1, +2, -2, ... up to the window and returns the
    /// first matching offset, or `None`.
    pub fn compare(
        &self,
        token: &str,
        secret: &Secret,
        counter: u64,
    ) -> Result<Option<i64>, OtpError> {
        search(&self.config, token, secret, counter)
    }

    /// [Hotp::compare] with per-call overrides
    pub fn compare_with(
        &self,
        token: &str,
        secret: &Secret,
        counter: u64,
        overrides: &HotpOverrides,
    ) -> Result<Option<i64>, OtpError> {
        search(&self.config.resolve(overrides)?, token, secret, counter)
    }

    /// Whether `token` matches any counter in the window around `counter`
    pub fn validate(&self, token: &str, secret: &Secret, counter: u64) -> Result<bool, OtpError> {
        Ok(self.compare(token, secret, counter)?.is_some())
    }

    /// [Hotp::validate] with per-call overrides
    pub fn validate_with(
        &self,
        token: &str,
        secret: &Secret,
        counter: u64,
        overrides: &HotpOverrides,
    ) -> Result<bool, OtpError> {
        Ok(self.compare_with(token, secret, counter, overrides)?.is_some())
    }

    /// Provisioning URI for this engine's configuration
    pub fn key_uri(
        &self,
        secret: &Secret,
        account: &str,
        issuer: Option<&str>,
        counter: u64,
    ) -> Result<String, OtpError> {
        KeyUri {
            kind: OtpKind::Hotp { counter },
            secret,
            account,
            issuer,
            algorithm: self.config.algorithm,
            digits: self.config.digits,
        }
        .build()
    }
}

fn generate(
    config: &HotpConfig,
    secret: &Secret,
    counter: u64,
) -> Result<Token, OtpError> {
    Token::compute(secret.as_bytes(), counter, config.algorithm, config.digits)
}

fn search(
    config: &HotpConfig,
    token: &str,
    secret: &Secret,
    counter: u64,
) -> Result<Option<i64>, OtpError> {
    for offset in search_offsets(config.window) {
        // counters below zero or above u64::MAX do not exist
        let Some(candidate) = counter.checked_add_signed(offset) else {
            continue;
        };
        tracing::trace!(offset, "probing counter");
        if generate(config, secret, candidate)?.matches(token) {
            tracing::debug!(offset, "token matched");
            return Ok(Some(offset));
        }
    }
    tracing::debug!(window = config.window, "no token matched");
    Ok(None)
}

fn search_offsets(window: u32) -> impl Iterator<Item = i64> {
    std::iter::once(0).chain((1..=i64::from(window)).flat_map(|step| [step, -step]))
}

/// Sequential HOTP issuance and verification over one secret
///
/// Owns the counter. Methods take `&mut self`, so sharing one instance
/// between threads needs a lock around it.
#[derive(Debug, Clone)]
pub struct SequentialHotp {
    hotp: Hotp,
    secret: Secret,
    counter: u64,
}

impl SequentialHotp {
    /// Start issuing at `counter`
    pub fn new(hotp: Hotp, secret: Secret, counter: u64) -> Self {
        Self {
            hotp,
            secret,
            counter,
        }
    }

    /// The counter the next token will use
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// The underlying engine
    pub fn hotp(&self) -> &Hotp {
        &self.hotp
    }

    /// Issue the token for the current counter and advance it
    pub fn next_token(&mut self) -> Result<Token, OtpError> {
        let next = self.counter.checked_add(1).ok_or(CounterOverflow)?;
        let token = self.hotp.generate(&self.secret, self.counter)?;
        self.counter = next;
        Ok(token)
    }

    /// Verify `token` at or ahead of the current counter
    ///
    /// On a match the counter moves one past the matched value (RFC 4226
    /// section 7.4 resynchronization). Matches behind the counter are
    /// rejected so a token is never accepted twice.
    pub fn accept(&mut self, token: &str) -> Result<bool, OtpError> {
        let Some(offset) = self.hotp.compare(token, &self.secret, self.counter)? else {
            return Ok(false);
        };
        let Ok(ahead) = u64::try_from(offset) else {
            tracing::debug!(offset, "rejected token behind the counter");
            return Ok(false);
        };
        self.counter = self
            .counter
            .checked_add(ahead)
            .and_then(|matched| matched.checked_add(1))
            .ok_or(CounterOverflow)?;
        Ok(true)
    }

    /// Provisioning URI advertising the current counter
    pub fn key_uri(&self, account: &str, issuer: Option<&str>) -> Result<String, OtpError> {
        self.hotp.key_uri(&self.secret, account, issuer, self.counter)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn rfc_secret() -> Secret {
        Secret::from_bytes(b"12345678901234567890")
    }

    #[test]
    fn searches_outward_from_the_expected_counter() {
        assert_eq!(search_offsets(0).collect::<Vec<_>>(), [0]);
        assert_eq!(search_offsets(2).collect::<Vec<_>>(), [0, 1, -1, 2, -2]);
    }

    #[test]
    fn generate_is_deterministic() {
        let hotp = Hotp::default();
        let secret = Secret::random();
        assert_eq!(
            hotp.generate(&secret, 42).unwrap(),
            hotp.generate(&secret, 42).unwrap()
        );
    }

    #[test]
    fn compare_reports_the_drift_offset() {
        let hotp = Hotp::new(HotpConfig {
            window: 3,
            ..Default::default()
        })
        .unwrap();
        let secret = rfc_secret();
        let base: u64 = 100;
        for k in -3i64..=3 {
            let token = hotp
                .generate(&secret, base.checked_add_signed(k).unwrap())
                .unwrap();
            assert_eq!(hotp.compare(token.as_str(), &secret, base).unwrap(), Some(k));
        }
        for k in [-5i64, -4, 4, 5] {
            let token = hotp
                .generate(&secret, base.checked_add_signed(k).unwrap())
                .unwrap();
            assert_eq!(hotp.compare(token.as_str(), &secret, base).unwrap(), None);
        }
    }

    #[test]
    fn compare_skips_negative_counters() {
        let hotp = Hotp::default();
        let secret = rfc_secret();
        assert_eq!(hotp.compare("755224", &secret, 0).unwrap(), Some(0));
        assert_eq!(hotp.compare("287082", &secret, 0).unwrap(), Some(1));
        assert_eq!(hotp.compare("359152", &secret, 0).unwrap(), None);
    }

    #[test]
    fn compare_skips_counters_past_u64_max() {
        let hotp = Hotp::new(HotpConfig {
            digits: 10,
            ..Default::default()
        })
        .unwrap();
        let secret = rfc_secret();
        let last = hotp.generate(&secret, u64::MAX).unwrap();
        let before = hotp.generate(&secret, u64::MAX - 1).unwrap();
        let outside = hotp.generate(&secret, u64::MAX - 2).unwrap();

        assert_eq!(hotp.compare(last.as_str(), &secret, u64::MAX).unwrap(), Some(0));
        assert_eq!(hotp.compare(before.as_str(), &secret, u64::MAX).unwrap(), Some(-1));
        // +1 does not exist, so the search ends after 0 and -1
        assert_eq!(hotp.compare(outside.as_str(), &secret, u64::MAX).unwrap(), None);
    }

    #[test]
    fn equals_checks_only_the_given_counter() {
        let hotp = Hotp::default();
        let secret = rfc_secret();
        assert!(hotp.equals("969429", &secret, 3).unwrap());
        assert!(!hotp.equals("969429", &secret, 4).unwrap());
        assert!(!hotp.equals("96942", &secret, 3).unwrap());
        assert!(hotp.validate("969429", &secret, 4).unwrap());
        assert!(!hotp.validate("969429", &secret, 5).unwrap());
    }

    #[test]
    fn overrides_replace_engine_settings() {
        let hotp = Hotp::default();
        let secret = rfc_secret();
        let eight = HotpOverrides {
            digits: Some(8),
            ..Default::default()
        };
        let token = hotp.generate_with(&secret, 0, &eight).unwrap();
        assert_eq!(token.as_str(), "84755224");
        assert!(hotp.equals_with("84755224", &secret, 0, &eight).unwrap());

        let wide = HotpOverrides {
            window: Some(5),
            ..Default::default()
        };
        assert_eq!(hotp.compare_with("520489", &secret, 5, &wide).unwrap(), Some(4));
        assert!(hotp.validate_with("520489", &secret, 5, &wide).unwrap());
        assert!(!hotp.validate("520489", &secret, 5).unwrap());
        assert_eq!(hotp.config().window, DEFAULT_WINDOW);
    }

    #[test]
    fn rejects_out_of_range_digits() {
        for digits in [0, 11] {
            let config = HotpConfig {
                digits,
                ..Default::default()
            };
            assert!(matches!(Hotp::new(config), Err(OtpError::InvalidConfig(_))));
        }
        let overrides = HotpOverrides {
            digits: Some(0),
            ..Default::default()
        };
        assert!(
            Hotp::default()
                .generate_with(&rfc_secret(), 0, &overrides)
                .is_err()
        );
    }

    #[test]
    fn config_loads_from_partial_json() {
        let config: HotpConfig =
            serde_json::from_str(r#"{"algorithm": "sha256", "digits": 8}"#).unwrap();
        assert_eq!(config.algorithm, Algorithm::Sha256);
        assert_eq!(config.digits, 8);
        assert_eq!(config.window, DEFAULT_WINDOW);
    }

    #[test]
    fn sequential_issuer_advances_and_resyncs() {
        let mut issuer = SequentialHotp::new(Hotp::default(), rfc_secret(), 0);
        assert_eq!(issuer.next_token().unwrap().as_str(), "755224");
        assert_eq!(issuer.next_token().unwrap().as_str(), "287082");
        assert_eq!(issuer.counter(), 2);

        // the client skipped counter 2
        assert!(issuer.accept("969429").unwrap());
        assert_eq!(issuer.counter(), 4);

        // replaying an older token fails even inside the window
        assert!(!issuer.accept("969429").unwrap());
        assert_eq!(issuer.counter(), 4);
        assert!(issuer.accept("338314").unwrap());
        assert_eq!(issuer.counter(), 5);
    }

    #[test]
    fn sequential_issuer_stops_at_the_last_counter() {
        let mut issuer = SequentialHotp::new(Hotp::default(), rfc_secret(), u64::MAX);
        assert!(matches!(
            issuer.next_token(),
            Err(OtpError::CounterOverflow(_))
        ));
        assert_eq!(issuer.counter(), u64::MAX);
    }

    #[test]
    fn key_uri_uses_engine_settings() {
        let hotp = Hotp::new(HotpConfig {
            algorithm: Algorithm::Sha256,
            digits: 8,
            window: 1,
        })
        .unwrap();
        let uri = hotp
            .key_uri(&Secret::from_bytes(b"foo"), "alice", Some("ACME"), 7)
            .unwrap();
        assert_eq!(
            uri,
            "otpauth://hotp/ACME:alice?secret=MZXW6&algorithm=SHA256&digits=8&counter=7&issuer=ACME"
        );
    }
}
