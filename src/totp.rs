use std::num::NonZeroU64;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::algorithm::Algorithm;
use crate::error::OtpError;
use crate::hotp::{Hotp, HotpConfig, HotpOverrides};
use crate::secret::Secret;
use crate::token::Token;
use crate::uri::{KeyUri, OtpKind};

/// The default period of TOTP code in seconds
pub const RFC6238_TOTP_PERIOD: u64 = 30;

const DEFAULT_STEP: NonZeroU64 = match NonZeroU64::new(RFC6238_TOTP_PERIOD) {
    Some(step) => step,
    None => unreachable!(),
};

/// TOTP engine configuration: a [HotpConfig] plus the step length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TotpConfig {
    /// Algorithm, digits and window, shared with HOTP
    #[serde(flatten)]
    #[validate(nested)]
    pub hotp: HotpConfig,
    /// Step length in seconds, at least 1
    #[validate(range(min = 1))]
    pub step: u64,
}

impl Default for TotpConfig {
    fn default() -> Self {
        Self {
            hotp: HotpConfig::default(),
            step: RFC6238_TOTP_PERIOD,
        }
    }
}

/// Per-call replacements for fields of a [TotpConfig]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TotpOverrides {
    /// Replaces the algorithm
    pub algorithm: Option<Algorithm>,
    /// Replaces the token length
    pub digits: Option<u8>,
    /// Replaces the window, counted in steps
    pub window: Option<u32>,
    /// Replaces the step length in seconds
    pub step: Option<u64>,
}

/// Step counter for a Unix timestamp in milliseconds: `floor(ms / 1000 / step)`
pub fn counter_for(timestamp_ms: u64, step: NonZeroU64) -> u64 {
    timestamp_ms / 1000 / step
}

/// Current Unix time in milliseconds
pub fn now_ms() -> Result<u64, OtpError> {
    let elapsed = SystemTime::now().duration_since(UNIX_EPOCH)?;
    Ok(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

/// TOTP (RFC 6238) token generation and verification
///
/// Wraps a [Hotp] engine and derives its counter from a timestamp. All
/// timestamps are Unix milliseconds. The window counts steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totp {
    hotp: Hotp,
    step: NonZeroU64,
}

impl Default for Totp {
    fn default() -> Self {
        Self {
            hotp: Hotp::default(),
            step: DEFAULT_STEP,
        }
    }
}

impl Totp {
    /// Create an engine, rejecting out-of-range configuration
    pub fn new(config: TotpConfig) -> Result<Self, OtpError> {
        let step = NonZeroU64::new(config.step).ok_or(OtpError::InvalidStep)?;
        Ok(Self {
            hotp: Hotp::new(config.hotp)?,
            step,
        })
    }

    /// The engine configuration
    pub fn config(&self) -> TotpConfig {
        TotpConfig {
            hotp: *self.hotp.config(),
            step: self.step.get(),
        }
    }

    /// The wrapped HOTP engine
    pub fn hotp(&self) -> &Hotp {
        &self.hotp
    }

    /// Step length in seconds
    pub fn step(&self) -> u64 {
        self.step.get()
    }

    /// A copy of this engine with `overrides` applied
    pub fn with_overrides(&self, overrides: &TotpOverrides) -> Result<Totp, OtpError> {
        let hotp = self.hotp.config().resolve(&HotpOverrides {
            algorithm: overrides.algorithm,
            digits: overrides.digits,
            window: overrides.window,
        })?;
        Totp::new(TotpConfig {
            hotp,
            step: overrides.step.unwrap_or(self.step.get()),
        })
    }

    /// Step counter for `timestamp_ms`
    pub fn counter_at(&self, timestamp_ms: u64) -> u64 {
        counter_for(timestamp_ms, self.step)
    }

    /// Seconds already elapsed in the step containing `timestamp_ms`
    pub fn time_used(&self, timestamp_ms: u64) -> u64 {
        timestamp_ms / 1000 % self.step
    }

    /// Seconds left until the step containing `timestamp_ms` ends
    pub fn time_remaining(&self, timestamp_ms: u64) -> u64 {
        self.step.get() - self.time_used(timestamp_ms)
    }

    /// Generate the token for `timestamp_ms`
    pub fn generate(&self, secret: &Secret, timestamp_ms: u64) -> Result<Token, OtpError> {
        self.hotp.generate(secret, self.counter_at(timestamp_ms))
    }

    /// Generate the token for `timestamp_ms` with per-call overrides
    pub fn generate_with(
        &self,
        secret: &Secret,
        timestamp_ms: u64,
        overrides: &TotpOverrides,
    ) -> Result<Token, OtpError> {
        self.with_overrides(overrides)?.generate(secret, timestamp_ms)
    }

    /// Generate the token for the current time
    pub fn generate_now(&self, secret: &Secret) -> Result<Token, OtpError> {
        self.generate(secret, now_ms()?)
    }

    /// Check `token` against the step containing `timestamp_ms` only
    pub fn equals(
        &self,
        token: &str,
        secret: &Secret,
        timestamp_ms: u64,
    ) -> Result<bool, OtpError> {
        self.hotp.equals(token, secret, self.counter_at(timestamp_ms))
    }

    /// [Totp::equals] with per-call overrides
    pub fn equals_with(
        &self,
        token: &str,
        secret: &Secret,
        timestamp_ms: u64,
        overrides: &TotpOverrides,
    ) -> Result<bool, OtpError> {
        self.with_overrides(overrides)?.equals(token, secret, timestamp_ms)
    }

    /// Search the window of steps around `timestamp_ms` for `token`
    ///
    /// Returns the step offset of the match. A positive offset means the
    /// token belongs to a later step than `timestamp_ms`.
    pub fn compare(
        &self,
        token: &str,
        secret: &Secret,
        timestamp_ms: u64,
    ) -> Result<Option<i64>, OtpError> {
        self.hotp.compare(token, secret, self.counter_at(timestamp_ms))
    }

    /// [Totp::compare] with per-call overrides
    pub fn compare_with(
        &self,
        token: &str,
        secret: &Secret,
        timestamp_ms: u64,
        overrides: &TotpOverrides,
    ) -> Result<Option<i64>, OtpError> {
        self.with_overrides(overrides)?.compare(token, secret, timestamp_ms)
    }

    /// [Totp::compare] at the current time
    pub fn compare_now(&self, token: &str, secret: &Secret) -> Result<Option<i64>, OtpError> {
        self.compare(token, secret, now_ms()?)
    }

    /// Whether `token` matches any step in the window around `timestamp_ms`
    pub fn validate(
        &self,
        token: &str,
        secret: &Secret,
        timestamp_ms: u64,
    ) -> Result<bool, OtpError> {
        Ok(self.compare(token, secret, timestamp_ms)?.is_some())
    }

    /// [Totp::validate] with per-call overrides
    pub fn validate_with(
        &self,
        token: &str,
        secret: &Secret,
        timestamp_ms: u64,
        overrides: &TotpOverrides,
    ) -> Result<bool, OtpError> {
        Ok(self
            .compare_with(token, secret, timestamp_ms, overrides)?
            .is_some())
    }

    /// [Totp::validate] at the current time
    pub fn validate_now(&self, token: &str, secret: &Secret) -> Result<bool, OtpError> {
        Ok(self.compare_now(token, secret)?.is_some())
    }

    /// Provisioning URI for this engine's configuration
    pub fn key_uri(
        &self,
        secret: &Secret,
        account: &str,
        issuer: Option<&str>,
    ) -> Result<String, OtpError> {
        let config = self.hotp.config();
        KeyUri {
            kind: OtpKind::Totp {
                period: self.step.get(),
            },
            secret,
            account,
            issuer,
            algorithm: config.algorithm,
            digits: config.digits,
        }
        .build()
    }
}
