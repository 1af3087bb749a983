use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::EngineError;

/// ISO-like currency code attached to every money value.
///
/// Codes are trimmed and upper-cased on construction, so `" usd"` and `"USD"`
/// are the same key inside a [`CurrencyBucket`](crate::CurrencyBucket).
///
/// Besides ISO 4217 codes the engine accepts local accounting units such as
/// `MLC` or loyalty `POINTS`: any ASCII alphanumeric code of 1 to 8 chars.
///
/// ```rust
/// use engine::CurrencyCode;
///
/// let usd: CurrencyCode = " usd ".parse().unwrap();
/// assert_eq!(usd.as_str(), "USD");
/// assert!("U$D".parse::<CurrencyCode>().is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub const MAX_LEN: usize = 8;

    /// Validates and normalizes a raw code.
    pub fn new(raw: &str) -> Result<Self, EngineError> {
        let code = raw.trim().to_ascii_uppercase();
        if code.is_empty() {
            return Err(EngineError::InvalidCurrency(
                "empty currency code".to_string(),
            ));
        }
        if code.len() > Self::MAX_LEN || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(EngineError::InvalidCurrency(format!(
                "invalid currency code: {raw}"
            )));
        }
        Ok(Self(code))
    }

    /// Builds a code from a compile-time constant that is already normalized.
    pub(crate) fn from_static(code: &'static str) -> Self {
        debug_assert!(Self::new(code).is_ok_and(|c| c.0 == code));
        Self(code.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<&str> for CurrencyCode {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for CurrencyCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CurrencyCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::new(&raw).map_err(serde::de::Error::custom)
    }
}
