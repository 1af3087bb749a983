use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CurrencyCode, EngineError};

/// A single money value: an amount tagged with its currency.
///
/// Two `CurrencyAmount`s are never added directly. Combining values always
/// goes through a [`CurrencyBucket`](crate::CurrencyBucket), which keeps one
/// running sum per currency code.
///
/// The wire shape is `{ "amount": 10.5, "codeCurrency": "USD" }`; order
/// `prices` use `price` instead of `amount` and are accepted as well.
///
/// # Examples
///
/// ```rust
/// use engine::CurrencyAmount;
///
/// let amount: CurrencyAmount = "12,50 usd".parse().unwrap();
/// assert_eq!(amount.to_string(), "12.50 USD");
/// assert!("12.50".parse::<CurrencyAmount>().is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyAmount {
    #[serde(alias = "price")]
    pub amount: Decimal,
    #[serde(rename = "codeCurrency")]
    pub currency: CurrencyCode,
}

impl CurrencyAmount {
    #[must_use]
    pub fn new(amount: Decimal, currency: CurrencyCode) -> Self {
        Self { amount, currency }
    }

    /// Returns the same value with the opposite sign.
    #[must_use]
    pub fn negated(&self) -> Self {
        Self {
            amount: -self.amount,
            currency: self.currency.clone(),
        }
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns `true` if the amount is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// Rejects zero and negative amounts with a labeled error.
    pub(crate) fn ensure_positive(&self, label: &str) -> Result<(), EngineError> {
        if !self.is_positive() {
            return Err(EngineError::InvalidAmount(format!(
                "{label} must be > 0, got {self}"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for CurrencyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

impl FromStr for CurrencyAmount {
    type Err = EngineError;

    /// Parses `"<amount> <code>"`.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(EngineError::InvalidAmount("empty amount".to_string()));
        }

        let mut parts = trimmed.split_whitespace();
        let amount_str = parts
            .next()
            .ok_or_else(|| EngineError::InvalidAmount("empty amount".to_string()))?;
        let code_str = parts
            .next()
            .ok_or_else(|| EngineError::InvalidCurrency(format!("missing currency in '{s}'")))?;
        if parts.next().is_some() {
            return Err(EngineError::InvalidAmount(format!("invalid amount: {s}")));
        }

        let amount = Decimal::from_str(&amount_str.replace(',', "."))
            .map_err(|_| EngineError::InvalidAmount(format!("invalid amount: {amount_str}")))?;
        let currency = CurrencyCode::new(code_str)?;

        Ok(Self { amount, currency })
    }
}
