//! Per-currency accumulator.
//!
//! A [`CurrencyBucket`] is the only way two money values get combined: each
//! currency code owns its own running sum, so adding `USD` to `EUR` is not
//! expressible. Both the account ledger (balances) and the report aggregator
//! (metric totals) are built on it.

use std::{borrow::Borrow, collections::BTreeMap, fmt};

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{CurrencyAmount, CurrencyCode, EngineError, ResultEngine};

/// Mapping `currency code → amount`.
///
/// Zero entries are dropped after every mutation, so a bucket never stores
/// `{"USD": 0}`: applying a value and then its negation restores an identical
/// bucket. Sums are checked; a sum that does not fit fails with
/// `InvalidAmount` and leaves the bucket untouched.
///
/// ```rust
/// use engine::{CurrencyAmount, CurrencyBucket};
///
/// let amounts = ["100 USD", "-30 USD", "50 EUR"]
///     .map(|raw| raw.parse::<CurrencyAmount>().unwrap());
/// let bucket = CurrencyBucket::from_amounts(&amounts).unwrap();
/// assert_eq!(bucket.to_string(), "50 EUR, 70 USD");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CurrencyBucket(BTreeMap<CurrencyCode, Decimal>);

impl CurrencyBucket {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sums `amounts` per currency.
    pub fn from_amounts<A: Borrow<CurrencyAmount>>(
        amounts: impl IntoIterator<Item = A>,
    ) -> ResultEngine<Self> {
        let mut bucket = Self::new();
        for amount in amounts {
            bucket.add(amount.borrow())?;
        }
        Ok(bucket)
    }

    /// Adds a signed amount to its currency entry.
    pub fn add(&mut self, amount: &CurrencyAmount) -> ResultEngine<()> {
        self.add_amount(&amount.currency, amount.amount)
    }

    /// Adds a signed raw amount to `currency`.
    pub fn add_amount(&mut self, currency: &CurrencyCode, amount: Decimal) -> ResultEngine<()> {
        if amount.is_zero() {
            return Ok(());
        }
        let sum = self
            .amount_or_zero(currency)
            .checked_add(amount)
            .ok_or_else(EngineError::amount_too_large)?;
        if sum.is_zero() {
            self.0.remove(currency);
        } else {
            self.0.insert(currency.clone(), sum);
        }
        Ok(())
    }

    /// Adds every entry of `other` into `self`, all or nothing.
    pub fn merge(&mut self, other: &CurrencyBucket) -> ResultEngine<()> {
        let mut next = self.clone();
        for (currency, amount) in &other.0 {
            next.add_amount(currency, *amount)?;
        }
        *self = next;
        Ok(())
    }

    /// Subtracts every entry of `other` from `self`, all or nothing.
    pub fn subtract(&mut self, other: &CurrencyBucket) -> ResultEngine<()> {
        self.merge(&other.negated())
    }

    /// Returns a bucket with every entry negated.
    #[must_use]
    pub fn negated(&self) -> Self {
        Self(self.0.iter().map(|(c, a)| (c.clone(), -*a)).collect())
    }

    /// Amount held for `currency`, or `None` when the currency has no entry.
    #[must_use]
    pub fn get(&self, currency: &CurrencyCode) -> Option<Decimal> {
        self.0.get(currency).copied()
    }

    /// Amount held for `currency`, zero when absent.
    #[must_use]
    pub fn amount_or_zero(&self, currency: &CurrencyCode) -> Decimal {
        self.get(currency).unwrap_or(Decimal::ZERO)
    }

    /// First entry in currency-code order.
    #[must_use]
    pub fn first(&self) -> Option<CurrencyAmount> {
        self.0
            .iter()
            .next()
            .map(|(currency, amount)| CurrencyAmount::new(*amount, currency.clone()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CurrencyCode, &Decimal)> {
        self.0.iter()
    }

    pub fn currencies(&self) -> impl Iterator<Item = &CurrencyCode> {
        self.0.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for CurrencyBucket {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = BTreeMap::<CurrencyCode, Decimal>::deserialize(deserializer)?;
        let mut bucket = Self::new();
        for (currency, amount) in &entries {
            bucket
                .add_amount(currency, *amount)
                .map_err(serde::de::Error::custom)?;
        }
        Ok(bucket)
    }
}

impl<'a> IntoIterator for &'a CurrencyBucket {
    type Item = (&'a CurrencyCode, &'a Decimal);
    type IntoIter = std::collections::btree_map::Iter<'a, CurrencyCode, Decimal>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for CurrencyBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("0");
        }
        let mut first = true;
        for (currency, amount) in &self.0 {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{amount} {currency}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn code(raw: &str) -> CurrencyCode {
        CurrencyCode::new(raw).unwrap()
    }

    fn amount(value: Decimal, currency: &str) -> CurrencyAmount {
        CurrencyAmount::new(value, code(currency))
    }

    fn bucket(entries: &[(Decimal, &str)]) -> CurrencyBucket {
        CurrencyBucket::from_amounts(entries.iter().map(|(v, c)| amount(*v, c))).unwrap()
    }

    #[test]
    fn keeps_currencies_apart() {
        let bucket = bucket(&[(dec!(100), "USD"), (dec!(-30), "USD"), (dec!(50), "EUR")]);

        assert_eq!(bucket.get(&code("USD")), Some(dec!(70)));
        assert_eq!(bucket.get(&code("EUR")), Some(dec!(50)));
        assert_eq!(bucket.amount_or_zero(&code("CUP")), Decimal::ZERO);
        assert_eq!(bucket.len(), 2);
    }

    #[test]
    fn drops_zero_entries() {
        let mut bucket = CurrencyBucket::new();
        bucket.add(&amount(dec!(12.5), "USD")).unwrap();
        bucket.add(&amount(dec!(-12.50), "USD")).unwrap();
        bucket.add(&amount(dec!(0), "EUR")).unwrap();

        assert!(bucket.is_empty());
        assert_eq!(bucket, CurrencyBucket::new());
        assert_eq!(bucket.to_string(), "0");
    }

    #[test]
    fn merge_then_subtract_is_identity() {
        let base = bucket(&[(dec!(10), "USD"), (dec!(4), "CUP")]);
        let other = bucket(&[(dec!(3), "USD"), (dec!(9), "EUR")]);

        let mut merged = base.clone();
        merged.merge(&other).unwrap();
        assert_eq!(merged.get(&code("USD")), Some(dec!(13)));
        assert_eq!(merged.get(&code("EUR")), Some(dec!(9)));

        merged.subtract(&other).unwrap();
        assert_eq!(merged, base);
    }

    #[test]
    fn overflowing_add_fails_and_keeps_the_entry() {
        let mut bucket = bucket(&[(Decimal::MAX, "USD")]);
        let err = bucket.add(&amount(dec!(1), "USD")).unwrap_err();

        assert_eq!(err, EngineError::InvalidAmount("amount too large".to_string()));
        assert_eq!(bucket.get(&code("USD")), Some(Decimal::MAX));
    }

    #[test]
    fn overflowing_merge_is_all_or_nothing() {
        let mut base = bucket(&[(dec!(1), "EUR"), (Decimal::MAX, "USD")]);
        let before = base.clone();
        let other = bucket(&[(dec!(5), "EUR"), (dec!(1), "USD")]);

        assert!(base.merge(&other).is_err());
        assert_eq!(base, before);
    }

    #[test]
    fn equality_is_numeric() {
        assert_eq!(bucket(&[(dec!(100), "USD")]), bucket(&[(dec!(100.00), "USD")]));
    }

    #[test]
    fn first_follows_code_order() {
        let bucket = bucket(&[(dec!(1), "USD"), (dec!(2), "EUR")]);
        assert_eq!(bucket.first(), Some(amount(dec!(2), "EUR")));
        assert_eq!(CurrencyBucket::new().first(), None);
    }

    #[test]
    fn serializes_as_object() {
        let json = serde_json::to_value(bucket(&[(dec!(70), "USD")])).unwrap();
        assert_eq!(json, serde_json::json!({ "USD": "70" }));
    }

    #[test]
    fn deserializing_drops_zero_entries() {
        let bucket: CurrencyBucket =
            serde_json::from_str(r#"{ "USD": "0", "eur": "2.5", "CUP": 0 }"#).unwrap();

        assert_eq!(bucket.len(), 1);
        assert_eq!(bucket.get(&code("EUR")), Some(dec!(2.5)));
        assert_eq!(bucket.get(&code("USD")), None);
    }
}
