//! Order records as they come from the order source.
//!
//! These are read-only inputs for the aggregator. The wire shape is the
//! camelCase JSON of the orders API: `prices` entries use
//! `{ price, codeCurrency }`, every other money list uses
//! `{ amount, codeCurrency }`.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{CurrencyAmount, CurrencyCode, util::collapse_whitespace};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Created,
    PaymentPending,
    InProcess,
    Billed,
    Cancelled,
    Refunded,
    Closed,
    WithErrors,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::PaymentPending => "PAYMENT_PENDING",
            Self::InProcess => "IN_PROCESS",
            Self::Billed => "BILLED",
            Self::Cancelled => "CANCELLED",
            Self::Refunded => "REFUNDED",
            Self::Closed => "CLOSED",
            Self::WithErrors => "WITH_ERRORS",
        }
    }

    /// Human readable label used as report group title.
    pub fn label(self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::PaymentPending => "Payment pending",
            Self::InProcess => "In process",
            Self::Billed => "Billed",
            Self::Cancelled => "Cancelled",
            Self::Refunded => "Refunded",
            Self::Closed => "Closed",
            Self::WithErrors => "With errors",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl Client {
    /// `"first last"` with whitespace collapsed, `None` when both are blank.
    #[must_use]
    pub fn full_name(&self) -> Option<String> {
        let joined = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        );
        let name = collapse_whitespace(&joined);
        (!name.is_empty()).then_some(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub code: String,
}

/// How a payment was collected.
///
/// Unknown wire values are kept as [`PaymentWay::Other`] instead of failing
/// the whole order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PaymentWay {
    Cash,
    Transfer,
    Card,
    CreditPoints,
    Other,
}

impl PaymentWay {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "CASH",
            Self::Transfer => "TRANSFER",
            Self::Card => "CARD",
            Self::CreditPoints => "CREDIT_POINTS",
            Self::Other => "OTHER",
        }
    }
}

impl From<&str> for PaymentWay {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "CASH" => Self::Cash,
            "TRANSFER" => Self::Transfer,
            "CARD" => Self::Card,
            "CREDIT_POINTS" => Self::CreditPoints,
            _ => Self::Other,
        }
    }
}

impl Serialize for PaymentWay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PaymentWay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from(raw.as_str()))
    }
}

/// One entry of `currenciesPayment`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentAmount {
    pub amount: Decimal,
    pub code_currency: CurrencyCode,
    #[serde(default = "default_payment_way")]
    pub payment_way: PaymentWay,
}

fn default_payment_way() -> PaymentWay {
    PaymentWay::Cash
}

impl PaymentAmount {
    #[must_use]
    pub fn currency_amount(&self) -> CurrencyAmount {
        CurrencyAmount::new(self.amount, self.code_currency.clone())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    #[serde(default)]
    pub client: Option<Client>,
    #[serde(default)]
    pub coupons: Vec<Coupon>,
    #[serde(default)]
    pub prices: Vec<CurrencyAmount>,
    #[serde(default)]
    pub total_to_pay: Vec<CurrencyAmount>,
    #[serde(default)]
    pub currencies_payment: Vec<PaymentAmount>,
    /// Discount percentage applied to `prices` when no coupon price exists.
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub discount: Option<Decimal>,
    #[serde(default)]
    pub coupon_discount_price: Option<CurrencyAmount>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub commission: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub total_cost: Option<Decimal>,
    #[serde(default)]
    pub tip_price: Option<CurrencyAmount>,
}

impl OrderRecord {
    /// Minimal order, mostly useful to build fixtures.
    #[must_use]
    pub fn new(id: u64, status: OrderStatus, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at,
            paid_at: None,
            status,
            client: None,
            coupons: Vec::new(),
            prices: Vec::new(),
            total_to_pay: Vec::new(),
            currencies_payment: Vec::new(),
            discount: None,
            coupon_discount_price: None,
            commission: None,
            total_cost: None,
            tip_price: None,
        }
    }

    #[must_use]
    pub fn client_name(&self) -> Option<String> {
        self.client.as_ref().and_then(Client::full_name)
    }

    /// Non-blank coupon codes, in order.
    pub fn coupon_codes(&self) -> impl Iterator<Item = &str> {
        self.coupons
            .iter()
            .map(|coupon| coupon.code.trim())
            .filter(|code| !code.is_empty())
    }
}

/// Accepts numbers and numeric strings; anything else (null, text, objects)
/// becomes `None` so reductions skip it instead of failing.
fn lenient_decimal<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Decimal>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(number)) => parse_decimal(&number.to_string()),
        Some(serde_json::Value::String(text)) => parse_decimal(&text.trim().replace(',', ".")),
        _ => None,
    })
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn deserializes_order_source_shape() {
        let json = r#"{
            "id": 7,
            "createdAt": "2024-03-01T12:00:00Z",
            "paidAt": null,
            "status": "BILLED",
            "client": { "firstName": "  Ana ", "lastName": "Pérez" },
            "coupons": [{ "code": "SUMMER" }],
            "prices": [{ "price": 10, "codeCurrency": "USD" }],
            "totalToPay": [{ "amount": 9.5, "codeCurrency": "USD" }],
            "currenciesPayment": [
                { "amount": 9.5, "codeCurrency": "USD", "paymentWay": "CASH" },
                { "amount": 1, "codeCurrency": "USD", "paymentWay": "CRYPTO" }
            ],
            "discount": "5",
            "commission": "n/a",
            "totalCost": 4.25
        }"#;
        let order: OrderRecord = serde_json::from_str(json).unwrap();

        assert_eq!(order.status, OrderStatus::Billed);
        assert_eq!(order.client_name().as_deref(), Some("Ana Pérez"));
        assert_eq!(order.coupon_codes().collect::<Vec<_>>(), vec!["SUMMER"]);
        assert_eq!(order.prices[0].amount, dec!(10));
        assert_eq!(order.currencies_payment[1].payment_way, PaymentWay::Other);
        assert_eq!(order.discount, Some(dec!(5)));
        assert_eq!(order.commission, None);
        assert_eq!(order.total_cost, Some(dec!(4.25)));
        assert_eq!(order.tip_price, None);
    }

    #[test]
    fn blank_client_has_no_name() {
        let client = Client {
            id: Some(1),
            first_name: Some("  ".to_string()),
            last_name: None,
        };
        assert_eq!(client.full_name(), None);
    }
}
