//! Per-group metric reduction.

use std::{collections::BTreeMap, fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    CurrencyBucket, CurrencyCode, EngineError, OrderRecord, ResultEngine,
    report::orders::PaymentWay,
};

/// Currency used for the tip metric when none is configured.
pub const DEFAULT_TIP_CURRENCY: &str = "CUP";

/// Knobs of the metric reduction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportOptions {
    /// Every tip is booked under this code, whatever its own currency.
    pub tip_currency: CurrencyCode,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            tip_currency: CurrencyCode::from_static(DEFAULT_TIP_CURRENCY),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Subtotal,
    Total,
    Paid,
    Discount,
    Tip,
    Commission,
    Cost,
}

impl Metric {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Subtotal => "subtotal",
            Self::Total => "total",
            Self::Paid => "paid",
            Self::Discount => "discount",
            Self::Tip => "tip",
            Self::Commission => "commission",
            Self::Cost => "cost",
        }
    }

    /// Commission and cost are plain numbers, not per-currency buckets.
    #[must_use]
    pub fn is_scalar(self) -> bool {
        matches!(self, Self::Commission | Self::Cost)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "subtotal" => Ok(Self::Subtotal),
            "total" => Ok(Self::Total),
            "paid" | "totalPagado" => Ok(Self::Paid),
            "discount" | "descuento" => Ok(Self::Discount),
            "tip" | "propina" => Ok(Self::Tip),
            "commission" | "comisiones" => Ok(Self::Commission),
            "cost" | "costos" => Ok(Self::Cost),
            other => Err(EngineError::InvalidOperation(format!("unknown metric: {other}"))),
        }
    }
}

/// Every metric of one group of orders.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MetricSet {
    pub orders: usize,
    pub subtotal: CurrencyBucket,
    pub total: CurrencyBucket,
    #[serde(rename = "totalPagado")]
    pub paid: CurrencyBucket,
    #[serde(rename = "totalPagadoPorVia")]
    pub paid_by_way: BTreeMap<PaymentWay, CurrencyBucket>,
    #[serde(rename = "descuento")]
    pub discount: CurrencyBucket,
    #[serde(rename = "propina")]
    pub tip: CurrencyBucket,
    #[serde(rename = "comisiones")]
    pub commission: Decimal,
    #[serde(rename = "costos")]
    pub cost: Decimal,
}

impl MetricSet {
    /// Metrics of a single order.
    ///
    /// Fails with `InvalidAmount` when a sum or a percentage does not fit.
    pub fn of_order(order: &OrderRecord, options: &ReportOptions) -> ResultEngine<Self> {
        let mut metrics = Self {
            orders: 1,
            subtotal: CurrencyBucket::from_amounts(&order.prices)?,
            total: CurrencyBucket::from_amounts(&order.total_to_pay)?,
            ..Self::default()
        };

        for payment in &order.currencies_payment {
            let amount = payment.currency_amount();
            metrics.paid.add(&amount)?;
            metrics
                .paid_by_way
                .entry(payment.payment_way)
                .or_default()
                .add(&amount)?;
        }
        metrics.paid_by_way.retain(|_, bucket| !bucket.is_empty());

        match (&order.coupon_discount_price, order.discount) {
            (Some(coupon_price), _) => metrics.discount.add(coupon_price)?,
            (None, Some(percent)) if !percent.is_zero() => {
                for price in &order.prices {
                    let discounted = price
                        .amount
                        .checked_mul(percent)
                        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
                        .ok_or_else(EngineError::amount_too_large)?;
                    metrics.discount.add_amount(&price.currency, discounted)?;
                }
            }
            _ => {}
        }

        if let Some(tip) = &order.tip_price {
            metrics.tip.add_amount(&options.tip_currency, tip.amount)?;
        }

        metrics.commission = order.commission.unwrap_or_default();
        metrics.cost = order.total_cost.unwrap_or_default();
        Ok(metrics)
    }

    /// Reduces a collection of orders.
    pub fn from_orders<'a>(
        orders: impl IntoIterator<Item = &'a OrderRecord>,
        options: &ReportOptions,
    ) -> ResultEngine<Self> {
        let mut metrics = Self::default();
        for order in orders {
            metrics.merge(&Self::of_order(order, options)?)?;
        }
        Ok(metrics)
    }

    /// Adds `other` into `self`, all or nothing.
    pub fn merge(&mut self, other: &MetricSet) -> ResultEngine<()> {
        let mut next = self.clone();
        next.orders += other.orders;
        next.subtotal.merge(&other.subtotal)?;
        next.total.merge(&other.total)?;
        next.paid.merge(&other.paid)?;
        for (way, bucket) in &other.paid_by_way {
            next.paid_by_way.entry(*way).or_default().merge(bucket)?;
        }
        next.paid_by_way.retain(|_, bucket| !bucket.is_empty());
        next.discount.merge(&other.discount)?;
        next.tip.merge(&other.tip)?;
        next.commission = next
            .commission
            .checked_add(other.commission)
            .ok_or_else(EngineError::amount_too_large)?;
        next.cost = next.cost.checked_add(other.cost).ok_or_else(EngineError::amount_too_large)?;
        *self = next;
        Ok(())
    }

    /// The bucket of a currency metric, `None` for scalar metrics.
    #[must_use]
    pub fn bucket(&self, metric: Metric) -> Option<&CurrencyBucket> {
        match metric {
            Metric::Subtotal => Some(&self.subtotal),
            Metric::Total => Some(&self.total),
            Metric::Paid => Some(&self.paid),
            Metric::Discount => Some(&self.discount),
            Metric::Tip => Some(&self.tip),
            Metric::Commission | Metric::Cost => None,
        }
    }

    /// Comparable value of a metric.
    ///
    /// Scalar metrics always have a value. Bucket metrics use `currency` when
    /// given, else the first entry of the bucket; `None` when there is nothing
    /// to compare.
    #[must_use]
    pub fn value(&self, metric: Metric, currency: Option<&CurrencyCode>) -> Option<Decimal> {
        match metric {
            Metric::Commission => Some(self.commission),
            Metric::Cost => Some(self.cost),
            _ => {
                let bucket = self.bucket(metric)?;
                match currency {
                    Some(currency) => bucket.get(currency),
                    None => bucket.first().map(|amount| amount.amount),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    use super::*;
    use crate::{
        CurrencyAmount,
        report::orders::{OrderStatus, PaymentAmount},
    };

    fn code(raw: &str) -> CurrencyCode {
        CurrencyCode::new(raw).unwrap()
    }

    fn amount(value: Decimal, currency: &str) -> CurrencyAmount {
        CurrencyAmount::new(value, code(currency))
    }

    fn order() -> OrderRecord {
        OrderRecord::new(1, OrderStatus::Billed, Utc.timestamp_opt(0, 0).unwrap())
    }

    #[test]
    fn sums_money_lists_per_currency() {
        let mut order = order();
        order.prices = vec![amount(dec!(10), "USD"), amount(dec!(200), "CUP")];
        order.total_to_pay = vec![amount(dec!(9), "USD"), amount(dec!(200), "CUP")];
        order.currencies_payment = vec![
            PaymentAmount {
                amount: dec!(9),
                code_currency: code("USD"),
                payment_way: PaymentWay::Card,
            },
            PaymentAmount {
                amount: dec!(200),
                code_currency: code("CUP"),
                payment_way: PaymentWay::Cash,
            },
        ];

        let metrics = MetricSet::of_order(&order, &ReportOptions::default()).unwrap();
        assert_eq!(metrics.subtotal.get(&code("USD")), Some(dec!(10)));
        assert_eq!(metrics.total.get(&code("CUP")), Some(dec!(200)));
        assert_eq!(metrics.paid.len(), 2);
        assert_eq!(
            metrics.paid_by_way[&PaymentWay::Card].get(&code("USD")),
            Some(dec!(9))
        );
    }

    #[test]
    fn coupon_price_wins_over_percentage() {
        let mut order = order();
        order.prices = vec![amount(dec!(100), "USD")];
        order.discount = Some(dec!(10));
        order.coupon_discount_price = Some(amount(dec!(3), "USD"));

        let metrics = MetricSet::of_order(&order, &ReportOptions::default()).unwrap();
        assert_eq!(metrics.discount.get(&code("USD")), Some(dec!(3)));
    }

    #[test]
    fn percentage_discount_applies_per_price() {
        let mut order = order();
        order.prices = vec![amount(dec!(100), "USD"), amount(dec!(50), "EUR")];
        order.discount = Some(dec!(10));

        let metrics = MetricSet::of_order(&order, &ReportOptions::default()).unwrap();
        assert_eq!(metrics.discount.get(&code("USD")), Some(dec!(10)));
        assert_eq!(metrics.discount.get(&code("EUR")), Some(dec!(5)));
    }

    #[test]
    fn tips_are_booked_under_the_tip_currency() {
        let mut first = order();
        first.tip_price = Some(amount(dec!(2), "USD"));
        let mut second = order();
        second.tip_price = Some(amount(dec!(50), "CUP"));

        let metrics = MetricSet::from_orders([&first, &second], &ReportOptions::default()).unwrap();
        assert_eq!(metrics.tip.len(), 1);
        assert_eq!(metrics.tip.get(&code("CUP")), Some(dec!(52)));
    }

    #[test]
    fn malformed_scalars_are_skipped() {
        let mut first = order();
        first.commission = Some(dec!(1.5));
        first.total_cost = None;
        let mut second = order();
        second.commission = None;
        second.total_cost = Some(dec!(4));

        let metrics = MetricSet::from_orders([&first, &second], &ReportOptions::default()).unwrap();
        assert_eq!(metrics.orders, 2);
        assert_eq!(metrics.commission, dec!(1.5));
        assert_eq!(metrics.cost, dec!(4));
    }

    #[test]
    fn value_prefers_requested_currency() {
        let mut order = order();
        order.total_to_pay = vec![amount(dec!(9), "USD"), amount(dec!(300), "CUP")];
        let metrics = MetricSet::of_order(&order, &ReportOptions::default()).unwrap();

        assert_eq!(metrics.value(Metric::Total, None), Some(dec!(300)));
        assert_eq!(metrics.value(Metric::Total, Some(&code("USD"))), Some(dec!(9)));
        assert_eq!(metrics.value(Metric::Total, Some(&code("EUR"))), None);
        assert_eq!(metrics.value(Metric::Tip, None), None);
        assert_eq!(metrics.value(Metric::Cost, None), Some(Decimal::ZERO));
    }

    #[test]
    fn oversized_amounts_fail_instead_of_wrapping() {
        let options = ReportOptions::default();

        let mut discounted = order();
        discounted.prices = vec![amount(Decimal::MAX, "USD")];
        discounted.discount = Some(dec!(50));
        assert_eq!(
            MetricSet::of_order(&discounted, &options),
            Err(EngineError::amount_too_large())
        );

        let mut big = order();
        big.prices = vec![amount(Decimal::MAX, "USD")];
        assert!(MetricSet::from_orders([&big, &big], &options).is_err());

        let mut costly = order();
        costly.total_cost = Some(Decimal::MAX);
        let mut metrics = MetricSet::of_order(&costly, &options).unwrap();
        let before = metrics.clone();
        assert!(metrics.merge(&before).is_err());
        assert_eq!(metrics, before);
    }

    #[test]
    fn metric_names_accept_report_aliases() {
        assert_eq!("totalPagado".parse::<Metric>().unwrap(), Metric::Paid);
        assert_eq!("propina".parse::<Metric>().unwrap(), Metric::Tip);
        assert!("revenue".parse::<Metric>().is_err());
    }
}
