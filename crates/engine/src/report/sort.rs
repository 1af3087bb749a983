//! Ordering of report rows and groups.

use std::{cmp::Ordering, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::{
    CurrencyCode, EngineError, OrderRecord,
    report::metrics::{Metric, MetricSet, ReportOptions},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DateField {
    CreatedAt,
    PaidAt,
}

impl DateField {
    fn of(self, order: &OrderRecord) -> Option<DateTime<Utc>> {
        match self {
            Self::CreatedAt => Some(order.created_at),
            Self::PaidAt => order.paid_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SortPolicy {
    ByDate {
        field: DateField,
        direction: SortDirection,
    },
    ByAmount {
        metric: Metric,
        /// Compared currency; the first entry of the bucket when `None`.
        currency: Option<CurrencyCode>,
        direction: SortDirection,
    },
}

/// Comparable value behind a sort policy. One policy only ever produces one
/// variant.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue {
    Date(DateTime<Utc>),
    Amount(Decimal),
}

/// A value extended with both infinities, so absent values have a fixed
/// place in the ordering.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Extended<V> {
    NegInf,
    Finite(V),
    PosInf,
}

impl<V> Extended<V> {
    /// Absent values become the extreme that sorts last in `direction`.
    fn of(value: Option<V>, direction: SortDirection) -> Self {
        match (value, direction) {
            (Some(value), _) => Self::Finite(value),
            (None, SortDirection::Asc) => Self::PosInf,
            (None, SortDirection::Desc) => Self::NegInf,
        }
    }
}

/// Stable sort of `items` by `value`, missing values last.
pub(crate) fn sort_stable<T, V: Ord>(
    items: &mut Vec<T>,
    direction: SortDirection,
    value: impl Fn(&T) -> Option<V>,
) {
    let mut decorated = items
        .drain(..)
        .map(|item| (Extended::of(value(&item), direction), item))
        .collect::<Vec<_>>();
    decorated.sort_by(|(a, _), (b, _)| direction.apply(a.cmp(b)));
    items.extend(decorated.into_iter().map(|(_, item)| item));
}

impl SortPolicy {
    #[must_use]
    pub fn direction(&self) -> SortDirection {
        match self {
            Self::ByDate { direction, .. } | Self::ByAmount { direction, .. } => *direction,
        }
    }

    /// Value of a single order row.
    #[must_use]
    pub fn order_value(&self, order: &OrderRecord, options: &ReportOptions) -> Option<SortValue> {
        match self {
            Self::ByDate { field, .. } => field.of(order).map(SortValue::Date),
            Self::ByAmount {
                metric, currency, ..
            } => MetricSet::of_order(order, options)
                .ok()?
                .value(*metric, currency.as_ref())
                .map(SortValue::Amount),
        }
    }

    /// Value of a whole group: its metric for amount sorts, its leading row
    /// for date sorts.
    #[must_use]
    pub fn group_value(&self, members: &[&OrderRecord], metrics: &MetricSet) -> Option<SortValue> {
        match self {
            Self::ByDate { field, .. } => members
                .first()
                .and_then(|order| field.of(order))
                .map(SortValue::Date),
            Self::ByAmount {
                metric, currency, ..
            } => metrics
                .value(*metric, currency.as_ref())
                .map(SortValue::Amount),
        }
    }

    pub fn sort_orders(&self, orders: &mut Vec<&OrderRecord>, options: &ReportOptions) {
        sort_stable(orders, self.direction(), |order| {
            self.order_value(order, options)
        });
    }
}

impl fmt::Display for SortPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByDate { field, direction } => {
                let field = match field {
                    DateField::CreatedAt => "created",
                    DateField::PaidAt => "paid",
                };
                write!(f, "{field}-{}", direction.as_str())
            }
            Self::ByAmount {
                metric,
                currency: Some(currency),
                direction,
            } => write!(f, "{metric}:{currency}-{}", direction.as_str()),
            Self::ByAmount {
                metric, direction, ..
            } => write!(f, "{metric}-{}", direction.as_str()),
        }
    }
}

/// Parses `created-asc`, `paid-desc`, `total-desc` or `total:USD-asc`.
impl FromStr for SortPolicy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidOperation(format!("invalid sort policy: {s}"));
        let (subject, direction) = s.trim().rsplit_once('-').ok_or_else(invalid)?;
        let direction = match direction.to_ascii_lowercase().as_str() {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            _ => return Err(invalid()),
        };

        match subject {
            "created" | "createdAt" => Ok(Self::ByDate {
                field: DateField::CreatedAt,
                direction,
            }),
            "paid" | "paidAt" => Ok(Self::ByDate {
                field: DateField::PaidAt,
                direction,
            }),
            _ => {
                let (metric, currency) = match subject.split_once(':') {
                    Some((metric, currency)) => (metric, Some(CurrencyCode::new(currency)?)),
                    None => (subject, None),
                };
                let metric: Metric = metric.parse()?;
                if metric.is_scalar() && currency.is_some() {
                    return Err(EngineError::InvalidOperation(format!(
                        "{metric} is not kept per currency"
                    )));
                }
                Ok(Self::ByAmount {
                    metric,
                    currency,
                    direction,
                })
            }
        }
    }
}
