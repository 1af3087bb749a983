//! Sales report aggregation.
//!
//! Orders are filtered, partitioned by a [`GroupingStrategy`], reduced into
//! per-currency [`MetricSet`]s and optionally ordered by a [`SortPolicy`].
//! The grand total is reduced over the same orders, so a [`Report`] always
//! reconciles with its groups.

pub use aggregate::{Report, ReportAggregator, ReportGroup, aggregate};
pub use filter::SearchFilter;
pub use grouping::{GroupKey, GroupingStrategy, NO_COUPON, NO_NAME};
pub use metrics::{DEFAULT_TIP_CURRENCY, Metric, MetricSet, ReportOptions};
pub use orders::{Client, Coupon, OrderRecord, OrderStatus, PaymentAmount, PaymentWay};
pub use sort::{DateField, SortDirection, SortPolicy, SortValue};

mod aggregate;
mod filter;
mod grouping;
mod metrics;
mod orders;
mod sort;
