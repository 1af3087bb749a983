use serde::{Serialize, Serializer};
use tracing::debug;

use crate::{
    EngineError, OrderRecord, ResultEngine,
    report::{
        filter::SearchFilter,
        grouping::{GroupKey, GroupingStrategy},
        metrics::{MetricSet, ReportOptions},
        sort::{SortPolicy, sort_stable},
    },
};

const GRAND_TOTAL: &str = "total";

/// One partition of the input orders with its metrics.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportGroup<'a> {
    #[serde(flatten)]
    pub key: GroupKey,
    #[serde(serialize_with = "member_ids")]
    pub members: Vec<&'a OrderRecord>,
    pub metrics: MetricSet,
}

fn member_ids<S: Serializer>(members: &[&OrderRecord], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(members.iter().map(|order| order.id))
}

impl<'a> ReportGroup<'a> {
    fn new(
        key: GroupKey,
        members: Vec<&'a OrderRecord>,
        options: &ReportOptions,
    ) -> ResultEngine<Self> {
        let metrics = MetricSet::from_orders(members.iter().copied(), options)?;
        Ok(Self {
            key,
            members,
            metrics,
        })
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.key.label
    }

    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        self.key.sentinel
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report<'a> {
    pub groups: Vec<ReportGroup<'a>>,
    pub grand_total: ReportGroup<'a>,
}

impl Report<'_> {
    /// Checks that the groups add up to the grand total, metric by metric and
    /// currency by currency.
    pub fn reconcile(&self) -> ResultEngine<()> {
        let mut summed = MetricSet::default();
        for group in &self.groups {
            summed.merge(&group.metrics)?;
        }
        let expected = &self.grand_total.metrics;

        let mismatch = |metric: &str, got: String, want: String| {
            Err(EngineError::Reconciliation(format!(
                "{metric}: groups sum to {got}, grand total is {want}"
            )))
        };

        if summed.orders != expected.orders {
            return mismatch("orders", summed.orders.to_string(), expected.orders.to_string());
        }
        let buckets = [
            ("subtotal", &summed.subtotal, &expected.subtotal),
            ("total", &summed.total, &expected.total),
            ("totalPagado", &summed.paid, &expected.paid),
            ("descuento", &summed.discount, &expected.discount),
            ("propina", &summed.tip, &expected.tip),
        ];
        for (metric, got, want) in buckets {
            if got != want {
                return mismatch(metric, got.to_string(), want.to_string());
            }
        }
        if summed.paid_by_way != expected.paid_by_way {
            return mismatch(
                "totalPagadoPorVia",
                format!("{:?}", summed.paid_by_way),
                format!("{:?}", expected.paid_by_way),
            );
        }
        if summed.commission != expected.commission {
            return mismatch(
                "comisiones",
                summed.commission.to_string(),
                expected.commission.to_string(),
            );
        }
        if summed.cost != expected.cost {
            return mismatch("costos", summed.cost.to_string(), expected.cost.to_string());
        }
        Ok(())
    }
}

/// Report builder.
///
/// ```rust
/// use engine::{GroupingStrategy, ReportAggregator};
///
/// let report = ReportAggregator::new()
///     .grouping(GroupingStrategy::ByStatus)
///     .aggregate(&[])
///     .unwrap();
/// assert!(report.groups.is_empty());
/// assert_eq!(report.grand_total.metrics.orders, 0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ReportAggregator {
    grouping: GroupingStrategy,
    sort: Option<SortPolicy>,
    filter: SearchFilter,
    options: ReportOptions,
}

impl ReportAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn grouping(mut self, grouping: GroupingStrategy) -> Self {
        self.grouping = grouping;
        self
    }

    #[must_use]
    pub fn sort(mut self, sort: Option<SortPolicy>) -> Self {
        self.sort = sort;
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: SearchFilter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn options(mut self, options: ReportOptions) -> Self {
        self.options = options;
        self
    }

    /// Filters, sorts, partitions and reduces `orders`.
    ///
    /// Fails with `InvalidAmount` when a metric sum does not fit.
    pub fn aggregate<'a>(&self, orders: &'a [OrderRecord]) -> ResultEngine<Report<'a>> {
        let mut selected = self.filter.apply(orders);
        if let Some(sort) = &self.sort {
            sort.sort_orders(&mut selected, &self.options);
        }

        let mut groups = self
            .grouping
            .partition(&selected)
            .into_iter()
            .map(|(key, members)| ReportGroup::new(key, members, &self.options))
            .collect::<ResultEngine<Vec<_>>>()?;

        if let Some(sort) = &self.sort {
            sort_stable(&mut groups, sort.direction(), |group| {
                sort.group_value(&group.members, &group.metrics)
            });
            groups.sort_by_key(ReportGroup::is_sentinel);
        }

        let grand_total = ReportGroup::new(
            GroupKey {
                key: GRAND_TOTAL.to_string(),
                label: "Total".to_string(),
                sentinel: false,
            },
            selected,
            &self.options,
        )?;

        debug!(
            grouping = %self.grouping,
            groups = groups.len(),
            orders = grand_total.members.len(),
            "report aggregated"
        );
        Ok(Report {
            groups,
            grand_total,
        })
    }
}

/// One-shot aggregation with default options.
pub fn aggregate<'a>(
    orders: &'a [OrderRecord],
    grouping: Option<GroupingStrategy>,
    sort: Option<SortPolicy>,
) -> ResultEngine<Report<'a>> {
    ReportAggregator::new()
        .grouping(grouping.unwrap_or_default())
        .sort(sort)
        .aggregate(orders)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::{
        CurrencyAmount, CurrencyCode,
        report::{
            grouping::{NO_COUPON, NO_NAME},
            orders::{Client, Coupon, OrderStatus},
        },
    };

    fn usd(value: Decimal) -> CurrencyAmount {
        CurrencyAmount::new(value, CurrencyCode::new("USD").unwrap())
    }

    fn order(id: u64, status: OrderStatus, total: Decimal) -> OrderRecord {
        let mut order = OrderRecord::new(id, status, Utc.timestamp_opt(id as i64, 0).unwrap());
        order.prices = vec![usd(total)];
        order.total_to_pay = vec![usd(total)];
        order
    }

    fn named(mut order: OrderRecord, name: Option<&str>) -> OrderRecord {
        order.client = name.map(|name| Client {
            id: None,
            first_name: Some(name.to_string()),
            last_name: None,
        });
        order
    }

    fn usd_code() -> CurrencyCode {
        CurrencyCode::new("USD").unwrap()
    }

    #[test]
    fn groups_by_status_with_grand_total() {
        let orders = vec![
            order(1, OrderStatus::Billed, dec!(100)),
            order(2, OrderStatus::Cancelled, dec!(50)),
        ];
        let report = aggregate(&orders, Some(GroupingStrategy::ByStatus), None).unwrap();

        assert_eq!(report.groups.len(), 2);
        assert_eq!(report.groups[0].key.key, "BILLED");
        assert_eq!(report.groups[0].metrics.total.get(&usd_code()), Some(dec!(100)));
        assert_eq!(report.groups[0].metrics.subtotal.get(&usd_code()), Some(dec!(100)));
        assert_eq!(report.groups[1].key.key, "CANCELLED");
        assert_eq!(report.groups[1].metrics.total.get(&usd_code()), Some(dec!(50)));
        assert_eq!(report.grand_total.metrics.total.get(&usd_code()), Some(dec!(150)));
        report.reconcile().unwrap();
    }

    #[test]
    fn no_grouping_yields_single_group() {
        let orders = vec![
            order(1, OrderStatus::Billed, dec!(1)),
            order(2, OrderStatus::Closed, dec!(2)),
        ];
        let report = aggregate(&orders, None, None).unwrap();
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].members.len(), 2);
        assert_eq!(report.groups[0].metrics, report.grand_total.metrics);
    }

    #[test]
    fn empty_input_is_not_an_error() {
        let report = aggregate(&[], Some(GroupingStrategy::ByClient), None).unwrap();
        assert!(report.groups.is_empty());
        assert!(report.grand_total.metrics.total.is_empty());
        assert_eq!(report.grand_total.metrics.commission, Decimal::ZERO);
        report.reconcile().unwrap();
    }

    #[test]
    fn grouped_totals_reconcile_for_every_dimension() {
        let currencies = ["USD", "EUR", "CUP"];
        let orders = (0..30u64)
            .map(|id| {
                let code = CurrencyCode::new(currencies[(id % 3) as usize]).unwrap();
                let mut order = named(
                    order(id, OrderStatus::Billed, Decimal::from(id) + dec!(0.25)),
                    (id % 4 != 0).then_some(["Ana", "Luis", "Eva"][(id % 3) as usize]),
                );
                order.total_to_pay = vec![CurrencyAmount::new(Decimal::from(id * 3), code.clone())];
                order.tip_price = (id % 5 == 0).then(|| CurrencyAmount::new(dec!(1.5), code));
                order.commission = (id % 2 == 0).then_some(dec!(0.1));
                order.discount = Some(dec!(10));
                if id % 3 == 0 {
                    order.coupons = vec![Coupon {
                        code: "SPRING".to_string(),
                    }];
                }
                if id % 7 == 0 {
                    order.status = OrderStatus::Refunded;
                }
                order
            })
            .collect::<Vec<_>>();

        for grouping in [
            GroupingStrategy::None,
            GroupingStrategy::ByStatus,
            GroupingStrategy::ByClient,
            GroupingStrategy::ByCoupon,
        ] {
            let sort = Some("total-desc".parse().unwrap());
            let report = aggregate(&orders, Some(grouping), sort).unwrap();
            report.reconcile().unwrap();

            let mut ids = report
                .groups
                .iter()
                .flat_map(|group| group.members.iter().map(|o| o.id))
                .collect::<Vec<_>>();
            ids.sort_unstable();
            assert_eq!(ids, (0..30).collect::<Vec<_>>());
        }
    }

    #[test]
    fn tampered_group_fails_reconciliation() {
        let orders = vec![
            order(1, OrderStatus::Billed, dec!(10)),
            order(2, OrderStatus::Closed, dec!(5)),
        ];
        let mut report = aggregate(&orders, Some(GroupingStrategy::ByStatus), None).unwrap();
        report.groups[0].metrics.total.add(&usd(dec!(1))).unwrap();

        let err = report.reconcile().unwrap_err();
        assert!(matches!(err, EngineError::Reconciliation(_)));
    }

    #[test]
    fn sentinel_group_stays_last_under_sort() {
        let orders = vec![
            named(order(1, OrderStatus::Billed, dec!(500)), None),
            named(order(2, OrderStatus::Billed, dec!(10)), Some("Ana")),
            named(order(3, OrderStatus::Billed, dec!(20)), Some("Luis")),
        ];
        for policy in ["total-desc", "total-asc", "created-asc"] {
            let report = aggregate(
                &orders,
                Some(GroupingStrategy::ByClient),
                Some(policy.parse().unwrap()),
            )
            .unwrap();
            assert_eq!(report.groups.last().unwrap().key.key, NO_NAME, "{policy}");
        }

        let report = aggregate(&orders, Some(GroupingStrategy::ByCoupon), None).unwrap();
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].key.key, NO_COUPON);
    }

    #[test]
    fn groups_sort_by_metric() {
        let orders = vec![
            named(order(1, OrderStatus::Billed, dec!(10)), Some("Ana")),
            named(order(2, OrderStatus::Billed, dec!(30)), Some("Luis")),
            named(order(3, OrderStatus::Billed, dec!(15)), Some("Ana")),
        ];
        let report = aggregate(
            &orders,
            Some(GroupingStrategy::ByClient),
            Some("total-desc".parse().unwrap()),
        )
        .unwrap();
        let labels = report.groups.iter().map(ReportGroup::label).collect::<Vec<_>>();
        assert_eq!(labels, vec!["Luis", "Ana"]);
        let members = report.groups[1].members.iter().map(|o| o.id).collect::<Vec<_>>();
        assert_eq!(members, vec![3, 1]);
    }

    #[test]
    fn filter_applies_before_grouping() {
        let orders = vec![
            named(order(1, OrderStatus::Billed, dec!(10)), Some("Ana")),
            named(order(2, OrderStatus::Billed, dec!(30)), Some("Luis")),
        ];
        let report = ReportAggregator::new()
            .grouping(GroupingStrategy::ByClient)
            .filter(SearchFilter::parse("luis"))
            .aggregate(&orders)
            .unwrap();
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.grand_total.metrics.total.get(&usd_code()), Some(dec!(30)));
    }

    #[test]
    fn oversized_totals_fail_the_report() {
        let orders = vec![
            order(1, OrderStatus::Billed, Decimal::MAX),
            order(2, OrderStatus::Billed, Decimal::MAX),
        ];
        for grouping in [GroupingStrategy::None, GroupingStrategy::ByStatus] {
            let err = aggregate(&orders, Some(grouping), None).unwrap_err();
            assert_eq!(err, EngineError::amount_too_large());
        }

        // Each order fits on its own.
        let report = aggregate(&orders[..1], None, None).unwrap();
        assert_eq!(report.grand_total.metrics.total.get(&usd_code()), Some(Decimal::MAX));
    }

    #[test]
    fn serializes_member_ids_and_metric_names() {
        let orders = vec![order(4, OrderStatus::Billed, dec!(10))];
        let report = aggregate(&orders, Some(GroupingStrategy::ByStatus), None).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["groups"][0]["key"], "BILLED");
        assert_eq!(json["groups"][0]["members"], serde_json::json!([4]));
        assert!(json["grandTotal"]["metrics"].get("totalPagado").is_some());
    }
}
