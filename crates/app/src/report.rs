//! `tally report`: aggregates an order export into grouped metrics.

use std::{collections::BTreeSet, error::Error, path::Path};

use csv::Writer;
use engine::{
    CurrencyCode, GroupingStrategy, OrderRecord, Report, ReportAggregator, ReportGroup,
    ReportOptions, SearchFilter, SortPolicy,
};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    #[default]
    Json,
    Csv,
}

pub struct ReportRequest<'a> {
    pub orders: &'a Path,
    pub grouping: GroupingStrategy,
    pub sort: Option<SortPolicy>,
    pub search: Option<&'a str>,
    pub format: Format,
    pub tip_currency: Option<&'a str>,
}

/// Reads orders from a JSON file: either a bare array or a page object with
/// an `items` array.
pub fn load_orders(path: &Path) -> Result<Vec<OrderRecord>, Box<dyn Error + Send + Sync>> {
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Payload {
        List(Vec<OrderRecord>),
        Page { items: Vec<OrderRecord> },
    }

    let raw = std::fs::read_to_string(path)?;
    let orders = match serde_json::from_str::<Payload>(&raw)? {
        Payload::List(orders) | Payload::Page { items: orders } => orders,
    };
    tracing::debug!(path = %path.display(), orders = orders.len(), "orders loaded");
    Ok(orders)
}

pub fn run(request: ReportRequest<'_>) -> Result<String, Box<dyn Error + Send + Sync>> {
    let orders = load_orders(request.orders)?;

    let mut options = ReportOptions::default();
    if let Some(code) = request.tip_currency {
        options.tip_currency = CurrencyCode::new(code)?;
    }

    let report = ReportAggregator::new()
        .grouping(request.grouping)
        .sort(request.sort)
        .filter(request.search.map(SearchFilter::parse).unwrap_or_default())
        .options(options)
        .aggregate(&orders)?;

    if let Err(err) = report.reconcile() {
        tracing::error!("report does not reconcile: {err}");
        return Err(err.into());
    }

    match request.format {
        Format::Json => Ok(serde_json::to_string_pretty(&report)?),
        Format::Csv => render_csv(&report),
    }
}

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    group: &'a str,
    orders: usize,
    currency: Option<&'a str>,
    subtotal: Option<Decimal>,
    total: Option<Decimal>,
    paid: Option<Decimal>,
    discount: Option<Decimal>,
    tip: Option<Decimal>,
    commission: Decimal,
    cost: Decimal,
}

/// One row per group and currency; scalar metrics repeat on every row of the
/// group. Groups without money get a single row with an empty currency.
fn rows<'a>(group: &'a ReportGroup<'_>) -> Vec<ReportRow<'a>> {
    let metrics = &group.metrics;
    let currencies: BTreeSet<&CurrencyCode> = [
        &metrics.subtotal,
        &metrics.total,
        &metrics.paid,
        &metrics.discount,
        &metrics.tip,
    ]
    .into_iter()
    .flat_map(|bucket| bucket.currencies())
    .collect();

    let row = |currency: Option<&'a CurrencyCode>| ReportRow {
        group: group.label(),
        orders: metrics.orders,
        currency: currency.map(CurrencyCode::as_str),
        subtotal: currency.and_then(|c| metrics.subtotal.get(c)),
        total: currency.and_then(|c| metrics.total.get(c)),
        paid: currency.and_then(|c| metrics.paid.get(c)),
        discount: currency.and_then(|c| metrics.discount.get(c)),
        tip: currency.and_then(|c| metrics.tip.get(c)),
        commission: metrics.commission,
        cost: metrics.cost,
    };

    if currencies.is_empty() {
        return vec![row(None)];
    }
    currencies.into_iter().map(|c| row(Some(c))).collect()
}

fn render_csv(report: &Report<'_>) -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut writer = Writer::from_writer(vec![]);
    for group in report.groups.iter().chain(std::iter::once(&report.grand_total)) {
        for row in rows(group) {
            writer.serialize(row)?;
        }
    }
    let data = writer.into_inner().map_err(|err| err.into_error())?;
    Ok(String::from_utf8(data)?)
}
