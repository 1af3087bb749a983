//! Multi-currency ledger and sales report engine.
//!
//! Money is always a [`CurrencyAmount`]; amounts in different currencies are
//! only ever combined through a [`CurrencyBucket`]. Accounts keep their
//! balances through an [`AccountLedger`], whose [`OperationJournal`] and
//! balances change together. The [`report`] module partitions order records
//! and reduces them into reconciled per-currency metrics.
//!
//! [`Engine`] persists ledgers with sea-orm, writing operation and balance
//! rows in one database transaction.

pub use accounts::Account;
pub use bucket::CurrencyBucket;
pub use commands::{ExchangeCmd, NewAccountCmd, OperationMeta, RecordOperationCmd, TransferCmd};
pub use currency::CurrencyCode;
pub use error::EngineError;
pub use journal::OperationJournal;
pub use ledger::{AccountLedger, StatementRow, cancel_transfer, transfer};
pub use money::CurrencyAmount;
pub use operations::{Operation, OperationKind};
pub use ops::{Engine, EngineBuilder};
pub use report::{
    GroupingStrategy, Metric, MetricSet, OrderRecord, Report, ReportAggregator, ReportGroup,
    ReportOptions, SearchFilter, SortPolicy, aggregate,
};

mod account_balances;
mod accounts;
mod bucket;
mod commands;
mod currency;
mod error;
mod journal;
mod ledger;
mod money;
mod operations;
mod ops;
pub mod report;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
