//! Command structs for engine operations.
//!
//! These types group parameters for write operations
//! (record/transfer/exchange/new account), keeping call sites readable and
//! avoiding long argument lists.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{CurrencyAmount, CurrencyCode, OperationKind};

/// Common metadata for operation creation.
#[derive(Clone, Debug)]
pub struct OperationMeta {
    pub tag: Option<String>,
    pub registered_at: DateTime<Utc>,
    pub made_by: String,
}

impl OperationMeta {
    #[must_use]
    pub fn new(made_by: impl Into<String>, registered_at: DateTime<Utc>) -> Self {
        Self {
            tag: None,
            registered_at,
            made_by: made_by.into(),
        }
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

/// Register a new account.
#[derive(Clone, Debug)]
pub struct NewAccountCmd {
    pub name: String,
    pub owner: String,
    pub is_private: bool,
    pub allowed_currencies: Option<BTreeSet<CurrencyCode>>,
}

impl NewAccountCmd {
    #[must_use]
    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            is_private: false,
            allowed_currencies: None,
        }
    }

    #[must_use]
    pub fn private(mut self) -> Self {
        self.is_private = true;
        self
    }

    #[must_use]
    pub fn allowed_currencies(
        mut self,
        currencies: impl IntoIterator<Item = CurrencyCode>,
    ) -> Self {
        self.allowed_currencies = Some(currencies.into_iter().collect());
        self
    }
}

/// Record a single credit, debit or balance seed.
#[derive(Clone, Debug)]
pub struct RecordOperationCmd {
    pub account_id: Uuid,
    pub kind: OperationKind,
    pub amount: CurrencyAmount,
    pub meta: OperationMeta,
}

impl RecordOperationCmd {
    #[must_use]
    pub fn new(
        account_id: Uuid,
        kind: OperationKind,
        amount: CurrencyAmount,
        meta: OperationMeta,
    ) -> Self {
        Self {
            account_id,
            kind,
            amount,
            meta,
        }
    }
}

/// Move money between two accounts.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount: CurrencyAmount,
    pub meta: OperationMeta,
}

impl TransferCmd {
    #[must_use]
    pub fn new(
        from_account_id: Uuid,
        to_account_id: Uuid,
        amount: CurrencyAmount,
        meta: OperationMeta,
    ) -> Self {
        Self {
            from_account_id,
            to_account_id,
            amount,
            meta,
        }
    }
}

/// Swap one currency for another inside the same account.
///
/// The rate is implied by `out_amount`/`in_amount` and is not checked.
#[derive(Clone, Debug)]
pub struct ExchangeCmd {
    pub account_id: Uuid,
    pub out_amount: CurrencyAmount,
    pub in_amount: CurrencyAmount,
    pub meta: OperationMeta,
}

impl ExchangeCmd {
    #[must_use]
    pub fn new(
        account_id: Uuid,
        out_amount: CurrencyAmount,
        in_amount: CurrencyAmount,
        meta: OperationMeta,
    ) -> Self {
        Self {
            account_id,
            out_amount,
            in_amount,
            meta,
        }
    }
}
