//! Ledger operations.
//!
//! An [`Operation`] is a single signed money movement recorded against one
//! account. Transfers and currency exchanges are made of two operations (legs)
//! sharing the same `pair_id`.
//!
//! Amounts are stored as positive magnitudes; the sign comes from the
//! [`OperationKind`]:
//! - `credit`, `transfer_in`, `exchange_in` increase the balance
//! - `debit`, `transfer_out`, `exchange_out` decrease it
//! - `balance` (a balance seed) carries its own sign

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    CurrencyAmount, CurrencyCode, EngineError, OperationMeta, ResultEngine,
    util::{normalize_optional_text, parse_uuid},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Credit,
    Debit,
    TransferOut,
    TransferIn,
    ExchangeOut,
    ExchangeIn,
    #[serde(rename = "balance")]
    BalanceSeed,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
            Self::TransferOut => "transfer_out",
            Self::TransferIn => "transfer_in",
            Self::ExchangeOut => "exchange_out",
            Self::ExchangeIn => "exchange_in",
            Self::BalanceSeed => "balance",
        }
    }

    /// `+1`/`-1` for movements, `None` for balance seeds.
    #[must_use]
    pub fn sign(self) -> Option<Decimal> {
        match self {
            Self::Credit | Self::TransferIn | Self::ExchangeIn => Some(Decimal::ONE),
            Self::Debit | Self::TransferOut | Self::ExchangeOut => Some(Decimal::NEGATIVE_ONE),
            Self::BalanceSeed => None,
        }
    }

    #[must_use]
    pub fn is_transfer(self) -> bool {
        matches!(self, Self::TransferOut | Self::TransferIn)
    }

    #[must_use]
    pub fn is_exchange(self) -> bool {
        matches!(self, Self::ExchangeOut | Self::ExchangeIn)
    }

    /// Kinds that can be edited on their own without breaking a pair.
    #[must_use]
    pub fn is_standalone(self) -> bool {
        matches!(self, Self::Credit | Self::Debit | Self::BalanceSeed)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            "transfer_out" => Ok(Self::TransferOut),
            "transfer_in" => Ok(Self::TransferIn),
            "exchange_out" => Ok(Self::ExchangeOut),
            "exchange_in" => Ok(Self::ExchangeIn),
            "balance" => Ok(Self::BalanceSeed),
            other => Err(EngineError::InvalidOperation(format!(
                "invalid operation kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub id: Uuid,
    pub account_id: Uuid,
    #[serde(rename = "operation")]
    pub kind: OperationKind,
    pub amount: CurrencyAmount,
    #[serde(default)]
    pub tag: Option<String>,
    pub registered_at: DateTime<Utc>,
    pub made_by: String,
    #[serde(default)]
    pub pair_id: Option<Uuid>,
}

impl Operation {
    pub fn new(
        account_id: Uuid,
        kind: OperationKind,
        amount: CurrencyAmount,
        meta: OperationMeta,
    ) -> ResultEngine<Self> {
        validate_amount(kind, &amount)?;
        Ok(Self {
            id: Uuid::new_v4(),
            account_id,
            kind,
            amount,
            tag: normalize_optional_text(meta.tag.as_deref()),
            registered_at: meta.registered_at,
            made_by: meta.made_by,
            pair_id: None,
        })
    }

    #[must_use]
    pub fn with_pair(mut self, pair_id: Uuid) -> Self {
        self.pair_id = Some(pair_id);
        self
    }

    /// The amount with the kind's sign applied: what this operation adds to
    /// the balance of its currency.
    #[must_use]
    pub fn signed_amount(&self) -> CurrencyAmount {
        match self.kind.sign() {
            Some(sign) => {
                CurrencyAmount::new(self.amount.amount * sign, self.amount.currency.clone())
            }
            None => self.amount.clone(),
        }
    }

    /// Balance seeds are journal markers (snapshot checkpoints).
    #[must_use]
    pub fn is_marker(&self) -> bool {
        self.kind == OperationKind::BalanceSeed
    }
}

/// Movements carry positive magnitudes; a seed may be any non-zero value.
pub(crate) fn validate_amount(kind: OperationKind, amount: &CurrencyAmount) -> ResultEngine<()> {
    match kind {
        OperationKind::BalanceSeed => {
            if amount.is_zero() {
                return Err(EngineError::InvalidAmount(
                    "balance seed must not be 0".to_string(),
                ));
            }
            Ok(())
        }
        _ => amount.ensure_positive("amount"),
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "operations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub account_id: String,
    pub kind: String,
    pub amount: String,
    pub currency: String,
    pub tag: Option<String>,
    pub registered_at: DateTimeUtc,
    pub made_by: String,
    pub pair_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Operation> for ActiveModel {
    fn from(op: &Operation) -> Self {
        Self {
            id: ActiveValue::Set(op.id.to_string()),
            account_id: ActiveValue::Set(op.account_id.to_string()),
            kind: ActiveValue::Set(op.kind.as_str().to_string()),
            amount: ActiveValue::Set(op.amount.amount.to_string()),
            currency: ActiveValue::Set(op.amount.currency.as_str().to_string()),
            tag: ActiveValue::Set(op.tag.clone()),
            registered_at: ActiveValue::Set(op.registered_at),
            made_by: ActiveValue::Set(op.made_by.clone()),
            pair_id: ActiveValue::Set(op.pair_id.map(|id| id.to_string())),
        }
    }
}

impl TryFrom<Model> for Operation {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let amount = Decimal::from_str(&model.amount).map_err(|_| {
            EngineError::InvalidAmount(format!("invalid stored amount: {}", model.amount))
        })?;
        Ok(Self {
            id: parse_uuid(&model.id, "operation")?,
            account_id: parse_uuid(&model.account_id, "account")?,
            kind: OperationKind::from_str(&model.kind)?,
            amount: CurrencyAmount::new(amount, CurrencyCode::new(&model.currency)?),
            tag: model.tag,
            registered_at: model.registered_at,
            made_by: model.made_by,
            pair_id: model
                .pair_id
                .as_deref()
                .map(|id| parse_uuid(id, "pair"))
                .transpose()?,
        })
    }
}
