//! The module contains `Account` struct and its implementation.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    CurrencyAmount, CurrencyBucket, CurrencyCode, EngineError, ResultEngine, util::parse_uuid,
};

/// A bank account (or cash box) holding money in one or more currencies.
///
/// Balances are kept per currency and are only changed through
/// [`Account::apply_signed`], which is what the ledger calls when operations
/// are applied or reversed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Stable identifier for this account.
    pub id: Uuid,
    pub name: String,
    pub owner: String,
    pub is_private: bool,
    /// `None` means the account is multi-currency.
    pub allowed_currencies: Option<BTreeSet<CurrencyCode>>,
    pub balances: CurrencyBucket,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(
        name: String,
        owner: String,
        allowed_currencies: Option<BTreeSet<CurrencyCode>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            owner,
            is_private: false,
            allowed_currencies,
            balances: CurrencyBucket::new(),
            archived: false,
            created_at: Utc::now(),
        }
    }

    /// Returns `true` if the account declares `currency` as one of its own.
    ///
    /// Multi-currency accounts accept everything.
    #[must_use]
    pub fn accepts(&self, currency: &CurrencyCode) -> bool {
        self.allowed_currencies
            .as_ref()
            .is_none_or(|allowed| allowed.contains(currency))
    }

    /// Adds a signed amount to the matching balance entry.
    pub fn apply_signed(&mut self, amount: &CurrencyAmount) -> ResultEngine<()> {
        self.balances.add(amount)
    }

    pub fn archive(&mut self) {
        self.archived = true;
    }

    pub(crate) fn ensure_active(&self) -> ResultEngine<()> {
        if self.archived {
            return Err(EngineError::AccountArchived(self.id.to_string()));
        }
        Ok(())
    }
}

/// Serializes an allowed-currency set as `"EUR,USD"`.
pub(crate) fn encode_allowed(allowed: Option<&BTreeSet<CurrencyCode>>) -> Option<String> {
    allowed.map(|set| {
        set.iter()
            .map(CurrencyCode::as_str)
            .collect::<Vec<_>>()
            .join(",")
    })
}

pub(crate) fn decode_allowed(raw: Option<&str>) -> ResultEngine<Option<BTreeSet<CurrencyCode>>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let mut set = BTreeSet::new();
    for code in raw.split(',').filter(|c| !c.trim().is_empty()) {
        set.insert(CurrencyCode::new(code)?);
    }
    Ok(Some(set))
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub owner: String,
    pub is_private: bool,
    pub allowed_currencies: Option<String>,
    pub archived: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::account_balances::Entity")]
    Balances,
    #[sea_orm(has_many = "super::operations::Entity")]
    Operations,
}

impl Related<super::account_balances::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Balances.def()
    }
}

impl Related<super::operations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Operations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(value: &Account) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            name: ActiveValue::Set(value.name.clone()),
            owner: ActiveValue::Set(value.owner.clone()),
            is_private: ActiveValue::Set(value.is_private),
            allowed_currencies: ActiveValue::Set(encode_allowed(value.allowed_currencies.as_ref())),
            archived: ActiveValue::Set(value.archived),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}

impl TryFrom<(Model, CurrencyBucket)> for Account {
    type Error = EngineError;

    fn try_from((model, balances): (Model, CurrencyBucket)) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "account")?,
            name: model.name,
            owner: model.owner,
            is_private: model.is_private,
            allowed_currencies: decode_allowed(model.allowed_currencies.as_deref())?,
            balances,
            archived: model.archived,
            created_at: model.created_at,
        })
    }
}
