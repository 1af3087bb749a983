//! Stored per-currency balances of an account.
//!
//! One row per `(account_id, currency)`. Amounts are kept as decimal text so
//! the store never goes through floating point.

use std::str::FromStr;

use rust_decimal::Decimal;
use sea_orm::entity::{ActiveValue, prelude::*};

use crate::{CurrencyBucket, CurrencyCode, EngineError, ResultEngine};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "account_balances")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub account_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub currency: String,
    pub amount: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) fn active_model(
    account_id: &str,
    currency: &CurrencyCode,
    amount: Decimal,
) -> ActiveModel {
    ActiveModel {
        account_id: ActiveValue::Set(account_id.to_string()),
        currency: ActiveValue::Set(currency.as_str().to_string()),
        amount: ActiveValue::Set(amount.to_string()),
    }
}

/// Folds stored balance rows back into a bucket.
pub(crate) fn bucket_from_models(models: Vec<Model>) -> ResultEngine<CurrencyBucket> {
    let mut bucket = CurrencyBucket::new();
    for model in models {
        let currency = CurrencyCode::new(&model.currency)?;
        let amount = Decimal::from_str(&model.amount).map_err(|_| {
            EngineError::InvalidAmount(format!("invalid stored balance: {}", model.amount))
        })?;
        bucket.add_amount(&currency, amount)?;
    }
    Ok(bucket)
}
