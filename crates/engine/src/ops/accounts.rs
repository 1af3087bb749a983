use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    Account, AccountLedger, EngineError, NewAccountCmd, ResultEngine, accounts,
    util::normalize_required_name,
};

use super::{Engine, with_tx};

impl Engine {
    /// Creates an account with empty balances.
    ///
    /// Names are unique per owner, ignoring case.
    pub async fn new_account(&self, cmd: NewAccountCmd) -> ResultEngine<Account> {
        let name = normalize_required_name(&cmd.name, "account")?;
        let owner = normalize_required_name(&cmd.owner, "owner")?;
        with_tx!(self, |db_tx| {
            let exists = accounts::Entity::find()
                .filter(accounts::Column::Owner.eq(owner.clone()))
                .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(name));
            }

            let mut account = Account::new(name, owner, cmd.allowed_currencies);
            account.is_private = cmd.is_private;
            let model: accounts::ActiveModel = (&account).into();
            model.insert(&db_tx).await?;
            tracing::info!(account_id = %account.id, name = %account.name, "account created");
            Ok(account)
        })
    }

    /// Return an account snapshot from DB.
    pub async fn account(&self, account_id: Uuid) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| self.load_account(&db_tx, account_id).await)
    }

    /// Accounts of an owner, archived ones included, by name.
    pub async fn accounts_of(&self, owner: &str) -> ResultEngine<Vec<Account>> {
        with_tx!(self, |db_tx| {
            let models = accounts::Entity::find()
                .filter(accounts::Column::Owner.eq(owner.trim().to_string()))
                .all(&db_tx)
                .await?;
            let mut out = Vec::with_capacity(models.len());
            for model in models {
                let id = crate::util::parse_uuid(&model.id, "account")?;
                out.push(self.load_account(&db_tx, id).await?);
            }
            out.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
            Ok(out)
        })
    }

    /// Soft-deletes an account: history stays readable, new movements fail
    /// with `AccountArchived`.
    pub async fn archive_account(&self, account_id: Uuid) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            let mut account = self.load_account(&db_tx, account_id).await?;
            if !account.archived {
                account.archive();
                let model = accounts::ActiveModel {
                    id: ActiveValue::Set(account_id.to_string()),
                    archived: ActiveValue::Set(true),
                    ..Default::default()
                };
                model.update(&db_tx).await?;
                tracing::info!(account_id = %account_id, "account archived");
            }
            Ok(account)
        })
    }

    /// Loads the full ledger of an account: stored balances plus the whole
    /// journal.
    pub async fn ledger(&self, account_id: Uuid) -> ResultEngine<AccountLedger> {
        with_tx!(self, |db_tx| {
            let account = self.load_account(&db_tx, account_id).await?;
            let operations = self.load_operations(&db_tx, account_id).await?;
            AccountLedger::from_parts(account, operations)
        })
    }
}
