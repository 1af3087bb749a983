use sea_orm::{DatabaseConnection, DatabaseTransaction, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    Account, AccountLedger, CurrencyBucket, EngineError, Operation, ResultEngine, account_balances,
};

mod accounts;
mod balances;
mod list;
mod operations;
mod transfers;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Store backed front of the ledger.
///
/// Every mutation runs in one database transaction: the operation rows and the
/// balance rows of the touched accounts are written together or not at all.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Loads an account with its stored balances.
    async fn load_account(
        &self,
        db_tx: &DatabaseTransaction,
        account_id: Uuid,
    ) -> ResultEngine<Account> {
        let model = crate::accounts::Entity::find_by_id(account_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;
        let rows = account_balances::Entity::find()
            .filter(account_balances::Column::AccountId.eq(account_id.to_string()))
            .all(db_tx)
            .await?;
        let balances = account_balances::bucket_from_models(rows)?;
        Account::try_from((model, balances))
    }

    /// Every operation of an account, oldest first.
    async fn load_operations(
        &self,
        db_tx: &DatabaseTransaction,
        account_id: Uuid,
    ) -> ResultEngine<Vec<Operation>> {
        let models = crate::operations::Entity::find()
            .filter(crate::operations::Column::AccountId.eq(account_id.to_string()))
            .order_by_asc(crate::operations::Column::RegisteredAt)
            .order_by_asc(crate::operations::Column::Id)
            .all(db_tx)
            .await?;
        models.into_iter().map(Operation::try_from).collect()
    }

    async fn load_operation(
        &self,
        db_tx: &DatabaseTransaction,
        id: Uuid,
    ) -> ResultEngine<Operation> {
        let model = crate::operations::Entity::find_by_id(id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::UnknownOperation(id.to_string()))?;
        Operation::try_from(model)
    }

    /// Both legs sharing `pair_id`.
    async fn load_pair(
        &self,
        db_tx: &DatabaseTransaction,
        pair_id: Uuid,
    ) -> ResultEngine<Vec<Operation>> {
        let models = crate::operations::Entity::find()
            .filter(crate::operations::Column::PairId.eq(pair_id.to_string()))
            .all(db_tx)
            .await?;
        models.into_iter().map(Operation::try_from).collect()
    }

    /// A ledger holding only `operations`, on top of the stored balances.
    async fn partial_ledger(
        &self,
        db_tx: &DatabaseTransaction,
        account_id: Uuid,
        operations: impl IntoIterator<Item = Operation>,
    ) -> ResultEngine<AccountLedger> {
        let account = self.load_account(db_tx, account_id).await?;
        AccountLedger::from_parts(account, operations)
    }

    /// Replaces the stored balance rows of an account with `balances`.
    async fn write_balances(
        &self,
        db_tx: &DatabaseTransaction,
        account_id: Uuid,
        balances: &CurrencyBucket,
    ) -> ResultEngine<()> {
        let account_id = account_id.to_string();
        account_balances::Entity::delete_many()
            .filter(account_balances::Column::AccountId.eq(account_id.clone()))
            .exec(db_tx)
            .await?;
        if balances.is_empty() {
            return Ok(());
        }
        let rows = balances
            .iter()
            .map(|(currency, amount)| {
                account_balances::active_model(&account_id, currency, *amount)
            });
        account_balances::Entity::insert_many(rows).exec(db_tx).await?;
        Ok(())
    }

    async fn insert_operation(
        &self,
        db_tx: &DatabaseTransaction,
        op: &Operation,
    ) -> ResultEngine<()> {
        let model: crate::operations::ActiveModel = op.into();
        model.insert(db_tx).await?;
        Ok(())
    }

    async fn remove_operation(&self, db_tx: &DatabaseTransaction, id: Uuid) -> ResultEngine<()> {
        crate::operations::Entity::delete_by_id(id.to_string())
            .exec(db_tx)
            .await?;
        Ok(())
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
