use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::{AccountLedger, CurrencyBucket, ResultEngine};

use super::{Engine, with_tx};

impl Engine {
    /// Recomputes the stored balances of an account from its journal.
    ///
    /// - Replays every operation in chronological order from zero.
    /// - Overwrites the balance rows with the result.
    /// - Works on archived accounts too.
    pub async fn recompute_balances(&self, account_id: Uuid) -> ResultEngine<CurrencyBucket> {
        with_tx!(self, |db_tx| {
            let account = self.load_account(&db_tx, account_id).await?;
            let stored = account.balances.clone();
            let operations = self.load_operations(&db_tx, account_id).await?;
            let ledger = AccountLedger::replay(account, operations)?;

            let balances = ledger.balances().clone();
            if balances != stored {
                tracing::warn!(
                    account_id = %account_id,
                    stored = %stored,
                    replayed = %balances,
                    "stored balances drifted from the journal"
                );
            }
            self.write_balances(&db_tx, account_id, &balances).await?;
            Ok(balances)
        })
    }
}
