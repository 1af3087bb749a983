use sea_orm::TransactionTrait;

use crate::{Operation, ResultEngine, TransferCmd, transfer};

use super::{Engine, with_tx};

impl Engine {
    /// Moves money between two accounts as a `transfer_out` / `transfer_in`
    /// pair. Both legs and both balances are written in one DB transaction.
    pub async fn transfer(&self, cmd: TransferCmd) -> ResultEngine<(Operation, Operation)> {
        with_tx!(self, |db_tx| {
            let mut from = self
                .partial_ledger(&db_tx, cmd.from_account_id, Vec::<Operation>::new())
                .await?;
            let mut to = self
                .partial_ledger(&db_tx, cmd.to_account_id, Vec::<Operation>::new())
                .await?;
            let (out, inn) = transfer(&mut from, &mut to, cmd.amount, cmd.meta)?;

            self.insert_operation(&db_tx, &out).await?;
            self.insert_operation(&db_tx, &inn).await?;
            self.write_balances(&db_tx, cmd.from_account_id, from.balances())
                .await?;
            self.write_balances(&db_tx, cmd.to_account_id, to.balances())
                .await?;
            tracing::debug!(
                from = %cmd.from_account_id,
                to = %cmd.to_account_id,
                amount = %out.amount,
                "transfer recorded"
            );
            Ok((out, inn))
        })
    }
}
