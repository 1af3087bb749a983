use sea_orm::{ActiveValue, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    CurrencyAmount, EngineError, ExchangeCmd, Operation, RecordOperationCmd, ResultEngine,
    cancel_transfer, operations,
};

use super::{Engine, with_tx};

impl Engine {
    /// Records a credit, debit or balance seed and updates the account
    /// balance in the same DB transaction.
    pub async fn record_operation(&self, cmd: RecordOperationCmd) -> ResultEngine<Operation> {
        with_tx!(self, |db_tx| {
            let mut ledger = self
                .partial_ledger(&db_tx, cmd.account_id, Vec::<Operation>::new())
                .await?;
            let op = ledger
                .record_operation(cmd.kind, cmd.amount, cmd.meta)?
                .clone();
            self.insert_operation(&db_tx, &op).await?;
            self.write_balances(&db_tx, cmd.account_id, ledger.balances())
                .await?;
            Ok(op)
        })
    }

    /// Deletes an operation and reverses its effect.
    ///
    /// Exchange legs are removed together. Transfer legs are removed together
    /// too, reversing both accounts.
    pub async fn delete_operation(&self, id: Uuid) -> ResultEngine<Operation> {
        with_tx!(self, |db_tx| {
            let op = self.load_operation(&db_tx, id).await?;

            if op.kind.is_transfer() {
                let pair_id = op
                    .pair_id
                    .ok_or_else(|| {
                        EngineError::InvalidOperation("unpaired transfer leg".to_string())
                    })?;
                let legs = self.load_pair(&db_tx, pair_id).await?;
                let (out, inn) = split_transfer(legs, pair_id)?;
                let (from_id, to_id) = (out.account_id, inn.account_id);

                let mut from = self.partial_ledger(&db_tx, from_id, [out]).await?;
                let mut to = self.partial_ledger(&db_tx, to_id, [inn]).await?;
                let (out, inn) = cancel_transfer(&mut from, &mut to, pair_id)?;

                self.remove_operation(&db_tx, out.id).await?;
                self.remove_operation(&db_tx, inn.id).await?;
                self.write_balances(&db_tx, from_id, from.balances()).await?;
                self.write_balances(&db_tx, to_id, to.balances()).await?;
                tracing::debug!(pair_id = %pair_id, "transfer cancelled");
            } else {
                let related = match op.pair_id {
                    Some(pair_id) => self.load_pair(&db_tx, pair_id).await?,
                    None => vec![op.clone()],
                };
                let mut ledger = self.partial_ledger(&db_tx, op.account_id, related).await?;
                for removed in ledger.delete_operation(id)? {
                    self.remove_operation(&db_tx, removed.id).await?;
                }
                self.write_balances(&db_tx, op.account_id, ledger.balances())
                    .await?;
            }
            Ok(op)
        })
    }

    /// Replaces the amount of a credit, debit or balance seed.
    pub async fn edit_operation(
        &self,
        id: Uuid,
        new_amount: CurrencyAmount,
    ) -> ResultEngine<Operation> {
        with_tx!(self, |db_tx| {
            let op = self.load_operation(&db_tx, id).await?;
            let account_id = op.account_id;
            let mut ledger = self.partial_ledger(&db_tx, account_id, [op]).await?;
            let edited = ledger.edit_operation(id, new_amount)?.clone();

            let model = operations::ActiveModel {
                id: ActiveValue::Set(id.to_string()),
                amount: ActiveValue::Set(edited.amount.amount.to_string()),
                currency: ActiveValue::Set(edited.amount.currency.as_str().to_string()),
                ..Default::default()
            };
            model.update(&db_tx).await?;
            self.write_balances(&db_tx, account_id, ledger.balances())
                .await?;
            Ok(edited)
        })
    }

    /// Records both legs of a currency exchange.
    pub async fn exchange_currency(
        &self,
        cmd: ExchangeCmd,
    ) -> ResultEngine<(Operation, Operation)> {
        with_tx!(self, |db_tx| {
            let mut ledger = self
                .partial_ledger(&db_tx, cmd.account_id, Vec::<Operation>::new())
                .await?;
            let (out, inn) = ledger.exchange_currency(cmd.out_amount, cmd.in_amount, cmd.meta)?;
            self.insert_operation(&db_tx, &out).await?;
            self.insert_operation(&db_tx, &inn).await?;
            self.write_balances(&db_tx, cmd.account_id, ledger.balances())
                .await?;
            Ok((out, inn))
        })
    }
}

/// Splits the rows of a transfer pair into `(out, in)`.
fn split_transfer(legs: Vec<Operation>, pair_id: Uuid) -> ResultEngine<(Operation, Operation)> {
    let mut out = None;
    let mut inn = None;
    for leg in legs {
        match leg.kind {
            crate::OperationKind::TransferOut => out = Some(leg),
            crate::OperationKind::TransferIn => inn = Some(leg),
            _ => {}
        }
    }
    out.zip(inn)
        .ok_or_else(|| EngineError::UnknownOperation(pair_id.to_string()))
}
