//! Per-account ledger.
//!
//! An [`AccountLedger`] owns one [`Account`] and the [`OperationJournal`]
//! backing its balances. Every balance change goes through the journal:
//! recording inserts then applies, deleting reverses then removes, editing
//! re-applies the difference. The two never change independently.

use uuid::Uuid;

use crate::{
    Account, CurrencyAmount, CurrencyBucket, EngineError, Operation, OperationJournal,
    OperationKind, OperationMeta, ResultEngine, operations::validate_amount,
};

/// One line of an account statement: an operation and the balances right
/// after it was applied.
#[derive(Clone, Debug, PartialEq)]
pub struct StatementRow<'a> {
    pub operation: &'a Operation,
    pub balances_after: CurrencyBucket,
}

impl StatementRow<'_> {
    /// Balance seeds are rendered differently from regular movements.
    #[must_use]
    pub fn is_marker(&self) -> bool {
        self.operation.is_marker()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AccountLedger {
    account: Account,
    journal: OperationJournal,
}

impl AccountLedger {
    /// Wraps an account with an empty journal.
    pub fn new(account: Account) -> Self {
        Self {
            account,
            journal: OperationJournal::new(),
        }
    }

    /// Rebuilds a ledger from its journal, starting from zero balances.
    ///
    /// Archived accounts can be replayed: the archive flag only blocks new
    /// movements.
    pub fn replay(
        mut account: Account,
        operations: impl IntoIterator<Item = Operation>,
    ) -> ResultEngine<Self> {
        account.balances = CurrencyBucket::new();
        let mut ledger = Self::new(account);
        for op in operations {
            ledger.ensure_owned(&op)?;
            ledger.commit(op)?;
        }
        Ok(ledger)
    }

    /// Joins an account whose balances already include `operations`, as
    /// loaded from the store. Nothing is applied.
    pub(crate) fn from_parts(
        account: Account,
        operations: impl IntoIterator<Item = Operation>,
    ) -> ResultEngine<Self> {
        let mut ledger = Self::new(account);
        for op in operations {
            ledger.ensure_owned(&op)?;
            ledger.journal.insert(op)?;
        }
        Ok(ledger)
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn balances(&self) -> &CurrencyBucket {
        &self.account.balances
    }

    pub fn journal(&self) -> &OperationJournal {
        &self.journal
    }

    pub fn archive(&mut self) {
        self.account.archive();
    }

    /// Adds the signed amount of `op` to its currency entry.
    ///
    /// Currencies outside `allowed_currencies` are booked too; only a balance
    /// that no longer fits fails, with `InvalidAmount`.
    pub fn apply(&mut self, op: &Operation) -> ResultEngine<()> {
        self.account.apply_signed(&op.signed_amount())
    }

    /// Removes the signed effect of `op` from its currency entry.
    pub fn reverse(&mut self, op: &Operation) -> ResultEngine<()> {
        self.account.apply_signed(&op.signed_amount().negated())
    }

    /// `reverse(old)` followed by `apply(new)`, all or nothing.
    pub fn reapply(&mut self, old: &Operation, new: &Operation) -> ResultEngine<()> {
        let mut balances = self.account.balances.clone();
        balances.add(&old.signed_amount().negated())?;
        balances.add(&new.signed_amount())?;
        self.account.balances = balances;
        Ok(())
    }

    /// Inserts `op` into the journal and applies it to the balances.
    pub fn record(&mut self, op: Operation) -> ResultEngine<&Operation> {
        self.ensure_recordable(&op)?;
        self.commit(op)
    }

    /// Builds and records a credit, debit or balance seed.
    ///
    /// Transfer and exchange legs must go through [`transfer`] and
    /// [`AccountLedger::exchange_currency`] so they are always recorded in
    /// pairs.
    pub fn record_operation(
        &mut self,
        kind: OperationKind,
        amount: CurrencyAmount,
        meta: OperationMeta,
    ) -> ResultEngine<&Operation> {
        if !kind.is_standalone() {
            return Err(EngineError::InvalidOperation(format!(
                "{kind} operations are recorded in pairs"
            )));
        }
        let op = Operation::new(self.account.id, kind, amount, meta)?;
        self.record(op)
    }

    /// Deletes an operation, reversing its effect first.
    ///
    /// Deleting one leg of an exchange removes both legs. Transfer legs span
    /// two ledgers and must be removed with [`cancel_transfer`].
    pub fn delete_operation(&mut self, id: Uuid) -> ResultEngine<Vec<Operation>> {
        let op = self
            .journal
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownOperation(id.to_string()))?;
        if op.kind.is_transfer() {
            return Err(EngineError::InvalidOperation(
                "transfer legs must be cancelled on both accounts".to_string(),
            ));
        }

        let mut removed = vec![op];
        if removed[0].kind.is_exchange()
            && let Some(partner) = self.journal.partner(&removed[0]).cloned()
        {
            removed.push(partner);
        }

        let mut balances = self.account.balances.clone();
        for op in &removed {
            balances.add(&op.signed_amount().negated())?;
        }
        for op in &removed {
            self.journal.remove(op.id)?;
        }
        self.account.balances = balances;
        tracing::debug!(
            account_id = %self.account.id,
            operation_id = %id,
            removed = removed.len(),
            "operation deleted"
        );
        Ok(removed)
    }

    /// Replaces the amount (and possibly the currency) of an operation.
    pub fn edit_operation(
        &mut self,
        id: Uuid,
        new_amount: CurrencyAmount,
    ) -> ResultEngine<&Operation> {
        let old = self
            .journal
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownOperation(id.to_string()))?;
        let new = edited(&old, new_amount)?;

        self.reapply(&old, &new)?;
        let entry = self
            .journal
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownOperation(id.to_string()))?;
        entry.amount = new.amount;
        tracing::debug!(account_id = %self.account.id, operation_id = %id, "operation edited");
        Ok(entry)
    }

    /// Records an `exchange_out` leg in the old currency and an `exchange_in`
    /// leg in the new one.
    ///
    /// The implied rate is trusted as given.
    pub fn exchange_currency(
        &mut self,
        out_amount: CurrencyAmount,
        in_amount: CurrencyAmount,
        meta: OperationMeta,
    ) -> ResultEngine<(Operation, Operation)> {
        let (out, inn) = exchange_legs(self.account.id, out_amount, in_amount, meta)?;
        self.ensure_recordable(&out)?;
        self.ensure_recordable(&inn)?;
        // The legs touch different currencies, so each check stands alone.
        self.ensure_applicable(&out)?;
        self.ensure_applicable(&inn)?;
        self.commit(out.clone())?;
        self.commit(inn.clone())?;
        Ok((out, inn))
    }

    /// Chronological statement with running balances.
    pub fn statement(&self) -> ResultEngine<Vec<StatementRow<'_>>> {
        // Balances that predate the journal (e.g. an account loaded with
        // stored balances) are the opening line.
        let mut running = self.account.balances.clone();
        for op in self.journal.iter() {
            running.add(&op.signed_amount().negated())?;
        }

        self.journal
            .iter()
            .map(|op| {
                running.add(&op.signed_amount())?;
                Ok::<_, EngineError>(StatementRow {
                    operation: op,
                    balances_after: running.clone(),
                })
            })
            .collect()
    }

    fn ensure_owned(&self, op: &Operation) -> ResultEngine<()> {
        if op.account_id != self.account.id {
            return Err(EngineError::KeyNotFound(format!(
                "operation {} in account {}",
                op.id, self.account.id
            )));
        }
        Ok(())
    }

    /// Fails when booking `op` would overflow its balance entry.
    fn ensure_applicable(&self, op: &Operation) -> ResultEngine<()> {
        self.account.balances.clone().add(&op.signed_amount())
    }

    fn ensure_recordable(&self, op: &Operation) -> ResultEngine<()> {
        self.ensure_owned(op)?;
        self.account.ensure_active()?;
        if self.journal.contains(op.id) {
            return Err(EngineError::ExistingKey(op.id.to_string()));
        }
        Ok(())
    }

    fn commit(&mut self, op: Operation) -> ResultEngine<&Operation> {
        if !self.account.accepts(&op.amount.currency) {
            tracing::warn!(
                account_id = %self.account.id,
                currency = %op.amount.currency,
                "currency outside the account's allowed set, booking anyway"
            );
        }
        if self.journal.contains(op.id) {
            return Err(EngineError::ExistingKey(op.id.to_string()));
        }
        let signed = op.signed_amount();
        self.account.apply_signed(&signed)?;
        let inserted = self.journal.insert(op)?;
        tracing::debug!(
            account_id = %self.account.id,
            operation_id = %inserted.id,
            kind = %inserted.kind,
            amount = %signed,
            "operation applied"
        );
        Ok(inserted)
    }
}

/// Moves `amount` from one ledger to another as a `transfer_out` /
/// `transfer_in` pair.
///
/// Both sides are validated before either is touched, so either both legs are
/// recorded or neither is.
pub fn transfer(
    from: &mut AccountLedger,
    to: &mut AccountLedger,
    amount: CurrencyAmount,
    meta: OperationMeta,
) -> ResultEngine<(Operation, Operation)> {
    let (out, inn) = transfer_legs(from.account.id, to.account.id, amount, meta)?;
    from.ensure_recordable(&out)?;
    to.ensure_recordable(&inn)?;
    from.ensure_applicable(&out)?;
    to.ensure_applicable(&inn)?;
    from.commit(out.clone())?;
    to.commit(inn.clone())?;
    Ok((out, inn))
}

/// Removes both legs of a transfer, reversing them on their ledgers.
pub fn cancel_transfer(
    from: &mut AccountLedger,
    to: &mut AccountLedger,
    pair_id: Uuid,
) -> ResultEngine<(Operation, Operation)> {
    let find = |ledger: &AccountLedger, kind: OperationKind| {
        ledger
            .journal
            .iter()
            .find(|op| op.pair_id == Some(pair_id) && op.kind == kind)
            .cloned()
            .ok_or_else(|| EngineError::UnknownOperation(pair_id.to_string()))
    };
    let out = find(&*from, OperationKind::TransferOut)?;
    let inn = find(&*to, OperationKind::TransferIn)?;

    let mut from_balances = from.account.balances.clone();
    from_balances.add(&out.signed_amount().negated())?;
    let mut to_balances = to.account.balances.clone();
    to_balances.add(&inn.signed_amount().negated())?;

    from.journal.remove(out.id)?;
    to.journal.remove(inn.id)?;
    from.account.balances = from_balances;
    to.account.balances = to_balances;
    Ok((out, inn))
}

/// Builds the two legs of a transfer.
pub(crate) fn transfer_legs(
    from_account_id: Uuid,
    to_account_id: Uuid,
    amount: CurrencyAmount,
    meta: OperationMeta,
) -> ResultEngine<(Operation, Operation)> {
    if from_account_id == to_account_id {
        return Err(EngineError::InvalidOperation(
            "from and to accounts must differ".to_string(),
        ));
    }
    amount.ensure_positive("transfer amount")?;
    let pair_id = Uuid::new_v4();
    let out = Operation::new(
        from_account_id,
        OperationKind::TransferOut,
        amount.clone(),
        meta.clone(),
    )?
    .with_pair(pair_id);
    let inn =
        Operation::new(to_account_id, OperationKind::TransferIn, amount, meta)?.with_pair(pair_id);
    Ok((out, inn))
}

/// Builds the two legs of a currency exchange.
pub(crate) fn exchange_legs(
    account_id: Uuid,
    out_amount: CurrencyAmount,
    in_amount: CurrencyAmount,
    meta: OperationMeta,
) -> ResultEngine<(Operation, Operation)> {
    if out_amount.currency == in_amount.currency {
        return Err(EngineError::CurrencyMismatch(format!(
            "exchange needs two different currencies, got {} twice",
            out_amount.currency
        )));
    }
    out_amount.ensure_positive("exchanged amount")?;
    in_amount.ensure_positive("received amount")?;
    let pair_id = Uuid::new_v4();
    let out = Operation::new(account_id, OperationKind::ExchangeOut, out_amount, meta.clone())?
        .with_pair(pair_id);
    let inn =
        Operation::new(account_id, OperationKind::ExchangeIn, in_amount, meta)?.with_pair(pair_id);
    Ok((out, inn))
}

/// Returns `old` with its amount replaced, refusing paired legs.
pub(crate) fn edited(old: &Operation, new_amount: CurrencyAmount) -> ResultEngine<Operation> {
    if !old.kind.is_standalone() {
        return Err(EngineError::InvalidOperation(format!(
            "{} legs cannot be edited on their own",
            old.kind
        )));
    }
    validate_amount(old.kind, &new_amount)?;
    let mut new = old.clone();
    new.amount = new_amount;
    Ok(new)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::CurrencyCode;

    fn amount(value: Decimal, currency: &str) -> CurrencyAmount {
        CurrencyAmount::new(value, CurrencyCode::new(currency).unwrap())
    }

    fn meta(secs: i64) -> OperationMeta {
        OperationMeta::new("alice", Utc.timestamp_opt(0, 0).unwrap() + Duration::seconds(secs))
    }

    fn ledger(name: &str) -> AccountLedger {
        AccountLedger::new(Account::new(name.to_string(), "alice".to_string(), None))
    }

    fn bucket(entries: &[(Decimal, &str)]) -> CurrencyBucket {
        CurrencyBucket::from_amounts(entries.iter().map(|(v, c)| amount(*v, c))).unwrap()
    }

    #[test]
    fn delete_restores_balances() {
        let mut ledger = ledger("Banco");
        ledger
            .record_operation(OperationKind::Credit, amount(dec!(100), "USD"), meta(1))
            .unwrap();
        let debit_id = ledger
            .record_operation(OperationKind::Debit, amount(dec!(30), "USD"), meta(2))
            .unwrap()
            .id;
        ledger
            .record_operation(OperationKind::Credit, amount(dec!(50), "EUR"), meta(3))
            .unwrap();

        assert_eq!(
            ledger.balances(),
            &bucket(&[(dec!(70), "USD"), (dec!(50), "EUR")])
        );

        ledger.delete_operation(debit_id).unwrap();
        assert_eq!(
            ledger.balances(),
            &bucket(&[(dec!(100), "USD"), (dec!(50), "EUR")])
        );
        assert_eq!(ledger.journal().len(), 2);
    }

    #[test]
    fn apply_then_reverse_is_identity() {
        let mut ledger = ledger("Caja");
        ledger
            .record_operation(OperationKind::Credit, amount(dec!(12.5), "CUP"), meta(1))
            .unwrap();
        let before = ledger.balances().clone();

        let op = Operation::new(
            ledger.account().id,
            OperationKind::Debit,
            amount(dec!(4.25), "USD"),
            meta(2),
        )
        .unwrap();
        ledger.apply(&op).unwrap();
        assert_ne!(ledger.balances(), &before);
        ledger.reverse(&op).unwrap();
        assert_eq!(ledger.balances(), &before);
    }

    #[test]
    fn edit_reapplies_difference() {
        let mut ledger = ledger("Banco");
        let id = ledger
            .record_operation(OperationKind::Debit, amount(dec!(30), "USD"), meta(1))
            .unwrap()
            .id;

        let edited = ledger.edit_operation(id, amount(dec!(45), "EUR")).unwrap();
        assert_eq!(edited.amount, amount(dec!(45), "EUR"));
        assert_eq!(ledger.balances(), &bucket(&[(dec!(-45), "EUR")]));
    }

    #[test]
    fn unknown_ids_are_caller_errors() {
        let mut ledger = ledger("Banco");
        let id = Uuid::new_v4();
        assert_eq!(
            ledger.delete_operation(id),
            Err(EngineError::UnknownOperation(id.to_string()))
        );
        assert_eq!(
            ledger.edit_operation(id, amount(dec!(1), "USD")).map(|op| op.id),
            Err(EngineError::UnknownOperation(id.to_string()))
        );
    }

    #[test]
    fn transfer_touches_only_both_sides() {
        let mut a = ledger("A");
        let mut b = ledger("B");
        let c = ledger("C");
        a.record_operation(OperationKind::Credit, amount(dec!(100), "USD"), meta(1))
            .unwrap();

        let (out, inn) = transfer(&mut a, &mut b, amount(dec!(40), "USD"), meta(2)).unwrap();
        assert_eq!(out.pair_id, inn.pair_id);
        assert_eq!(a.balances(), &bucket(&[(dec!(60), "USD")]));
        assert_eq!(b.balances(), &bucket(&[(dec!(40), "USD")]));
        assert!(c.balances().is_empty());

        // Same net effect as a debit on A and a credit on B.
        let mut a2 = ledger("A2");
        let mut b2 = ledger("B2");
        a2.record_operation(OperationKind::Credit, amount(dec!(100), "USD"), meta(1))
            .unwrap();
        a2.record_operation(OperationKind::Debit, amount(dec!(40), "USD"), meta(2))
            .unwrap();
        b2.record_operation(OperationKind::Credit, amount(dec!(40), "USD"), meta(2))
            .unwrap();
        assert_eq!(a.balances(), a2.balances());
        assert_eq!(b.balances(), b2.balances());
    }

    #[test]
    fn transfer_is_all_or_nothing() {
        let mut a = ledger("A");
        let mut b = ledger("B");
        b.archive();

        let result = transfer(&mut a, &mut b, amount(dec!(10), "USD"), meta(1));
        assert!(matches!(result, Err(EngineError::AccountArchived(_))));
        assert!(a.journal().is_empty());
        assert!(a.balances().is_empty());
        assert!(b.journal().is_empty());
    }

    #[test]
    fn transfer_to_self_is_rejected() {
        let mut a = ledger("A");
        let mut same = a.clone();
        let result = transfer(&mut a, &mut same, amount(dec!(10), "USD"), meta(1));
        assert!(matches!(result, Err(EngineError::InvalidOperation(_))));
    }

    #[test]
    fn cancel_transfer_reverses_both_legs() {
        let mut a = ledger("A");
        let mut b = ledger("B");
        let (out, _) = transfer(&mut a, &mut b, amount(dec!(15), "EUR"), meta(1)).unwrap();

        let single = a.delete_operation(out.id);
        assert!(matches!(single, Err(EngineError::InvalidOperation(_))));

        cancel_transfer(&mut a, &mut b, out.pair_id.unwrap()).unwrap();
        assert!(a.balances().is_empty() && a.journal().is_empty());
        assert!(b.balances().is_empty() && b.journal().is_empty());
    }

    #[test]
    fn exchange_records_two_legs_and_deletes_both() {
        let mut ledger = ledger("Caja");
        ledger
            .record_operation(OperationKind::Credit, amount(dec!(100), "USD"), meta(1))
            .unwrap();

        let (out, _) = ledger
            .exchange_currency(amount(dec!(10), "USD"), amount(dec!(3200), "CUP"), meta(2))
            .unwrap();
        assert_eq!(
            ledger.balances(),
            &bucket(&[(dec!(90), "USD"), (dec!(3200), "CUP")])
        );

        let removed = ledger.delete_operation(out.id).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(ledger.balances(), &bucket(&[(dec!(100), "USD")]));
    }

    #[test]
    fn exchange_rejects_same_currency_and_paired_edits() {
        let mut ledger = ledger("Caja");
        let result =
            ledger.exchange_currency(amount(dec!(1), "USD"), amount(dec!(1), "usd"), meta(1));
        assert!(matches!(result, Err(EngineError::CurrencyMismatch(_))));

        let (out, _) = ledger
            .exchange_currency(amount(dec!(1), "USD"), amount(dec!(320), "CUP"), meta(1))
            .unwrap();
        let edit = ledger.edit_operation(out.id, amount(dec!(2), "USD")).map(|op| op.id);
        assert!(matches!(edit, Err(EngineError::InvalidOperation(_))));
    }

    #[test]
    fn foreign_currency_is_still_booked() {
        let allowed = [CurrencyCode::new("USD").unwrap()].into_iter().collect();
        let account = Account::new("USD only".to_string(), "alice".to_string(), Some(allowed));
        let mut ledger = AccountLedger::new(account);
        ledger
            .record_operation(OperationKind::Credit, amount(dec!(5), "EUR"), meta(1))
            .unwrap();
        assert_eq!(ledger.balances(), &bucket(&[(dec!(5), "EUR")]));
    }

    #[test]
    fn statement_shows_running_balances_and_markers() {
        let mut ledger = ledger("Banco");
        ledger
            .record_operation(OperationKind::BalanceSeed, amount(dec!(500), "USD"), meta(1))
            .unwrap();
        ledger
            .record_operation(OperationKind::Debit, amount(dec!(20), "USD"), meta(3))
            .unwrap();
        ledger
            .record_operation(OperationKind::Credit, amount(dec!(5), "USD"), meta(2))
            .unwrap();

        let rows = ledger.statement().unwrap();
        let running: Vec<_> = rows
            .iter()
            .map(|row| row.balances_after.get(&CurrencyCode::new("USD").unwrap()))
            .collect();
        assert_eq!(running, vec![Some(dec!(500)), Some(dec!(505)), Some(dec!(485))]);
        assert!(rows[0].is_marker());
        assert!(!rows[1].is_marker());
    }

    #[test]
    fn replay_matches_incremental_balances() {
        let mut ledger = ledger("Banco");
        ledger
            .record_operation(OperationKind::Credit, amount(dec!(100), "USD"), meta(1))
            .unwrap();
        ledger
            .exchange_currency(amount(dec!(10), "USD"), amount(dec!(9), "EUR"), meta(2))
            .unwrap();

        let ops: Vec<Operation> = ledger.journal().iter().cloned().collect();
        let replayed = AccountLedger::replay(ledger.account().clone(), ops).unwrap();
        assert_eq!(replayed.balances(), ledger.balances());
        assert_eq!(replayed.journal().len(), 3);
    }

    #[test]
    fn pair_kinds_cannot_be_recorded_alone() {
        let mut ledger = ledger("Banco");
        let result = ledger
            .record_operation(OperationKind::TransferIn, amount(dec!(1), "USD"), meta(1))
            .map(|op| op.id);
        assert!(matches!(result, Err(EngineError::InvalidOperation(_))));
    }

    #[test]
    fn operations_of_another_account_are_not_found() {
        let mut ledger = ledger("Banco");
        let other = Account::new("Caja".to_string(), "alice".to_string(), None);
        let op = Operation::new(other.id, OperationKind::Credit, amount(dec!(1), "USD"), meta(1))
            .unwrap();

        let result = ledger.record(op).map(|op| op.id);
        assert!(matches!(result, Err(EngineError::KeyNotFound(_))));
        assert!(ledger.journal().is_empty());
        assert!(ledger.balances().is_empty());
    }

    #[test]
    fn overflowing_balance_is_rejected_without_booking() {
        let mut ledger = ledger("Banco");
        ledger
            .record_operation(OperationKind::Credit, amount(Decimal::MAX, "USD"), meta(1))
            .unwrap();

        let result = ledger
            .record_operation(OperationKind::Credit, amount(dec!(1), "USD"), meta(2))
            .map(|op| op.id);
        assert_eq!(
            result,
            Err(EngineError::InvalidAmount("amount too large".to_string()))
        );
        assert_eq!(ledger.journal().len(), 1);
        assert_eq!(ledger.balances(), &bucket(&[(Decimal::MAX, "USD")]));
    }

    #[test]
    fn overflowing_transfer_leaves_both_sides_untouched() {
        let mut a = ledger("A");
        let mut b = ledger("B");
        a.record_operation(OperationKind::Credit, amount(dec!(10), "USD"), meta(1))
            .unwrap();
        b.record_operation(OperationKind::Credit, amount(Decimal::MAX, "USD"), meta(1))
            .unwrap();
        let (a_before, b_before) = (a.clone(), b.clone());

        let result = transfer(&mut a, &mut b, amount(dec!(5), "USD"), meta(2));
        assert!(matches!(result, Err(EngineError::InvalidAmount(_))));
        assert_eq!(a, a_before);
        assert_eq!(b, b_before);
    }

    #[test]
    fn overflowing_edit_keeps_the_old_amount() {
        let mut ledger = ledger("Banco");
        let almost_full = amount(Decimal::MAX - dec!(1), "USD");
        ledger
            .record_operation(OperationKind::Credit, almost_full, meta(1))
            .unwrap();
        let id = ledger
            .record_operation(OperationKind::Credit, amount(dec!(1), "USD"), meta(2))
            .unwrap()
            .id;
        let before = ledger.clone();

        let result = ledger.edit_operation(id, amount(dec!(2), "USD")).map(|op| op.id);
        assert!(matches!(result, Err(EngineError::InvalidAmount(_))));
        assert_eq!(ledger, before);
    }

    #[test]
    fn overflowing_delete_keeps_the_operation() {
        let mut ledger = ledger("Banco");
        ledger
            .record_operation(OperationKind::Credit, amount(Decimal::MAX, "USD"), meta(1))
            .unwrap();
        let debit = ledger
            .record_operation(OperationKind::Debit, amount(dec!(1), "USD"), meta(2))
            .unwrap()
            .id;
        ledger
            .record_operation(OperationKind::Credit, amount(dec!(1), "USD"), meta(3))
            .unwrap();
        let before = ledger.clone();

        assert!(matches!(
            ledger.delete_operation(debit),
            Err(EngineError::InvalidAmount(_))
        ));
        assert_eq!(ledger, before);
    }
}
