//! The ledger (§3): a mapping from `User` to a signed `Money` balance, with
//! the invariant that no entry is ever exactly zero.

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::expense::Expense;
use crate::money::Money;
use crate::user::User;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ledger {
    balances: HashMap<User, Money>,
}

impl Ledger {
    pub fn new() -> Ledger {
        Ledger::default()
    }

    /// Builds a ledger directly from a set of signed balances, skipping any
    /// entry that is exactly zero. Useful for constructing a ledger snapshot
    /// to feed straight to the settlement optimizer, without replaying a
    /// sequence of expenses.
    pub fn from_balances(entries: impl IntoIterator<Item = (User, Money)>) -> Ledger {
        let mut balances = HashMap::new();
        for (user, amount) in entries {
            if !amount.is_zero() {
                balances.insert(user, amount);
            }
        }
        Ledger { balances }
    }

    pub fn balance_of(&self, user: &User) -> Money {
        self.balances.get(user).copied().unwrap_or(Money::ZERO)
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&User, &Money)> {
        self.balances.iter()
    }

    /// Applies a single credit or debit, removing the entry if it nets to
    /// exactly zero (§3's ledger invariant).
    fn adjust(&mut self, user: &User, delta: Money) {
        let entry = self
            .balances
            .entry(user.clone())
            .or_insert(Money::ZERO);
        *entry += delta;
        if entry.is_zero() {
            self.balances.remove(user);
        }
    }

    /// Applies a finalized expense's ledger deltas atomically: the payer is
    /// credited for `payer_credit()`, every other participant is debited for
    /// their share. Because `Expense::finalize` already computed every share
    /// up front, this can only fail to uphold Σ=0 if the expense's own
    /// invariants were violated, which finalize already guards against.
    pub fn apply_expense(&mut self, expense: &Expense) {
        let credit = expense.payer_credit();
        if !credit.is_zero() {
            self.adjust(&expense.payer, credit);
        }
        for (user, share) in expense.debits() {
            if !share.is_zero() {
                self.adjust(user, -share);
            }
        }
        debug!(
            "applied expense from {}: payer credited {}",
            expense.payer, credit
        );
    }

    /// A snapshot of non-zero balances, suitable for the settlement
    /// optimizer. The sum of the returned values is always zero.
    pub fn snapshot(&self) -> Vec<(User, Money)> {
        self.balances
            .iter()
            .map(|(u, m)| (u.clone(), *m))
            .collect()
    }
}
