//! The expense resolver (§4.2): builds a draft expense from a payer, an
//! amount, and a participant list tagged with optional "+" and "*"
//! modifiers, then finalizes it into an immutable, ledger-ready `Expense`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ExpenseError;
use crate::money::Money;
use crate::user::User;

/// A single participant's modifiers and (once finalized) computed share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub plus_mod: Decimal,
    pub star_mod: Decimal,
    pub share: Money,
}

/// An immutable, finalized expense. The payer, if also listed as a
/// participant, appears in `participants` with their own modifiers and the
/// same computed `share` formula as everyone else; `payer_credit()`/
/// `debits()` are what filter the payer out of the debtor side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    pub amount: Money,
    pub payer: User,
    pub participants: HashMap<User, ParticipantRecord>,
}

impl Expense {
    /// Sum of `share` over every non-payer participant — what the payer is
    /// credited for this expense.
    pub fn payer_credit(&self) -> Money {
        self.participants
            .iter()
            .filter(|(u, _)| **u != self.payer)
            .map(|(_, r)| r.share)
            .sum()
    }

    /// Non-payer participants and the amount each owes.
    pub fn debits(&self) -> impl Iterator<Item = (&User, Money)> {
        self.participants
            .iter()
            .filter(move |(u, _)| **u != self.payer)
            .map(|(u, r)| (u, r.share))
    }
}

/// A single entry in the draft participant list, before modifier
/// normalization (§4.2): a missing `plus_mod` defaults to 0, a missing
/// `star_mod` defaults to 1.
#[derive(Debug, Clone)]
pub struct DraftParticipant {
    pub user: User,
    pub plus_mod: Option<Decimal>,
    pub star_mod: Option<Decimal>,
}

impl DraftParticipant {
    pub fn new(user: User) -> DraftParticipant {
        DraftParticipant {
            user,
            plus_mod: None,
            star_mod: None,
        }
    }

    pub fn with_plus(mut self, plus_mod: Decimal) -> DraftParticipant {
        self.plus_mod = Some(plus_mod);
        self
    }

    pub fn with_star(mut self, star_mod: Decimal) -> DraftParticipant {
        self.star_mod = Some(star_mod);
        self
    }

    fn normalized_plus(&self) -> Decimal {
        Money::new(self.plus_mod.unwrap_or(dec!(0))).as_decimal()
    }

    fn normalized_star(&self) -> Decimal {
        Money::new(self.star_mod.unwrap_or(dec!(1))).as_decimal()
    }
}

/// A draft, not-yet-finalized expense. Mirrors §4.2/§9's "in-flight
/// expense" builder: a transient value on the caller's stack, never a
/// long-lived field.
pub struct ExpenseBuilder {
    date: DateTime<Utc>,
    description: Option<String>,
    amount: Money,
    payer: User,
    participants: Vec<DraftParticipant>,
    finalized: bool,
}

impl ExpenseBuilder {
    pub fn new(date: DateTime<Utc>, description: Option<String>, amount: Money, payer: User) -> Self {
        ExpenseBuilder {
            date,
            description,
            amount,
            payer,
            participants: Vec::new(),
            finalized: false,
        }
    }

    /// Adds a participant to the draft. A silent no-op once the builder is
    /// finalized (§4.2's "States" note).
    pub fn add_participant(&mut self, participant: DraftParticipant) {
        if self.finalized {
            return;
        }
        self.participants.push(participant);
    }

    /// Runs the finalization algorithm (§4.2 steps 1-6) and returns the
    /// immutable `Expense`. On any error, `self` is left with `finalized`
    /// unset and no partial state has escaped — the caller simply drops
    /// the builder.
    pub fn finalize(mut self) -> Result<Expense, ExpenseError> {
        if self.participants.is_empty() {
            return Err(ExpenseError::EmptyExpense);
        }

        let mut seen = std::collections::HashSet::new();
        for p in &self.participants {
            if !seen.insert(p.user.clone()) {
                return Err(ExpenseError::DuplicateParticipant(p.user.clone()));
            }
        }

        let total_plus: Decimal = self.participants.iter().map(|p| p.normalized_plus()).sum();
        let total_star: Decimal = self.participants.iter().map(|p| p.normalized_star()).sum();
        let amount = self.amount.as_decimal();

        let common_fraction = if amount < total_plus {
            return Err(ExpenseError::PlusModTooLarge);
        } else if amount == total_plus {
            dec!(0)
        } else if total_star == dec!(0) {
            return Err(ExpenseError::PhantomMoney);
        } else {
            (self.amount - Money::new(total_plus)).div_at_working_scale(total_star)
        };

        debug!(
            "finalizing expense: amount={} totalPlus={} totalStar={} commonFraction={}",
            self.amount, total_plus, total_star, common_fraction
        );

        let mut participants = HashMap::with_capacity(self.participants.len());
        for p in self.participants.drain(..) {
            let plus_mod = p.normalized_plus();
            let star_mod = p.normalized_star();
            let share = Money::new(common_fraction * star_mod + plus_mod);
            participants.insert(
                p.user.clone(),
                ParticipantRecord {
                    plus_mod,
                    star_mod,
                    share,
                },
            );
        }

        self.finalized = true;
        Ok(Expense {
            date: self.date,
            description: self.description.take(),
            amount: self.amount,
            payer: self.payer.clone(),
            participants,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn builder(amount: &str, payer: &str) -> ExpenseBuilder {
        ExpenseBuilder::new(
            DateTime::<Utc>::MIN_UTC,
            None,
            Money::parse(amount).unwrap(),
            User::new(payer),
        )
    }

    /// Scenario 1: equal split.
    #[test]
    fn equal_split() {
        let mut b = builder("30", "AA");
        b.add_participant(DraftParticipant::new(User::new("AA")));
        b.add_participant(DraftParticipant::new(User::new("BB")));
        b.add_participant(DraftParticipant::new(User::new("CC")));
        let e = b.finalize().unwrap();
        assert_eq!(e.participants[&User::new("BB")].share.to_string(), "10.00");
        assert_eq!(e.participants[&User::new("CC")].share.to_string(), "10.00");
        assert_eq!(e.payer_credit().to_string(), "20.00");
    }

    /// Scenario 2: plus modifier.
    #[test]
    fn plus_modifier() {
        let mut b = builder("30", "AA");
        b.add_participant(DraftParticipant::new(User::new("AA")));
        b.add_participant(DraftParticipant::new(User::new("BB")).with_plus(d("5")));
        b.add_participant(DraftParticipant::new(User::new("CC")));
        let e = b.finalize().unwrap();
        assert_eq!(e.participants[&User::new("BB")].share.to_string(), "13.33");
        assert_eq!(e.participants[&User::new("CC")].share.to_string(), "8.33");
        assert_eq!(e.payer_credit().to_string(), "21.66");
    }

    /// Scenario 3: star modifier.
    #[test]
    fn star_modifier() {
        let mut b = builder("100", "AA");
        b.add_participant(DraftParticipant::new(User::new("AA")).with_star(d("1")));
        b.add_participant(DraftParticipant::new(User::new("BB")).with_star(d("3")));
        b.add_participant(DraftParticipant::new(User::new("CC")).with_star(d("1")));
        let e = b.finalize().unwrap();
        assert_eq!(e.participants[&User::new("BB")].share.to_string(), "60.00");
        assert_eq!(e.participants[&User::new("CC")].share.to_string(), "20.00");
        assert_eq!(e.payer_credit().to_string(), "80.00");
    }

    /// Scenario 4: plus mod too large.
    #[test]
    fn plus_mod_too_large() {
        let mut b = builder("10", "AA");
        b.add_participant(DraftParticipant::new(User::new("AA")));
        b.add_participant(DraftParticipant::new(User::new("BB")).with_plus(d("20")));
        assert_eq!(b.finalize().unwrap_err(), ExpenseError::PlusModTooLarge);
    }

    /// Scenario 5: phantom money. A missing starMod normalizes to 1 (see
    /// `normalized_star`), so `totalStar == 0` is only reachable when every
    /// participant's star weight is explicitly zeroed out.
    #[test]
    fn phantom_money() {
        let mut b = builder("10", "AA");
        b.add_participant(DraftParticipant::new(User::new("AA")).with_plus(d("3")).with_star(d("0")));
        b.add_participant(DraftParticipant::new(User::new("BB")).with_plus(d("2")).with_star(d("0")));
        assert_eq!(b.finalize().unwrap_err(), ExpenseError::PhantomMoney);
    }

    #[test]
    fn empty_expense_is_rejected() {
        let b = builder("10", "AA");
        assert_eq!(b.finalize().unwrap_err(), ExpenseError::EmptyExpense);
    }

    #[test]
    fn duplicate_participant_is_rejected() {
        let mut b = builder("10", "AA");
        b.add_participant(DraftParticipant::new(User::new("AA")));
        b.add_participant(DraftParticipant::new(User::new("BB")));
        b.add_participant(DraftParticipant::new(User::new("BB")));
        assert!(matches!(
            b.finalize().unwrap_err(),
            ExpenseError::DuplicateParticipant(_)
        ));
    }

    #[test]
    fn adding_participant_after_finalize_is_a_silent_no_op() {
        let mut b = builder("20", "AA");
        b.add_participant(DraftParticipant::new(User::new("AA")));
        b.add_participant(DraftParticipant::new(User::new("BB")));
        // We can't call finalize twice (it consumes self), so this test
        // instead documents the no-op behaviour directly on the flag path.
        b.finalized = true;
        b.add_participant(DraftParticipant::new(User::new("CC")));
        assert_eq!(b.participants.len(), 2);
    }

    /// Share idempotence (§8): swapping modifier insertion order doesn't
    /// change the computed shares.
    #[test]
    fn share_idempotence_under_reordering() {
        let mut b1 = builder("30", "AA");
        b1.add_participant(DraftParticipant::new(User::new("BB")).with_plus(d("5")).with_star(d("2")));
        b1.add_participant(DraftParticipant::new(User::new("AA")));
        b1.add_participant(DraftParticipant::new(User::new("CC")).with_star(d("1")));
        let e1 = b1.finalize().unwrap();

        let mut b2 = builder("30", "AA");
        b2.add_participant(DraftParticipant::new(User::new("BB")).with_star(d("2")).with_plus(d("5")));
        b2.add_participant(DraftParticipant::new(User::new("CC")).with_star(d("1")));
        b2.add_participant(DraftParticipant::new(User::new("AA")));
        let e2 = b2.finalize().unwrap();

        assert_eq!(
            e1.participants[&User::new("BB")].share,
            e2.participants[&User::new("BB")].share
        );
        assert_eq!(
            e1.participants[&User::new("CC")].share,
            e2.participants[&User::new("CC")].share
        );
    }
}
