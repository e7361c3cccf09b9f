//! An append-only history of finalized expenses (§3's "Lifecycle" note).

use serde::{Deserialize, Serialize};

use crate::expense::Expense;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct History {
    expenses: Vec<Expense>,
}

impl History {
    pub fn new() -> History {
        History::default()
    }

    pub fn from_expenses(expenses: Vec<Expense>) -> History {
        History { expenses }
    }

    pub fn push(&mut self, expense: Expense) {
        self.expenses.push(expense);
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Expense> {
        self.expenses.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expense::{DraftParticipant, ExpenseBuilder};
    use crate::money::Money;
    use crate::user::User;
    use chrono::{DateTime, Utc};

    #[test]
    fn history_preserves_append_order() {
        let mut history = History::new();
        for amount in ["10", "20", "30"] {
            let mut b = ExpenseBuilder::new(
                DateTime::<Utc>::MIN_UTC,
                None,
                Money::parse(amount).unwrap(),
                User::new("AA"),
            );
            b.add_participant(DraftParticipant::new(User::new("AA")));
            history.push(b.finalize().unwrap());
        }
        let amounts: Vec<String> = history.iter().map(|e| e.amount.to_string()).collect();
        assert_eq!(amounts, vec!["10.00", "20.00", "30.00"]);
    }
}
