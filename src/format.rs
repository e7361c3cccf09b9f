//! Result reporting (§4.7): renders settlement statements and per-user
//! history into the fixed line shapes the default CLI driver prints.

use chrono::NaiveDate;

use crate::expense::Expense;
use crate::history::History;
use crate::settlement::Settlement;
use crate::user::User;

pub const DONE: &str = "Done";

/// One line per settlement statement: `"<debtor> owes <creditor> <amount>"`.
/// An empty settlement list formats to an empty string.
pub fn format_balance(statements: &[Settlement]) -> String {
    statements
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// One line per expense that `user` was involved in, filtered to that user
/// and formatted as `"<dd/MM/yyyy> <desc?> - you pay back <amount>"` or
/// `"... - you get back <amount>"` (§4.7).
pub fn format_history(user: &User, history: &History) -> String {
    history
        .iter()
        .filter_map(|expense| format_history_line(user, expense))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_history_line(user: &User, expense: &Expense) -> Option<String> {
    let date = expense.date.format("%d/%m/%Y");
    let (verb, amount) = if expense.payer == *user {
        let credit = expense.payer_credit();
        if credit.is_zero() {
            return None;
        }
        ("you get back", credit)
    } else {
        let share = expense
            .participants
            .get(user)
            .map(|record| record.share)
            .filter(|share| !share.is_zero())?;
        ("you pay back", share)
    };

    Some(match &expense.description {
        Some(desc) => format!("{date} {desc} - {verb} {amount}"),
        None => format!("{date} - {verb} {amount}"),
    })
}

/// The `dd/MM/yyyy` date alone, exposed for callers that want it without a
/// full history line (e.g. a richer host UI).
pub fn format_date(date: chrono::DateTime<chrono::Utc>) -> NaiveDate {
    date.date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expense::{DraftParticipant, ExpenseBuilder};
    use crate::money::Money;
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn balance_formats_one_line_per_statement() {
        let statements = vec![
            Settlement {
                debtor: User::new("AA"),
                creditor: User::new("BB"),
                amount: Money::parse("10").unwrap(),
            },
            Settlement {
                debtor: User::new("CC"),
                creditor: User::new("BB"),
                amount: Money::parse("5").unwrap(),
            },
        ];
        assert_eq!(
            format_balance(&statements),
            "AA owes BB 10.00\nCC owes BB 5.00"
        );
    }

    #[test]
    fn balance_formats_empty_list_as_empty_string() {
        assert_eq!(format_balance(&[]), "");
    }

    #[test]
    fn history_reports_pay_back_and_get_back_lines() {
        let mut b = ExpenseBuilder::new(
            date(2024, 3, 7),
            Some("dinner".to_string()),
            Money::parse("30").unwrap(),
            User::new("AA"),
        );
        b.add_participant(DraftParticipant::new(User::new("AA")));
        b.add_participant(DraftParticipant::new(User::new("BB")));
        let expense = b.finalize().unwrap();

        let mut history = History::new();
        history.push(expense);

        assert_eq!(
            format_history(&User::new("AA"), &history),
            "07/03/2024 dinner - you get back 15.00"
        );
        assert_eq!(
            format_history(&User::new("BB"), &history),
            "07/03/2024 dinner - you pay back 15.00"
        );
    }

    #[test]
    fn history_omits_line_with_no_description() {
        let mut b = ExpenseBuilder::new(date(2024, 1, 1), None, Money::parse("10").unwrap(), User::new("AA"));
        b.add_participant(DraftParticipant::new(User::new("AA")));
        b.add_participant(DraftParticipant::new(User::new("BB")));
        let expense = b.finalize().unwrap();
        let mut history = History::new();
        history.push(expense);
        assert_eq!(
            format_history(&User::new("BB"), &history),
            "01/01/2024 - you pay back 5.00"
        );
    }

    #[test]
    fn history_filters_to_the_asking_user() {
        let mut b = ExpenseBuilder::new(date(2024, 1, 1), None, Money::parse("10").unwrap(), User::new("AA"));
        b.add_participant(DraftParticipant::new(User::new("AA")));
        b.add_participant(DraftParticipant::new(User::new("BB")));
        let expense = b.finalize().unwrap();
        let mut history = History::new();
        history.push(expense);
        assert_eq!(format_history(&User::new("CC"), &history), "");
    }

    #[test]
    fn payer_with_zero_net_credit_gets_no_line() {
        // A payer who is also a participant with a full-amount plus modifier
        // contributes no credit line of their own for this expense.
        let mut b = ExpenseBuilder::new(date(2024, 1, 1), None, Money::parse("10").unwrap(), User::new("AA"));
        b.add_participant(DraftParticipant::new(User::new("AA")).with_plus(dec!(10)));
        b.add_participant(DraftParticipant::new(User::new("BB")));
        let expense = b.finalize().unwrap();
        let mut history = History::new();
        history.push(expense);
        assert_eq!(format_history(&User::new("AA"), &history), "");
    }
}
