//! A shared-expense ledger: exact decimal accounting of per-expense shares
//! with additive/multiplicative uneven-split modifiers, and an exhaustive
//! optimizer that settles the resulting balances with as few transfers as
//! possible.
//!
//! The core is three pieces, built bottom-up: [`money`] fixes the decimal
//! convention, [`expense`] resolves one expense's shares onto a [`ledger`],
//! and [`settlement`] turns a ledger snapshot into a minimal set of
//! transfers. [`engine`] wires those up with a [`storage`] facade, a
//! [`groups`] directory, and a [`parser`] for the text command surface into
//! a single `dispatch` entry point.

pub mod engine;
pub mod error;
pub mod expense;
pub mod format;
pub mod groups;
pub mod history;
pub mod ledger;
pub mod money;
pub mod parser;
pub mod settlement;
pub mod storage;
pub mod user;

pub use engine::{Config, Engine};
pub use error::{EngineError, ExpenseError, GroupError, StorageError};
pub use expense::{Expense, ExpenseBuilder};
pub use ledger::Ledger;
pub use money::Money;
pub use settlement::Settlement;
pub use user::User;
