//! The owning engine (§9): ties the ledger, expense history, group
//! directory, and storage facade together behind a single `dispatch` entry
//! point, matching the distilled spec's "no global mutable state in the
//! core proper" note — all of it lives on this one struct.

use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use log::warn;

use crate::error::EngineError;
use crate::expense::{DraftParticipant, ExpenseBuilder};
use crate::format;
use crate::groups::{GroupDirectory, HandleToken};
use crate::history::History;
use crate::ledger::Ledger;
use crate::money::Money;
use crate::parser::{self, Command, ParsedExpense};
use crate::settlement::{self, Settlement};
use crate::storage::Storage;
use crate::user::User;

/// Operational knobs (§10). The scale-2/scale-3 convention in §4.1 is fixed
/// and has no corresponding field; log level follows the `RUST_LOG`/
/// `env_logger` convention instead of a bespoke field here.
#[derive(Debug, Clone)]
pub struct Config {
    pub storage_dir: PathBuf,
    pub settle_budget: Option<Duration>,
}

impl Config {
    /// Reads `LEDGER_STORAGE_DIR` (default `./ledger-data`) and
    /// `LEDGER_SETTLE_BUDGET_MS` (default: no budget, deterministic search).
    pub fn from_env() -> Config {
        let storage_dir = std::env::var("LEDGER_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./ledger-data"));
        let settle_budget = std::env::var("LEDGER_SETTLE_BUDGET_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis);
        Config {
            storage_dir,
            settle_budget,
        }
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            storage_dir: PathBuf::from("./ledger-data"),
            settle_budget: None,
        }
    }
}

pub struct Engine {
    storage: Box<dyn Storage>,
    ledger: Ledger,
    history: History,
    groups: GroupDirectory,
    config: Config,
}

impl Engine {
    /// Loads state from `storage` (each key defaults to empty on first use,
    /// per §4.5).
    pub fn new(storage: Box<dyn Storage>, config: Config) -> Result<Engine, EngineError> {
        let ledger = storage.load_ledger()?;
        let history = History::from_expenses(storage.load_history()?);
        let groups = storage.load_groups()?;
        Ok(Engine {
            storage,
            ledger,
            history,
            groups,
            config,
        })
    }

    /// Parses and applies a single line of input on behalf of `user`. Mirrors
    /// §7's silent contract exactly: a malformed command, a duplicate
    /// participant, or any expense/group failure yields `None` (no
    /// response), never a panic. Successful state-mutating commands yield
    /// `Done`; `BALANCE`/`HISTORY` yield their rendered report, which may be
    /// an empty string.
    pub fn dispatch(&mut self, user: &User, line: &str) -> Option<String> {
        match parser::parse(line) {
            Command::Balance => Some(format::format_balance(&self.balance())),
            Command::History => Some(format::format_history(user, &self.history)),
            Command::Create { group } => self.create_group(&group).ok().map(|_| format::DONE.to_string()),
            Command::Add { user: u, group } => self
                .add_member(&u, &group)
                .ok()
                .map(|_| format::DONE.to_string()),
            Command::Delete { user: u, group } => self
                .remove_member(&u, &group)
                .ok()
                .map(|_| format::DONE.to_string()),
            Command::Expense(expense) => self.submit_expense(expense).ok().map(|_| format::DONE.to_string()),
            Command::Unrecognized => None,
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn groups(&self) -> &GroupDirectory {
        &self.groups
    }

    pub fn balance_of(&self, user: &User) -> Money {
        self.ledger.balance_of(user)
    }

    /// The current settlement, subject to the configured wall-clock budget
    /// (§5): if the full search doesn't finish in time, falls back to the
    /// trivial one-component tree settlement and logs a warning. Disabled
    /// by default, so the search stays deterministic in tests.
    pub fn balance(&self) -> Vec<Settlement> {
        match self.config.settle_budget {
            None => settlement::generate_statements(&self.ledger),
            Some(budget) => self.balance_with_budget(budget),
        }
    }

    fn balance_with_budget(&self, budget: Duration) -> Vec<Settlement> {
        let ledger = self.ledger.clone();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(settlement::generate_statements(&ledger));
        });
        match rx.recv_timeout(budget) {
            Ok(statements) => statements,
            Err(_) => {
                warn!(
                    "settlement search exceeded the {:?} budget, falling back to the trivial tree settlement",
                    budget
                );
                settlement::trivial_settlement(&self.ledger)
            }
        }
    }

    pub fn create_group(&mut self, name: &str) -> Result<(), EngineError> {
        self.groups.create(name)?;
        self.persist()
    }

    pub fn add_member(&mut self, user: &str, group: &str) -> Result<(), EngineError> {
        self.groups.add_member(group, User::new(user))?;
        self.persist()
    }

    pub fn remove_member(&mut self, user: &str, group: &str) -> Result<(), EngineError> {
        self.groups.remove_member(group, &User::new(user))?;
        self.persist()
    }

    /// Expands each participant token through the group directory (a token
    /// that names a known group expands to its current members, each
    /// carrying that token's modifiers; an unknown token is a direct user),
    /// then finalizes and applies the resulting expense. The payer is
    /// always the first token resolved as a direct user, matching §4.2's
    /// assumption that the payer is a single individual.
    pub fn submit_expense(&mut self, parsed: ParsedExpense) -> Result<(), EngineError> {
        let payer = User::new(parsed.payer_handle.clone());
        let mut builder = ExpenseBuilder::new(Utc::now(), parsed.description.clone(), Money::new(parsed.amount), payer);

        let tokens: Vec<HandleToken> = parsed
            .participants
            .iter()
            .map(|p| HandleToken {
                handle: p.handle.clone(),
                plus_mod: p.plus_mod,
                star_mod: p.star_mod,
            })
            .collect();

        for expanded in self.groups.expand(&tokens) {
            let mut draft = DraftParticipant::new(expanded.user);
            if let Some(plus) = expanded.plus_mod {
                draft = draft.with_plus(plus);
            }
            if let Some(star) = expanded.star_mod {
                draft = draft.with_star(star);
            }
            builder.add_participant(draft);
        }

        let expense = builder.finalize()?;
        self.ledger.apply_expense(&expense);
        self.history.push(expense);
        self.persist()
    }

    fn persist(&self) -> Result<(), EngineError> {
        self.storage.save_ledger(&self.ledger)?;
        let history: Vec<_> = self.history.iter().cloned().collect();
        self.storage.save_history(&history)?;
        self.storage.save_groups(&self.groups)?;
        Ok(())
    }
}
