//! Error taxonomy for the engine. Every recoverable failure is a variant of
//! one of these `thiserror`-derived enums; none of this crate's library code
//! panics on a condition a caller can trigger.

use thiserror::Error;

use crate::user::User;

/// Failures that can occur while finalizing an expense (§4.2).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ExpenseError {
    #[error("an expense must have at least one participant")]
    EmptyExpense,
    #[error("the sum of fixed (+) modifiers exceeds the expense amount")]
    PlusModTooLarge,
    #[error(
        "the expense amount exceeds the sum of fixed (+) modifiers, but no participant has a \
         multiplicative (*) weight to absorb the remainder"
    )]
    PhantomMoney,
    #[error("{0} appears more than once among the expense's participants")]
    DuplicateParticipant(User),
}

/// Failures from the group directory (§4.4).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum GroupError {
    #[error("a group named {0} already exists")]
    AlreadyExists(String),
    #[error("no group named {0} exists")]
    NoSuchGroup(String),
    #[error("{0} is already a member of {1}")]
    AlreadyMember(User, String),
    #[error("{0} is not a member of {1}")]
    NotAMember(User, String),
    #[error("group name {0:?} is not 3-12 uppercase ASCII letters")]
    InvalidName(String),
}

/// Failures from the storage facade (§4.5).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to (de)serialize stored data: {0}")]
    Serde(#[from] serde_json::Error),
}

/// The umbrella error returned by `Engine` operations that touch more than
/// one subsystem.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Expense(#[from] ExpenseError),
    #[error(transparent)]
    Group(#[from] GroupError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
