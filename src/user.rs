//! An opaque user identifier, compared by name.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct User(String);

impl User {
    pub fn new(name: impl Into<String>) -> User {
        User(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for User {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for User {
    fn from(name: &str) -> User {
        User::new(name)
    }
}

impl From<String> for User {
    fn from(name: String) -> User {
        User::new(name)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
