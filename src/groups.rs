//! The group directory (§4.4): a plain mapping from group name to member
//! set. Mechanical by design — no algorithmic depth — but part of the
//! tested external surface, since it's what expands a mixture of user and
//! group handles into the expense resolver's participant list.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::GroupError;
use crate::user::User;

/// One handle token from an expense's participant list, prior to group
/// expansion — the handle plus whatever modifiers that token itself carried.
#[derive(Debug, Clone)]
pub struct HandleToken {
    pub handle: String,
    pub plus_mod: Option<Decimal>,
    pub star_mod: Option<Decimal>,
}

/// A resolved participant: a user paired with the modifiers from the handle
/// token that produced it (a group token's modifiers apply to every member
/// it expanded to).
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedParticipant {
    pub user: User,
    pub plus_mod: Option<Decimal>,
    pub star_mod: Option<Decimal>,
}

/// A group name is 3-12 uppercase ASCII letters (§4.4/§4.6).
pub fn is_valid_group_name(name: &str) -> bool {
    (3..=12).contains(&name.len()) && name.bytes().all(|b| b.is_ascii_uppercase())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupDirectory {
    groups: HashMap<String, HashSet<User>>,
}

impl GroupDirectory {
    pub fn new() -> GroupDirectory {
        GroupDirectory::default()
    }

    pub fn create(&mut self, name: &str) -> Result<(), GroupError> {
        if !is_valid_group_name(name) {
            return Err(GroupError::InvalidName(name.to_string()));
        }
        if self.groups.contains_key(name) {
            return Err(GroupError::AlreadyExists(name.to_string()));
        }
        self.groups.insert(name.to_string(), HashSet::new());
        Ok(())
    }

    pub fn add_member(&mut self, name: &str, user: User) -> Result<(), GroupError> {
        let members = self
            .groups
            .get_mut(name)
            .ok_or_else(|| GroupError::NoSuchGroup(name.to_string()))?;
        if members.contains(&user) {
            return Err(GroupError::AlreadyMember(user, name.to_string()));
        }
        members.insert(user);
        Ok(())
    }

    pub fn remove_member(&mut self, name: &str, user: &User) -> Result<(), GroupError> {
        let members = self
            .groups
            .get_mut(name)
            .ok_or_else(|| GroupError::NoSuchGroup(name.to_string()))?;
        if !members.remove(user) {
            return Err(GroupError::NotAMember(user.clone(), name.to_string()));
        }
        Ok(())
    }

    pub fn members(&self, name: &str) -> Option<&HashSet<User>> {
        self.groups.get(name)
    }

    /// Resolves a mixture of direct user handles and group handles into a
    /// participant list, expanding each group handle to its current members
    /// and carrying that token's modifiers along with each. A handle
    /// reachable through two *different* groups is deduplicated into one
    /// participant, per §4.4; a handle reachable once directly and once
    /// through a group is deliberately left as two entries — that case is
    /// not a "same participant twice" dedup, it's a conflicting-modifier
    /// expense, and `ExpenseBuilder::finalize`'s own duplicate check is what
    /// rejects it.
    pub fn expand(&self, tokens: &[HandleToken]) -> Vec<ExpandedParticipant> {
        let mut seen_via_group = HashSet::new();
        let mut out = Vec::new();
        for token in tokens {
            match self.groups.get(&token.handle) {
                Some(members) => {
                    for user in members {
                        if seen_via_group.insert(user.clone()) {
                            out.push(ExpandedParticipant {
                                user: user.clone(),
                                plus_mod: token.plus_mod,
                                star_mod: token.star_mod,
                            });
                        }
                    }
                }
                None => out.push(ExpandedParticipant {
                    user: User::new(token.handle.clone()),
                    plus_mod: token.plus_mod,
                    star_mod: token.star_mod,
                }),
            }
        }
        out
    }
}
