//! Resource registry
//!
//! Maps each held resource name to the token of the scenario holding it.
//! The registry itself is not synchronised; [`ResourceLock`](crate::ResourceLock)
//! keeps it behind a single mutex.

use crate::token::OwnerToken;
use std::collections::HashMap;

/// Result of trying to claim a name
#[derive(Debug)]
pub enum Claim {
    /// The name was free and now belongs to the caller
    Acquired,
    /// The caller already held the name
    Reentered,
    /// Another scenario holds the name
    HeldBy(OwnerToken),
}

/// One entry visited during a teardown sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweptEntry {
    pub name: String,
    /// Whether the entry belonged to the finishing scenario and was removed
    pub released: bool,
}

/// Name -> holder mapping
#[derive(Debug, Default)]
pub struct Registry {
    holders: HashMap<String, OwnerToken>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `name` for `token` if it is free
    pub fn claim(&mut self, name: &str, token: &OwnerToken) -> Claim {
        match self.holders.get(name) {
            None => {
                self.holders.insert(name.to_string(), token.clone());
                Claim::Acquired
            }
            Some(holder) if holder.same_owner(token) => Claim::Reentered,
            Some(holder) => Claim::HeldBy(holder.clone()),
        }
    }

    /// Current holder of `name`
    pub fn holder(&self, name: &str) -> Option<&OwnerToken> {
        self.holders.get(name)
    }

    /// Remove every entry held by `token`
    ///
    /// Returns all entries present at sweep time, held or not, in iteration
    /// order.
    pub fn sweep(&mut self, token: &OwnerToken) -> Vec<SweptEntry> {
        let mut visited = Vec::with_capacity(self.holders.len());

        self.holders.retain(|name, holder| {
            let released = holder.same_owner(token);
            visited.push(SweptEntry {
                name: name.clone(),
                released,
            });
            !released
        });

        visited
    }

    /// Sorted names of all held resources
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.holders.keys().cloned().collect();
        names.sort();
        names
    }

    /// Sorted names held by `token`
    pub fn names_owned_by(&self, token: &OwnerToken) -> Vec<String> {
        let mut names: Vec<String> = self
            .holders
            .iter()
            .filter(|(_, holder)| holder.same_owner(token))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.holders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }
}
