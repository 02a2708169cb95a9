use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::address::Address;
use crate::error::TokenError;

/// One simulated token root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: u128,
    pub root_owner: Address,
    /// Native balance reported for the root account.
    pub balance: u128,
    pub created_at: DateTime<Utc>,
}

/// In-memory store of simulated tokens, shared by all in-flight operations.
///
/// Entries live until the process exits. Supply updates happen under the
/// write lock, so concurrent mints on one token never lose an increment.
#[derive(Debug, Default)]
pub struct TokenRegistry {
    entries: RwLock<HashMap<Address, RegistryEntry>>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new token. Returns `false` if the address is already taken.
    pub(crate) fn insert(&self, address: Address, entry: RegistryEntry) -> bool {
        let mut entries = self.entries.write();
        if entries.contains_key(&address) {
            return false;
        }
        entries.insert(address, entry);
        true
    }

    /// Snapshot of a token entry.
    pub fn get(&self, address: &Address) -> Option<RegistryEntry> {
        self.entries.read().get(address).cloned()
    }

    /// Atomically add `amount` to the token's supply and return the new total.
    pub(crate) fn add_supply(&self, address: &Address, amount: u128) -> Result<u128, TokenError> {
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(address)
            .ok_or_else(|| TokenError::NotFound(address.to_string()))?;
        let total = entry
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| TokenError::ExecutionFailed {
                exit_code: None,
                message: format!("total supply of {} would overflow uint128", entry.symbol),
            })?;
        entry.total_supply = total;
        Ok(total)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
