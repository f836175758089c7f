//! Post-trade settlement collaborators.
//!
//! Settlement runs after a market order has already mutated the book. A failed
//! transfer is reported to the caller and never rolls the book back.

use crate::error::SettlementError;
use crate::order_matcher::Match;
use crate::OwnerId;
use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;

/// Settlement credentials of an owner.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub owner: OwnerId,
    pub address: String,
}

pub trait AccountDirectory {
    fn resolve(&self, owner: OwnerId) -> Option<Account>;
}

pub trait SettlementService {
    fn transfer(&self, from: &Account, to: &Account, amount: Decimal) -> Result<(), SettlementError>;
}

/**
Moves `size_filled` from the ask-side owner to the bid-side owner of every
match, in order. Stops at the first failure and returns it; transfers made
before the failure stand. On success returns the number of settled matches.
*/
pub fn settle_matches(
    matches: &[Match],
    directory: &dyn AccountDirectory,
    service: &dyn SettlementService,
) -> Result<usize, SettlementError> {
    for m in matches {
        let from = directory
            .resolve(m.seller())
            .ok_or(SettlementError::UnknownAccount(m.seller()))?;
        let to = directory
            .resolve(m.buyer())
            .ok_or(SettlementError::UnknownAccount(m.buyer()))?;

        if let Err(err) = service.transfer(&from, &to, m.size_filled) {
            warn!(
                "Settlement of {} from {} to {} failed: {}",
                m.size_filled, from.owner, to.owner, err
            );
            return Err(err);
        }
        debug!(
            "Settled {} at {} from {} to {}",
            m.size_filled, m.price, from.address, to.address
        );
    }
    Ok(matches.len())
}

/// Balance table acting as both account directory and settlement service.
#[derive(Default)]
pub struct InMemoryLedger {
    accounts: HashMap<OwnerId, Account>,
    balances: Mutex<HashMap<OwnerId, Decimal>>,
}

impl InMemoryLedger {
    pub fn new() -> InMemoryLedger {
        InMemoryLedger::default()
    }

    pub fn open_account(&mut self, owner: OwnerId, address: &str, balance: Decimal) {
        self.accounts.insert(
            owner,
            Account {
                owner,
                address: address.to_string(),
            },
        );
        if let Ok(balances) = self.balances.get_mut() {
            balances.insert(owner, balance);
        }
    }

    pub fn balance(&self, owner: OwnerId) -> Option<Decimal> {
        self.balances.lock().ok()?.get(&owner).copied()
    }
}

impl AccountDirectory for InMemoryLedger {
    fn resolve(&self, owner: OwnerId) -> Option<Account> {
        self.accounts.get(&owner).cloned()
    }
}

impl SettlementService for InMemoryLedger {
    fn transfer(&self, from: &Account, to: &Account, amount: Decimal) -> Result<(), SettlementError> {
        let mut balances = self
            .balances
            .lock()
            .map_err(|_| SettlementError::TransferFailed("ledger lock poisoned".to_string()))?;

        let available = balances.get(&from.owner).copied().unwrap_or(Decimal::ZERO);
        if available < amount {
            return Err(SettlementError::InsufficientFunds {
                owner: from.owner,
                required: amount,
                available,
            });
        }

        let credited = balances
            .get(&to.owner)
            .copied()
            .unwrap_or(Decimal::ZERO)
            .checked_add(amount)
            .ok_or_else(|| {
                SettlementError::TransferFailed(format!("balance of {} would overflow", to.owner))
            })?;
        balances.insert(from.owner, available - amount);
        balances.insert(to.owner, credited);
        Ok(())
    }
}
