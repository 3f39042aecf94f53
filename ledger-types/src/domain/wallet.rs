//! Wallet domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::money::{Currency, Money};
use super::owner::OwnerId;
use crate::error::DomainError;

/// The authoritative current balance for one owner.
///
/// Exactly one wallet exists per owner; it is created lazily on the first
/// money movement and mutated only through ledger-producing operations, so
/// the balance is always reconstructible by replaying the owner's
/// completed transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub owner_id: OwnerId,
    pub balance: Money,
    pub created_at: DateTime<Utc>,
}

impl Wallet {
    /// Creates an empty wallet for the owner.
    pub fn new(owner_id: OwnerId, currency: Currency) -> Self {
        Self {
            owner_id,
            balance: Money::zero(currency),
            created_at: Utc::now(),
        }
    }

    /// Reconstructs a wallet from database fields.
    pub fn from_parts(owner_id: OwnerId, balance: Money, created_at: DateTime<Utc>) -> Self {
        Self {
            owner_id,
            balance,
            created_at,
        }
    }

    /// Returns the currency of this wallet.
    pub fn currency(&self) -> Currency {
        self.balance.currency()
    }

    /// Credits (adds) money to the wallet.
    pub fn credit(&mut self, amount: Money) -> Result<(), DomainError> {
        self.balance = self.balance.checked_add(amount)?;
        Ok(())
    }

    /// Debits (subtracts) money from the wallet.
    pub fn debit(&mut self, amount: Money) -> Result<(), DomainError> {
        self.balance = self.balance.checked_sub(amount)?;
        Ok(())
    }

    /// Checks if the wallet can fund a debit.
    pub fn has_sufficient_funds(&self, amount: &Money) -> bool {
        self.balance.currency() == amount.currency() && self.balance.gte(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_starts_empty() {
        let wallet = Wallet::new(OwnerId::new(), Currency::USD);
        assert_eq!(wallet.balance.amount(), 0);
        assert_eq!(wallet.currency(), Currency::USD);
    }

    #[test]
    fn test_credit_then_debit() {
        let mut wallet = Wallet::new(OwnerId::new(), Currency::USD);
        wallet.credit(Money::new(9000, Currency::USD).unwrap()).unwrap();
        wallet.debit(Money::new(2500, Currency::USD).unwrap()).unwrap();
        assert_eq!(wallet.balance.amount(), 6500);
    }

    #[test]
    fn test_overdraft_rejected() {
        let mut wallet = Wallet::new(OwnerId::new(), Currency::USD);
        wallet.credit(Money::new(100, Currency::USD).unwrap()).unwrap();
        let result = wallet.debit(Money::new(200, Currency::USD).unwrap());
        assert!(matches!(result, Err(DomainError::InsufficientFunds { .. })));
    }
}
