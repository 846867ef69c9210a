//! Ledger store: per-owner balance and inventory rows
//!
//! Rows are created lazily at zero, never deleted, and mutated only through
//! a [`LedgerTxn`]. A transaction stages signed deltas and commits them
//! all-or-nothing: every touched row is locked in ascending [`RowKey`] order,
//! every resulting value is checked non-negative, and only then are the
//! deltas applied. Dropping a transaction without committing applies nothing.
//!
//! The non-negativity check at commit is the sole admission gate for any
//! outgoing transfer.

use dashmap::DashMap;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use types::ids::{CurrencyCode, ItemId, LocationId, OwnerId};
use types::numeric::Quantity;

/// Key of one lockable ledger row
///
/// The `Ord` impl defines the fixed global acquisition order for row locks;
/// committing transactions lock rows in ascending key order regardless of
/// buyer/seller roles, so overlapping settlements cannot deadlock.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RowKey {
    /// Available funds of one owner in one currency
    Balance {
        owner: OwnerId,
        currency: CurrencyCode,
    },
    /// Available stock of one item held by one owner at one location
    Inventory {
        owner: OwnerId,
        location: LocationId,
        item: ItemId,
    },
}

/// Ledger-internal failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    /// A debit would drive the row negative; nothing was applied
    #[error("Insufficient resource on {key:?}: required {required}, available {available}")]
    InsufficientResource {
        key: RowKey,
        required: Decimal,
        available: Decimal,
    },
}

/// Concurrent store of balance and inventory rows
///
/// Inventory rows hold integral decimals; the typed [`Quantity`] boundary is
/// enforced at the accessors. A single value representation lets one
/// transaction lock any mix of rows in one sorted acquisition pass.
pub struct LedgerStore {
    rows: DashMap<RowKey, Arc<Mutex<Decimal>>>,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
        }
    }

    /// Row handle for `key`, creating a zero row if none exists
    fn row(&self, key: &RowKey) -> Arc<Mutex<Decimal>> {
        self.rows
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(Decimal::ZERO)))
            .clone()
    }

    /// Begin an empty transaction against this store
    pub fn begin(&self) -> LedgerTxn<'_> {
        LedgerTxn {
            store: self,
            deltas: BTreeMap::new(),
        }
    }

    fn read(&self, key: &RowKey) -> Decimal {
        let row = self.row(key);
        let value = row.lock().expect("ledger row lock poisoned");
        *value
    }

    /// Current available funds of `owner` in `currency`
    pub fn balance(&self, owner: OwnerId, currency: CurrencyCode) -> Decimal {
        self.read(&RowKey::Balance { owner, currency })
    }

    /// Current available stock of `item` held by `owner` at `location`
    pub fn stock(&self, owner: OwnerId, location: LocationId, item: ItemId) -> Quantity {
        let value = self.read(&RowKey::Inventory {
            owner,
            location,
            item,
        });
        integral_quantity(value)
    }

    /// Credit funds into a balance row (deposits from the excluded game
    /// systems; also used to seed tests)
    ///
    /// # Panics
    /// Panics if `amount` is negative
    pub fn deposit(&self, owner: OwnerId, currency: CurrencyCode, amount: Decimal) {
        assert!(amount >= Decimal::ZERO, "deposit must be non-negative");
        let row = self.row(&RowKey::Balance { owner, currency });
        let mut value = row.lock().expect("ledger row lock poisoned");
        *value += amount;
    }

    /// Credit stock into an inventory row (production, cargo unloads)
    pub fn grant_stock(
        &self,
        owner: OwnerId,
        location: LocationId,
        item: ItemId,
        quantity: Quantity,
    ) {
        let row = self.row(&RowKey::Inventory {
            owner,
            location,
            item,
        });
        let mut value = row.lock().expect("ledger row lock poisoned");
        *value += quantity.as_decimal();
    }
}

impl Default for LedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped multi-row transaction
///
/// Deltas accumulate per row; `commit` applies them atomically. No lock is
/// taken before `commit`, so building a transaction never blocks.
pub struct LedgerTxn<'a> {
    store: &'a LedgerStore,
    deltas: BTreeMap<RowKey, Decimal>,
}

impl LedgerTxn<'_> {
    /// Stage a credit to `key`
    ///
    /// # Panics
    /// Panics if `amount` is negative
    pub fn credit(&mut self, key: RowKey, amount: Decimal) {
        assert!(amount >= Decimal::ZERO, "credit must be non-negative");
        *self.deltas.entry(key).or_insert(Decimal::ZERO) += amount;
    }

    /// Stage a debit from `key`
    ///
    /// # Panics
    /// Panics if `amount` is negative
    pub fn debit(&mut self, key: RowKey, amount: Decimal) {
        assert!(amount >= Decimal::ZERO, "debit must be non-negative");
        *self.deltas.entry(key).or_insert(Decimal::ZERO) -= amount;
    }

    /// True if no deltas are staged
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Commit all staged deltas atomically
    ///
    /// Locks every touched row in ascending key order, verifies no row goes
    /// negative, then applies every delta while still holding all guards.
    /// On error nothing is applied.
    pub fn commit(self) -> Result<(), LedgerError> {
        // BTreeMap iteration gives the global ascending lock order.
        let rows: Vec<(RowKey, Decimal, Arc<Mutex<Decimal>>)> = self
            .deltas
            .iter()
            .map(|(key, delta)| (key.clone(), *delta, self.store.row(key)))
            .collect();

        let mut guards = Vec::with_capacity(rows.len());
        for (_, _, row) in &rows {
            guards.push(row.lock().expect("ledger row lock poisoned"));
        }

        for (i, (key, delta, _)) in rows.iter().enumerate() {
            let next = *guards[i] + *delta;
            if next < Decimal::ZERO {
                return Err(LedgerError::InsufficientResource {
                    key: key.clone(),
                    required: -*delta,
                    available: *guards[i],
                });
            }
        }

        for (i, (_, delta, _)) in rows.iter().enumerate() {
            *guards[i] += *delta;
        }

        Ok(())
    }
}

/// Convert an inventory row value back to a whole-unit quantity
///
/// Inventory rows only ever receive integral deltas, so the conversion is
/// lossless.
pub(crate) fn integral_quantity(value: Decimal) -> Quantity {
    use rust_decimal::prelude::ToPrimitive;
    debug_assert!(value.fract().is_zero(), "inventory row must stay integral");
    Quantity::new(value.to_u64().unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cred() -> CurrencyCode {
        CurrencyCode::new("CRED")
    }

    #[test]
    fn test_rows_created_lazily_at_zero() {
        let ledger = LedgerStore::new();
        let owner = OwnerId::new();
        assert_eq!(ledger.balance(owner, cred()), Decimal::ZERO);
        assert_eq!(
            ledger.stock(owner, LocationId::new(1), ItemId::new(2)),
            Quantity::zero()
        );
    }

    #[test]
    fn test_deposit_and_debit() {
        let ledger = LedgerStore::new();
        let owner = OwnerId::new();
        ledger.deposit(owner, cred(), Decimal::from(1000));

        let mut txn = ledger.begin();
        txn.debit(
            RowKey::Balance {
                owner,
                currency: cred(),
            },
            Decimal::from(250),
        );
        txn.commit().unwrap();

        assert_eq!(ledger.balance(owner, cred()), Decimal::from(750));
    }

    #[test]
    fn test_overdraft_rejected_with_nothing_applied() {
        let ledger = LedgerStore::new();
        let payer = OwnerId::new();
        let payee = OwnerId::new();
        ledger.deposit(payer, cred(), Decimal::from(100));

        // Debit exceeds funds; the staged credit must not land either.
        let mut txn = ledger.begin();
        txn.debit(
            RowKey::Balance {
                owner: payer,
                currency: cred(),
            },
            Decimal::from(150),
        );
        txn.credit(
            RowKey::Balance {
                owner: payee,
                currency: cred(),
            },
            Decimal::from(150),
        );
        let err = txn.commit().unwrap_err();

        assert!(matches!(
            err,
            LedgerError::InsufficientResource { required, available, .. }
                if required == Decimal::from(150) && available == Decimal::from(100)
        ));
        assert_eq!(ledger.balance(payer, cred()), Decimal::from(100));
        assert_eq!(ledger.balance(payee, cred()), Decimal::ZERO);
    }

    #[test]
    fn test_deltas_merge_per_row() {
        let ledger = LedgerStore::new();
        let owner = OwnerId::new();
        ledger.deposit(owner, cred(), Decimal::from(100));

        // Debit 100 and credit 40 on the same row nets to -60, which fits.
        let key = RowKey::Balance {
            owner,
            currency: cred(),
        };
        let mut txn = ledger.begin();
        txn.debit(key.clone(), Decimal::from(100));
        txn.credit(key, Decimal::from(40));
        txn.commit().unwrap();

        assert_eq!(ledger.balance(owner, cred()), Decimal::from(40));
    }

    #[test]
    fn test_drop_without_commit_applies_nothing() {
        let ledger = LedgerStore::new();
        let owner = OwnerId::new();
        ledger.deposit(owner, cred(), Decimal::from(100));

        {
            let mut txn = ledger.begin();
            txn.debit(
                RowKey::Balance {
                    owner,
                    currency: cred(),
                },
                Decimal::from(50),
            );
            // dropped here
        }

        assert_eq!(ledger.balance(owner, cred()), Decimal::from(100));
    }

    #[test]
    fn test_mixed_balance_and_inventory_commit() {
        let ledger = LedgerStore::new();
        let owner = OwnerId::new();
        let location = LocationId::new(4);
        let item = ItemId::new(9);
        ledger.grant_stock(owner, location, item, Quantity::new(10));

        let mut txn = ledger.begin();
        txn.debit(
            RowKey::Inventory {
                owner,
                location,
                item,
            },
            Decimal::from(4),
        );
        txn.credit(
            RowKey::Balance {
                owner,
                currency: cred(),
            },
            Decimal::from(200),
        );
        txn.commit().unwrap();

        assert_eq!(ledger.stock(owner, location, item), Quantity::new(6));
        assert_eq!(ledger.balance(owner, cred()), Decimal::from(200));
    }

    #[test]
    fn test_row_key_ordering_is_stable() {
        let a = OwnerId::new();
        let b = OwnerId::new();
        let k1 = RowKey::Balance {
            owner: a.min(b),
            currency: cred(),
        };
        let k2 = RowKey::Balance {
            owner: a.max(b),
            currency: cred(),
        };
        assert!(k1 < k2);
        // Balance rows always sort before inventory rows.
        let k3 = RowKey::Inventory {
            owner: a.min(b),
            location: LocationId::new(0),
            item: ItemId::new(0),
        };
        assert!(k1 < k3);
        assert!(k2 < k3);
    }
}
