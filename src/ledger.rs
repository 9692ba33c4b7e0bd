// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Cached per-account balances.
//!
//! Every balance write in the crate goes through this module, and every
//! function takes the caller's open [`Transaction`]: the ledger never commits
//! on its own, so a failing operation rolls its balance writes back together
//! with the row changes that caused them.

use rusqlite::{OptionalExtension, Transaction, params};
use rust_decimal::Decimal;

use crate::error::{LedgerError, Result};
use crate::utils::{decimal_text, get_decimal};

/// Creates the zero balance that accompanies a new account.
pub fn open(tx: &Transaction<'_>, account_id: i64) -> Result<()> {
    tx.execute(
        "INSERT INTO balances(account_id, amount) VALUES (?1, '0')",
        params![account_id],
    )?;
    Ok(())
}

/// Removes the balance row; callers delete the account right after.
pub fn close(tx: &Transaction<'_>, account_id: i64) -> Result<()> {
    tx.execute("DELETE FROM balances WHERE account_id=?1", params![account_id])?;
    Ok(())
}

/// Current cached amount. A missing row reads as zero.
pub fn read(tx: &Transaction<'_>, account_id: i64) -> Result<Decimal> {
    let amount = tx
        .query_row(
            "SELECT amount FROM balances WHERE account_id=?1",
            params![account_id],
            |r| get_decimal(r, 0),
        )
        .optional()?;
    Ok(amount.unwrap_or(Decimal::ZERO))
}

/// Adds `delta` to the account's balance, reading the value current inside
/// `tx` so earlier writes in the same transaction are observed.
pub fn adjust(tx: &Transaction<'_>, account_id: i64, delta: Decimal) -> Result<()> {
    let current = read(tx, account_id)?;
    let next = current
        .checked_add(delta)
        .ok_or_else(LedgerError::out_of_range)?;
    let updated = tx.execute(
        "UPDATE balances SET amount=?1 WHERE account_id=?2",
        params![decimal_text(next), account_id],
    )?;
    if updated == 0 {
        tracing::warn!(account_id, %delta, "no balance row to adjust");
    } else {
        tracing::debug!(account_id, %current, %delta, %next, "balance adjusted");
    }
    Ok(())
}

/// Moves a record's contribution when it is edited.
///
/// With the same account on both sides the balance moves once, by the
/// difference between the new and the old effect. Otherwise the old effect
/// is reversed on the old account and the new one applied on the new account.
pub fn reassign(
    tx: &Transaction<'_>,
    old_account: i64,
    old_effect: Decimal,
    new_account: i64,
    new_effect: Decimal,
) -> Result<()> {
    if old_account == new_account {
        let difference = new_effect
            .checked_sub(old_effect)
            .ok_or_else(LedgerError::out_of_range)?;
        if !difference.is_zero() {
            adjust(tx, new_account, difference)?;
        }
        return Ok(());
    }
    adjust(tx, old_account, -old_effect)?;
    adjust(tx, new_account, new_effect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn setup() -> rusqlite::Connection {
        let conn = db::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO currencies(id, code, description, symbol) VALUES (1, 'USD', 'US Dollar', '$');
            INSERT INTO accounts(id, type, currency_id, name) VALUES (1, 'Bank', 1, 'A'), (2, 'Cash', 1, 'B');
            INSERT INTO balances(account_id, amount) VALUES (1, '100'), (2, '0');
            "#,
        )
        .unwrap();
        conn
    }

    #[test]
    fn adjust_reads_inside_transaction() {
        let mut conn = setup();
        let tx = conn.transaction().unwrap();
        adjust(&tx, 1, Decimal::new(-30, 0)).unwrap();
        adjust(&tx, 1, Decimal::new(5, 0)).unwrap();
        assert_eq!(read(&tx, 1).unwrap(), Decimal::new(75, 0));
        tx.commit().unwrap();
    }

    #[test]
    fn missing_balance_reads_zero_and_adjust_is_tolerated() {
        let mut conn = setup();
        let tx = conn.transaction().unwrap();
        assert_eq!(read(&tx, 42).unwrap(), Decimal::ZERO);
        adjust(&tx, 42, Decimal::ONE).unwrap();
        assert_eq!(read(&tx, 42).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn reassign_same_account_applies_difference_once() {
        let mut conn = setup();
        let tx = conn.transaction().unwrap();
        // expense edited from 20 to 50
        reassign(&tx, 1, Decimal::new(-20, 0), 1, Decimal::new(-50, 0)).unwrap();
        assert_eq!(read(&tx, 1).unwrap(), Decimal::new(70, 0));
    }

    #[test]
    fn reassign_across_accounts_reverses_then_applies() {
        let mut conn = setup();
        let tx = conn.transaction().unwrap();
        // income of 40 moved from account 1 to account 2 and raised to 45
        reassign(&tx, 1, Decimal::new(40, 0), 2, Decimal::new(45, 0)).unwrap();
        assert_eq!(read(&tx, 1).unwrap(), Decimal::new(60, 0));
        assert_eq!(read(&tx, 2).unwrap(), Decimal::new(45, 0));
    }

    #[test]
    fn overflowing_adjust_is_invalid_and_leaves_balance() {
        let mut conn = setup();
        let tx = conn.transaction().unwrap();
        assert!(matches!(
            adjust(&tx, 1, Decimal::MAX),
            Err(LedgerError::Invalid(_))
        ));
        assert_eq!(read(&tx, 1).unwrap(), Decimal::new(100, 0));
    }

    #[test]
    fn dropped_transaction_discards_adjustments() {
        let mut conn = setup();
        {
            let tx = conn.transaction().unwrap();
            adjust(&tx, 1, Decimal::new(-100, 0)).unwrap();
        }
        let tx = conn.transaction().unwrap();
        assert_eq!(read(&tx, 1).unwrap(), Decimal::new(100, 0));
    }
}
