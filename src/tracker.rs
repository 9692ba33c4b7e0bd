// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Boundary facade for embedding front ends.
//!
//! Mutations never return an error: they report success as a `bool` and keep
//! the failure in [`Tracker::last_error`] until the next mutation. Reads
//! return `Result`, with absent rows as `Ok(None)`.

use std::path::Path;

use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::commands::{
    accounts, categories, currencies, expenses, history, incomes, summary, transfers,
};
use crate::db;
use crate::error::{LedgerError, Result};
use crate::models::{
    Account, AccountItem, CategoryInput, Currency, CurrencySummary, DateWindow, Expense,
    ExpenseCategory, ExpenseInput, ExpenseItem, Income, IncomeInput, IncomeItem, NewAccount,
    NewCurrency, TransactionItem, Transfer, TransferInput, TransferItem,
};

pub struct Tracker {
    conn: Connection,
    last_error: Option<LedgerError>,
}

impl Tracker {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Tracker::new(db::open(path)?))
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Tracker::new(db::open_in_memory()?))
    }

    pub fn new(conn: Connection) -> Self {
        Tracker {
            conn,
            last_error: None,
        }
    }

    /// Failure recorded by the most recent mutation, if it failed.
    pub fn last_error(&self) -> Option<&LedgerError> {
        self.last_error.as_ref()
    }

    fn record<T>(&mut self, op: &'static str, outcome: Result<T>) -> bool {
        match outcome {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(op, error = %e, "ledger operation failed");
                self.last_error = Some(e);
                false
            }
        }
    }

    fn mutate<T>(
        &mut self,
        op: &'static str,
        f: impl FnOnce(&mut Connection) -> Result<T>,
    ) -> bool {
        self.last_error = None;
        let outcome = f(&mut self.conn);
        self.record(op, outcome)
    }

    pub fn add_currency(&mut self, new: &NewCurrency) -> bool {
        self.mutate("add_currency", |c| currencies::add_currency(c, new))
    }

    pub fn update_currency(&mut self, id: i64, new: &NewCurrency) -> bool {
        self.mutate("update_currency", |c| currencies::update_currency(c, id, new))
    }

    pub fn delete_currency(&mut self, id: i64) -> bool {
        self.mutate("delete_currency", |c| currencies::delete_currency(c, id))
    }

    pub fn add_account(&mut self, new: &NewAccount) -> bool {
        self.mutate("add_account", |c| accounts::add_account(c, new))
    }

    pub fn update_account(&mut self, id: i64, new: &NewAccount) -> bool {
        self.mutate("update_account", |c| accounts::update_account(c, id, new))
    }

    pub fn delete_account(&mut self, id: i64) -> bool {
        self.mutate("delete_account", |c| accounts::delete_account(c, id))
    }

    pub fn add_category(&mut self, input: &CategoryInput) -> bool {
        self.mutate("add_category", |c| categories::add_category(c, input))
    }

    pub fn update_category(&mut self, id: i64, input: &CategoryInput) -> bool {
        self.mutate("update_category", |c| categories::update_category(c, id, input))
    }

    pub fn delete_category(&mut self, id: i64) -> bool {
        self.mutate("delete_category", |c| categories::delete_category(c, id))
    }

    pub fn add_income(&mut self, input: &IncomeInput) -> bool {
        self.mutate("add_income", |c| incomes::add_income(c, input))
    }

    pub fn update_income(&mut self, id: i64, input: &IncomeInput) -> bool {
        self.mutate("update_income", |c| incomes::update_income(c, id, input))
    }

    pub fn delete_income(&mut self, id: i64) -> bool {
        self.mutate("delete_income", |c| incomes::delete_income(c, id))
    }

    pub fn add_expense(&mut self, input: &ExpenseInput) -> bool {
        self.mutate("add_expense", |c| expenses::add_expense(c, input))
    }

    pub fn update_expense(&mut self, id: i64, input: &ExpenseInput) -> bool {
        self.mutate("update_expense", |c| expenses::update_expense(c, id, input))
    }

    pub fn delete_expense(&mut self, id: i64) -> bool {
        self.mutate("delete_expense", |c| expenses::delete_expense(c, id))
    }

    pub fn add_transfer(&mut self, input: &TransferInput) -> bool {
        self.mutate("add_transfer", |c| transfers::add_transfer(c, input))
    }

    pub fn update_transfer(&mut self, id: i64, input: &TransferInput) -> bool {
        self.mutate("update_transfer", |c| transfers::update_transfer(c, id, input))
    }

    pub fn delete_transfer(&mut self, id: i64) -> bool {
        self.mutate("delete_transfer", |c| transfers::delete_transfer(c, id))
    }

    pub fn currencies(&self) -> Result<Vec<Currency>> {
        currencies::list_currencies(&self.conn)
    }

    pub fn currency(&self, id: i64) -> Result<Option<Currency>> {
        currencies::get_currency(&self.conn, id)
    }

    pub fn accounts(&self) -> Result<Vec<AccountItem>> {
        accounts::list_accounts(&self.conn)
    }

    pub fn account(&self, id: i64) -> Result<Option<Account>> {
        accounts::get_account(&self.conn, id)
    }

    /// Cached balance; `None` when the account has no balance row.
    pub fn balance(&self, account_id: i64) -> Result<Option<Decimal>> {
        Ok(accounts::get_account_item(&self.conn, account_id)?.map(|a| a.balance))
    }

    pub fn categories(&self) -> Result<Vec<ExpenseCategory>> {
        categories::list_categories(&self.conn)
    }

    pub fn category(&self, id: i64) -> Result<Option<ExpenseCategory>> {
        categories::get_category(&self.conn, id)
    }

    pub fn incomes(&self, window: &DateWindow) -> Result<Vec<IncomeItem>> {
        incomes::list_incomes(&self.conn, window)
    }

    pub fn income(&self, id: i64) -> Result<Option<Income>> {
        incomes::get_income(&self.conn, id)
    }

    pub fn expenses(&self, window: &DateWindow) -> Result<Vec<ExpenseItem>> {
        expenses::list_expenses(&self.conn, window)
    }

    pub fn expense(&self, id: i64) -> Result<Option<Expense>> {
        expenses::get_expense(&self.conn, id)
    }

    pub fn transfers(&self, window: &DateWindow) -> Result<Vec<TransferItem>> {
        transfers::list_transfers(&self.conn, window)
    }

    pub fn transfer(&self, id: i64) -> Result<Option<Transfer>> {
        transfers::get_transfer(&self.conn, id)
    }

    pub fn transaction_history(
        &self,
        account_id: Option<i64>,
        window: &DateWindow,
    ) -> Result<Vec<TransactionItem>> {
        history::transaction_history(&self.conn, account_id, window)
    }

    pub fn expense_summary(&self, window: &DateWindow) -> Result<Vec<CurrencySummary>> {
        summary::expense_summary(&self.conn, window)
    }
}
