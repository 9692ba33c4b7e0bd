// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use coinpurse::models::{
    AccountState, AccountType, CategoryInput, DateWindow, ExpenseInput, IncomeInput, IncomeSource,
    NewAccount, NewCurrency, TransferInput,
};
use coinpurse::{LedgerError, Tracker};
use rust_decimal::Decimal;
use tempfile::tempdir;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
}

fn usd() -> NewCurrency {
    NewCurrency {
        code: "USD".into(),
        description: "US Dollar".into(),
        symbol: "$".into(),
    }
}

fn account(name: &str, currency_id: i64) -> NewAccount {
    NewAccount {
        name: name.into(),
        r#type: AccountType::Bank,
        state: AccountState::Active,
        currency_id,
    }
}

#[test]
fn mutations_report_bool_and_keep_last_error() {
    let mut t = Tracker::in_memory().unwrap();
    assert!(t.add_currency(&usd()));
    let usd_id = t.currencies().unwrap()[0].id;
    assert!(t.add_account(&account("Checking", usd_id)));
    assert!(t.last_error().is_none());

    assert!(!t.delete_currency(usd_id));
    match t.last_error() {
        Some(LedgerError::ReferentialConflict(msg)) => {
            assert_eq!(msg, "Cannot delete currency: it is used by one or more accounts.")
        }
        other => panic!("unexpected last error: {:?}", other),
    }
    assert!(t.currency(usd_id).unwrap().is_some());

    // the next mutation starts with a clean slate
    assert!(t.add_category(&CategoryInput {
        name: "Food".into(),
        parent_id: None,
    }));
    assert!(t.last_error().is_none());

    let bogus = IncomeInput {
        account_id: 1,
        source: IncomeSource::Interest,
        amount: Decimal::ONE,
        date: day(1),
    };
    assert!(!t.update_income(404, &bogus));
    assert!(matches!(
        t.last_error(),
        Some(LedgerError::NotFound { entity: "Income", id: 404 })
    ));
    assert!(!t.delete_transfer(404));
    assert_eq!(t.last_error().unwrap().to_string(), "Transfer 404 not found");
}

#[test]
fn facade_reads_reflect_ledger_writes() {
    let mut t = Tracker::in_memory().unwrap();
    assert!(t.add_currency(&usd()));
    assert!(t.add_account(&account("A", 1)));
    assert!(t.add_account(&account("B", 1)));
    assert!(t.add_category(&CategoryInput {
        name: "Food".into(),
        parent_id: None,
    }));

    assert!(t.add_income(&IncomeInput {
        account_id: 1,
        source: IncomeSource::Salary,
        amount: Decimal::new(500, 0),
        date: day(1),
    }));
    assert!(t.add_expense(&ExpenseInput {
        account_id: 1,
        category_id: 1,
        amount: Decimal::new(120, 0),
        date: day(2),
    }));
    let move_out = TransferInput {
        from_account_id: 1,
        to_account_id: 2,
        amount: Decimal::new(80, 0),
        conversion_rate: Decimal::ONE,
        date: day(3),
    };
    assert!(t.add_transfer(&move_out));
    assert!(!t.add_transfer(&TransferInput {
        to_account_id: 1,
        ..move_out.clone()
    }));
    assert!(matches!(t.last_error(), Some(LedgerError::Invalid(_))));

    assert_eq!(t.balance(1).unwrap(), Some(Decimal::new(300, 0)));
    assert_eq!(t.balance(2).unwrap(), Some(Decimal::new(80, 0)));
    assert_eq!(t.balance(3).unwrap(), None);
    assert_eq!(t.income(1).unwrap().unwrap().amount, Decimal::new(500, 0));
    assert_eq!(t.expense(1).unwrap().unwrap().category_id, 1);
    assert_eq!(t.transfer(1).unwrap().unwrap().to_account_id, 2);
    assert!(t.transfer(2).unwrap().is_none());
    assert_eq!(t.category(1).unwrap().unwrap().name, "Food");

    let june = DateWindow::between(day(1), day(30));
    assert_eq!(t.incomes(&june).unwrap().len(), 1);
    assert_eq!(t.expenses(&june).unwrap()[0].category_name, "Food");
    assert_eq!(t.transfers(&june).unwrap().len(), 1);
    let history = t.transaction_history(Some(1), &june).unwrap();
    assert_eq!(history[0].balance, Decimal::new(300, 0));
    assert!(t.transaction_history(None, &june).unwrap().is_empty());
    assert_eq!(t.expense_summary(&june).unwrap()[0].total_expense, Decimal::new(120, 0));

    assert!(!t.delete_account(1));
    assert!(matches!(t.last_error(), Some(LedgerError::ReferentialConflict(_))));
    assert_eq!(t.accounts().unwrap().len(), 2);
}

#[test]
fn file_store_is_seeded_once() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("ledger.sqlite");
    {
        let t = Tracker::open(&path).unwrap();
        assert_eq!(t.currencies().unwrap().len(), 10);
        let food = t
            .categories()
            .unwrap()
            .into_iter()
            .find(|c| c.name == "Lunch")
            .unwrap();
        assert!(food.parent_id.is_some());
    }
    let mut t = Tracker::open(&path).unwrap();
    assert_eq!(t.currencies().unwrap().len(), 10);
    assert!(t.add_account(&account("Wallet", 1)));
    drop(t);

    let t = Tracker::open(&path).unwrap();
    assert_eq!(t.accounts().unwrap()[0].account.name, "Wallet");
    assert_eq!(t.account(1).unwrap().unwrap().state, AccountState::Active);
}
