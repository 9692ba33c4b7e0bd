// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use coinpurse::commands::{
    accounts, expenses, history, incomes, summary, transfers,
};
use coinpurse::db;
use coinpurse::models::{
    AccountState, AccountType, DateWindow, ExpenseInput, IncomeInput, IncomeSource, NewAccount,
    TransactionKind, TransferInput,
};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

/// USD account A (id 1), EUR account B (id 2) and a small category tree.
fn base_conn() -> Connection {
    let mut conn = db::open_in_memory().unwrap();
    conn.execute_batch(
        r#"
        INSERT INTO currencies(id, code, description, symbol) VALUES
            (1, 'USD', 'US Dollar', '$'),
            (2, 'EUR', 'Euro', '€');
        INSERT INTO expense_categories(id, name, parent_id) VALUES
            (1, 'Food', NULL),
            (2, 'Lunch', 1),
            (3, 'Living', NULL);
        "#,
    )
    .unwrap();
    for (name, currency_id) in [("A", 1), ("B", 2)] {
        accounts::add_account(
            &mut conn,
            &NewAccount {
                name: name.into(),
                r#type: AccountType::Bank,
                state: AccountState::Active,
                currency_id,
            },
        )
        .unwrap();
    }
    conn
}

fn add_income(conn: &mut Connection, account_id: i64, amount: &str, date: &str) -> i64 {
    incomes::add_income(
        conn,
        &IncomeInput {
            account_id,
            source: IncomeSource::Salary,
            amount: dec(amount),
            date: d(date),
        },
    )
    .unwrap()
}

fn add_expense(conn: &mut Connection, account_id: i64, category_id: i64, amount: &str, date: &str) -> i64 {
    expenses::add_expense(
        conn,
        &ExpenseInput {
            account_id,
            category_id,
            amount: dec(amount),
            date: d(date),
        },
    )
    .unwrap()
}

fn add_transfer(conn: &mut Connection, from: i64, to: i64, amount: &str, rate: &str, date: &str) -> i64 {
    transfers::add_transfer(
        conn,
        &TransferInput {
            from_account_id: from,
            to_account_id: to,
            amount: dec(amount),
            conversion_rate: dec(rate),
            date: d(date),
        },
    )
    .unwrap()
}

fn seeded() -> Connection {
    let mut conn = base_conn();
    add_income(&mut conn, 1, "1000", "2025-01-01");
    add_expense(&mut conn, 1, 2, "200", "2025-01-10");
    add_transfer(&mut conn, 1, 2, "300", "1", "2025-02-01");
    add_transfer(&mut conn, 2, 1, "50", "2", "2025-02-15");
    add_income(&mut conn, 1, "10", "2025-03-01");
    conn
}

#[test]
fn window_starts_from_replayed_opening_balance() {
    let conn = seeded();
    let items =
        history::transaction_history(&conn, Some(1), &DateWindow::between(d("2025-02-01"), d("2025-02-28")))
            .unwrap();
    assert_eq!(items.len(), 2);

    assert_eq!(items[0].id, "transfer-2-in");
    assert_eq!(items[0].kind, TransactionKind::TransferIn);
    assert_eq!(items[0].amount, dec("100"));
    assert_eq!(items[0].balance, dec("600"));
    assert_eq!(items[0].description, "From B");

    assert_eq!(items[1].id, "transfer-1-out");
    assert_eq!(items[1].kind, TransactionKind::TransferOut);
    assert_eq!(items[1].amount, dec("-300"));
    assert_eq!(items[1].balance, dec("500"));
    assert_eq!(items[1].description, "To B");

    assert_eq!(
        history::replay_balance(&conn, 1, Some(d("2025-02-01"))).unwrap(),
        dec("800")
    );
}

#[test]
fn full_window_ends_at_the_cached_balance() {
    let conn = seeded();
    let window = DateWindow::between(d("2024-01-01"), d("2030-12-31"));
    for id in [1, 2] {
        let items = history::transaction_history(&conn, Some(id), &window).unwrap();
        let cached = accounts::get_account_item(&conn, id).unwrap().unwrap().balance;
        assert_eq!(items.first().unwrap().balance, cached, "account {}", id);
    }

    let a = history::transaction_history(&conn, Some(1), &window).unwrap();
    let kinds: Vec<&str> = a.iter().map(|t| t.kind.as_str()).collect();
    assert_eq!(
        kinds,
        vec!["Income", "Transfer In", "Transfer Out", "Expense", "Income"]
    );
    assert_eq!(a[3].description, "Food - Lunch");
    assert_eq!(a[3].amount, dec("-200"));
    assert_eq!(a[4].description, "Salary");
    assert_eq!(a[0].balance, dec("610"));
}

#[test]
fn unset_window_or_account_yields_nothing() {
    let conn = seeded();
    let open_end = DateWindow::new(Some(d("2025-01-01")), None);
    assert!(history::transaction_history(&conn, Some(1), &open_end).unwrap().is_empty());
    let window = DateWindow::between(d("2025-01-01"), d("2025-12-31"));
    assert!(history::transaction_history(&conn, None, &window).unwrap().is_empty());
    assert!(history::transaction_history(&conn, Some(1), &DateWindow::default())
        .unwrap()
        .is_empty());
}

#[test]
fn same_day_events_accumulate_in_a_stable_order() {
    let mut conn = base_conn();
    add_income(&mut conn, 1, "100", "2025-05-01");
    add_expense(&mut conn, 1, 1, "30", "2025-05-01");
    add_transfer(&mut conn, 1, 2, "20", "1", "2025-05-01");

    let items =
        history::transaction_history(&conn, Some(1), &DateWindow::between(d("2025-05-01"), d("2025-05-01")))
            .unwrap();
    let balances: Vec<Decimal> = items.iter().map(|t| t.balance).collect();
    assert_eq!(balances, vec![dec("50"), dec("70"), dec("100")]);
}

#[test]
fn lists_follow_the_window_bounds() {
    let conn = seeded();
    assert!(incomes::list_incomes(&conn, &DateWindow::default()).unwrap().is_empty());

    let since_feb = DateWindow::new(Some(d("2025-02-01")), None);
    let incomes = incomes::list_incomes(&conn, &since_feb).unwrap();
    assert_eq!(incomes.len(), 1);
    assert_eq!(incomes[0].income.amount, dec("10"));
    assert_eq!(incomes[0].account_name, "A");
    assert_eq!(incomes[0].currency.code, "USD");

    let until_jan = DateWindow::new(None, Some(d("2025-01-31")));
    let expenses = expenses::list_expenses(&conn, &until_jan).unwrap();
    assert_eq!(expenses.len(), 1);
    assert_eq!(expenses[0].category_name, "Food - Lunch");

    let all = DateWindow::between(d("2025-01-01"), d("2025-12-31"));
    let transfers = transfers::list_transfers(&conn, &all).unwrap();
    let ids: Vec<i64> = transfers.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![2, 1]);
    assert_eq!(transfers[0].from_account.name, "B");
    assert_eq!(transfers[0].from_account.currency.code, "EUR");
    assert_eq!(transfers[0].to_account.currency.symbol, "$");
    assert_eq!(transfers[0].conversion_rate, dec("2"));
}

#[test]
fn summary_groups_by_currency_and_top_level_category() {
    let mut conn = base_conn();
    add_expense(&mut conn, 1, 2, "20", "2025-04-02");
    add_expense(&mut conn, 1, 1, "5", "2025-04-03");
    add_expense(&mut conn, 1, 3, "100", "2025-04-04");
    add_expense(&mut conn, 2, 2, "7", "2025-04-05");
    add_expense(&mut conn, 1, 3, "999", "2025-05-01");

    let window = DateWindow::between(d("2025-04-01"), d("2025-04-30"));
    let data = summary::expense_summary(&conn, &window).unwrap();
    assert_eq!(data.len(), 2);

    assert_eq!(data[0].currency_code, "EUR");
    assert_eq!(data[0].total_expense, dec("7"));
    assert_eq!(data[0].categories.len(), 1);
    assert_eq!(data[0].categories[0].category_name, "Food");

    assert_eq!(data[1].currency_code, "USD");
    assert_eq!(data[1].currency_symbol, "$");
    assert_eq!(data[1].total_expense, dec("125"));
    let names: Vec<(&str, Decimal)> = data[1]
        .categories
        .iter()
        .map(|c| (c.category_name.as_str(), c.total))
        .collect();
    assert_eq!(names, vec![("Living", dec("100")), ("Food", dec("25"))]);

    let half_open = DateWindow::new(Some(d("2025-04-01")), None);
    assert!(summary::expense_summary(&conn, &half_open).unwrap().is_empty());
}
