// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::categories::load_tree;
use crate::error::{LedgerError, Result};
use crate::ledger;
use crate::models::{CurrencyInfo, DateWindow, Expense, ExpenseInput, ExpenseItem};
use crate::utils::{
    date_arg, decimal_text, fmt_money, get_decimal, id_for_account, id_for_category,
    maybe_print_json, parse_date, parse_decimal, pretty_table, window_args,
};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> anyhow::Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let input = ExpenseInput {
                account_id: id_for_account(conn, sub.get_one::<String>("account").unwrap())?,
                category_id: id_for_category(conn, sub.get_one::<String>("category").unwrap())?,
                amount: parse_decimal(sub.get_one::<String>("amount").unwrap())?,
                date: date_arg(sub)?,
            };
            let id = add_expense(conn, &input)?;
            println!(
                "Recorded expense #{} of {} on {}",
                id, input.amount, input.date
            );
        }
        Some(("list", sub)) => list(conn, sub)?,
        Some(("update", sub)) => {
            let id = sub.get_one::<String>("id").unwrap().trim().parse::<i64>()?;
            let current = get_expense(conn, id)?.ok_or(LedgerError::not_found("Expense", id))?;
            let mut input = ExpenseInput {
                account_id: current.account_id,
                category_id: current.category_id,
                amount: current.amount,
                date: current.date,
            };
            if let Some(a) = sub.get_one::<String>("account") {
                input.account_id = id_for_account(conn, a)?;
            }
            if let Some(c) = sub.get_one::<String>("category") {
                input.category_id = id_for_category(conn, c)?;
            }
            if let Some(a) = sub.get_one::<String>("amount") {
                input.amount = parse_decimal(a)?;
            }
            if let Some(d) = sub.get_one::<String>("date") {
                input.date = parse_date(d)?;
            }
            update_expense(conn, id, &input)?;
            println!("Updated expense #{}", id);
        }
        Some(("rm", sub)) => {
            let id = sub.get_one::<String>("id").unwrap().trim().parse::<i64>()?;
            delete_expense(conn, id)?;
            println!("Removed expense #{}", id);
        }
        _ => {}
    }
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> anyhow::Result<()> {
    let data = list_expenses(conn, &window_args(sub)?)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .into_iter()
            .map(|e| {
                vec![
                    e.expense.id.to_string(),
                    e.expense.date.to_string(),
                    e.account_name,
                    e.category_name,
                    fmt_money(&e.expense.amount, &e.currency.symbol),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Date", "Account", "Category", "Amount"], rows)
        );
    }
    Ok(())
}

fn expense_from_row(r: &Row<'_>) -> rusqlite::Result<Expense> {
    Ok(Expense {
        id: r.get(0)?,
        account_id: r.get(1)?,
        category_id: r.get(2)?,
        amount: get_decimal(r, 3)?,
        date: r.get(4)?,
    })
}

fn read_expense(conn: &Connection, id: i64) -> Result<Option<Expense>> {
    let expense = conn
        .query_row(
            "SELECT id, account_id, category_id, amount, date FROM expenses WHERE id=?1",
            params![id],
            expense_from_row,
        )
        .optional()?;
    Ok(expense)
}

pub fn add_expense(conn: &mut Connection, input: &ExpenseInput) -> Result<i64> {
    input.validate()?;
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO expenses(account_id, category_id, amount, date) VALUES (?1, ?2, ?3, ?4)",
        params![
            input.account_id,
            input.category_id,
            decimal_text(input.amount),
            input.date
        ],
    )?;
    let id = tx.last_insert_rowid();
    ledger::adjust(&tx, input.account_id, input.effect())?;
    tx.commit()?;
    tracing::info!(id, account_id = input.account_id, amount = %input.amount, "expense added");
    Ok(id)
}

pub fn update_expense(conn: &mut Connection, id: i64, input: &ExpenseInput) -> Result<()> {
    let tx = conn.transaction()?;
    let old = read_expense(&tx, id)?.ok_or(LedgerError::not_found("Expense", id))?;
    input.validate()?;
    tx.execute(
        "UPDATE expenses SET account_id=?1, category_id=?2, amount=?3, date=?4 WHERE id=?5",
        params![
            input.account_id,
            input.category_id,
            decimal_text(input.amount),
            input.date,
            id
        ],
    )?;
    ledger::reassign(
        &tx,
        old.account_id,
        old.effect(),
        input.account_id,
        input.effect(),
    )?;
    tx.commit()?;
    tracing::info!(id, account_id = input.account_id, amount = %input.amount, "expense updated");
    Ok(())
}

pub fn delete_expense(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = conn.transaction()?;
    let expense = read_expense(&tx, id)?.ok_or(LedgerError::not_found("Expense", id))?;
    tx.execute("DELETE FROM expenses WHERE id=?1", params![id])?;
    ledger::adjust(&tx, expense.account_id, -expense.effect())?;
    tx.commit()?;
    tracing::info!(id, account_id = expense.account_id, "expense deleted");
    Ok(())
}

pub fn get_expense(conn: &Connection, id: i64) -> Result<Option<Expense>> {
    read_expense(conn, id)
}

/// Expenses inside `window`, newest first, labelled with full category paths.
pub fn list_expenses(conn: &Connection, window: &DateWindow) -> Result<Vec<ExpenseItem>> {
    let Some((predicate, dates)) = window.predicate("e.date") else {
        return Ok(Vec::new());
    };
    let tree = load_tree(conn)?;
    let sql = format!(
        "SELECT e.id, e.account_id, e.category_id, e.amount, e.date, a.name, c.code, c.symbol, c.description
         FROM expenses e
         JOIN accounts a ON a.id=e.account_id
         JOIN currencies c ON c.id=a.currency_id
         WHERE {predicate}
         ORDER BY e.date DESC, e.id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(dates), |r| {
        let expense = expense_from_row(r)?;
        Ok(ExpenseItem {
            category_name: tree.full_name(expense.category_id).to_string(),
            expense,
            account_name: r.get(5)?,
            currency: CurrencyInfo {
                code: r.get(6)?,
                symbol: r.get(7)?,
                description: r.get(8)?,
            },
        })
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}
