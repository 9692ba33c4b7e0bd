// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{LedgerError, Result};
use crate::ledger;
use crate::models::{CurrencyInfo, DateWindow, Income, IncomeInput, IncomeItem, IncomeSource};
use crate::utils::{
    date_arg, decimal_text, fmt_money, get_decimal, id_for_account, maybe_print_json,
    parse_date, parse_decimal, pretty_table, window_args,
};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> anyhow::Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let input = IncomeInput {
                account_id: id_for_account(conn, sub.get_one::<String>("account").unwrap())?,
                source: sub.get_one::<String>("source").unwrap().parse::<IncomeSource>()?,
                amount: parse_decimal(sub.get_one::<String>("amount").unwrap())?,
                date: date_arg(sub)?,
            };
            let id = add_income(conn, &input)?;
            println!(
                "Recorded income #{} of {} on {} ({})",
                id, input.amount, input.date, input.source
            );
        }
        Some(("list", sub)) => list(conn, sub)?,
        Some(("update", sub)) => {
            let id = sub.get_one::<String>("id").unwrap().trim().parse::<i64>()?;
            let current = get_income(conn, id)?.ok_or(LedgerError::not_found("Income", id))?;
            let mut input = IncomeInput {
                account_id: current.account_id,
                source: current.source,
                amount: current.amount,
                date: current.date,
            };
            if let Some(a) = sub.get_one::<String>("account") {
                input.account_id = id_for_account(conn, a)?;
            }
            if let Some(s) = sub.get_one::<String>("source") {
                input.source = s.parse::<IncomeSource>()?;
            }
            if let Some(a) = sub.get_one::<String>("amount") {
                input.amount = parse_decimal(a)?;
            }
            if let Some(d) = sub.get_one::<String>("date") {
                input.date = parse_date(d)?;
            }
            update_income(conn, id, &input)?;
            println!("Updated income #{}", id);
        }
        Some(("rm", sub)) => {
            let id = sub.get_one::<String>("id").unwrap().trim().parse::<i64>()?;
            delete_income(conn, id)?;
            println!("Removed income #{}", id);
        }
        _ => {}
    }
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> anyhow::Result<()> {
    let data = list_incomes(conn, &window_args(sub)?)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .into_iter()
            .map(|i| {
                vec![
                    i.income.id.to_string(),
                    i.income.date.to_string(),
                    i.account_name,
                    i.income.source.to_string(),
                    fmt_money(&i.income.amount, &i.currency.symbol),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Date", "Account", "Source", "Amount"], rows)
        );
    }
    Ok(())
}

fn income_from_row(r: &Row<'_>) -> rusqlite::Result<Income> {
    Ok(Income {
        id: r.get(0)?,
        account_id: r.get(1)?,
        source: r.get(2)?,
        amount: get_decimal(r, 3)?,
        date: r.get(4)?,
    })
}

fn read_income(conn: &Connection, id: i64) -> Result<Option<Income>> {
    let income = conn
        .query_row(
            "SELECT id, account_id, source, amount, date FROM incomes WHERE id=?1",
            params![id],
            income_from_row,
        )
        .optional()?;
    Ok(income)
}

pub fn add_income(conn: &mut Connection, input: &IncomeInput) -> Result<i64> {
    input.validate()?;
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO incomes(account_id, source, amount, date) VALUES (?1, ?2, ?3, ?4)",
        params![
            input.account_id,
            input.source,
            decimal_text(input.amount),
            input.date
        ],
    )?;
    let id = tx.last_insert_rowid();
    ledger::adjust(&tx, input.account_id, input.effect())?;
    tx.commit()?;
    tracing::info!(id, account_id = input.account_id, amount = %input.amount, "income added");
    Ok(id)
}

pub fn update_income(conn: &mut Connection, id: i64, input: &IncomeInput) -> Result<()> {
    let tx = conn.transaction()?;
    let old = read_income(&tx, id)?.ok_or(LedgerError::not_found("Income", id))?;
    input.validate()?;
    tx.execute(
        "UPDATE incomes SET account_id=?1, source=?2, amount=?3, date=?4 WHERE id=?5",
        params![
            input.account_id,
            input.source,
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
    tracing::info!(id, account_id = input.account_id, amount = %input.amount, "income updated");
    Ok(())
}

pub fn delete_income(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = conn.transaction()?;
    let income = read_income(&tx, id)?.ok_or(LedgerError::not_found("Income", id))?;
    tx.execute("DELETE FROM incomes WHERE id=?1", params![id])?;
    ledger::adjust(&tx, income.account_id, -income.effect())?;
    tx.commit()?;
    tracing::info!(id, account_id = income.account_id, "income deleted");
    Ok(())
}

pub fn get_income(conn: &Connection, id: i64) -> Result<Option<Income>> {
    read_income(conn, id)
}

/// Incomes inside `window`, newest first. An unset window yields nothing.
pub fn list_incomes(conn: &Connection, window: &DateWindow) -> Result<Vec<IncomeItem>> {
    let Some((predicate, dates)) = window.predicate("i.date") else {
        return Ok(Vec::new());
    };
    let sql = format!(
        "SELECT i.id, i.account_id, i.source, i.amount, i.date, a.name, c.code, c.symbol, c.description
         FROM incomes i
         JOIN accounts a ON a.id=i.account_id
         JOIN currencies c ON c.id=a.currency_id
         WHERE {predicate}
         ORDER BY i.date DESC, i.id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(dates), |r| {
        Ok(IncomeItem {
            income: income_from_row(r)?,
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
