// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{LedgerError, Result};
use crate::ledger;
use crate::models::{CurrencyInfo, DateWindow, Transfer, TransferInput, TransferItem, TransferSide};
use crate::utils::{
    date_arg, decimal_text, fmt_money, get_decimal, id_for_account, maybe_print_json,
    parse_date, parse_decimal, pretty_table, window_args,
};
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params, params_from_iter};
use rust_decimal::Decimal;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> anyhow::Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let input = TransferInput {
                from_account_id: id_for_account(conn, sub.get_one::<String>("from").unwrap())?,
                to_account_id: id_for_account(conn, sub.get_one::<String>("to").unwrap())?,
                amount: parse_decimal(sub.get_one::<String>("amount").unwrap())?,
                conversion_rate: match sub.get_one::<String>("rate") {
                    Some(r) => parse_decimal(r)?,
                    None => Decimal::ONE,
                },
                date: date_arg(sub)?,
            };
            let id = add_transfer(conn, &input)?;
            println!(
                "Recorded transfer #{}: {} out, {} in",
                id,
                input.amount,
                input.credited()?
            );
        }
        Some(("list", sub)) => list(conn, sub)?,
        Some(("update", sub)) => {
            let id = sub.get_one::<String>("id").unwrap().trim().parse::<i64>()?;
            let current = get_transfer(conn, id)?.ok_or(LedgerError::not_found("Transfer", id))?;
            let mut input = TransferInput {
                from_account_id: current.from_account_id,
                to_account_id: current.to_account_id,
                amount: current.amount,
                conversion_rate: current.conversion_rate,
                date: current.date,
            };
            if let Some(a) = sub.get_one::<String>("from") {
                input.from_account_id = id_for_account(conn, a)?;
            }
            if let Some(a) = sub.get_one::<String>("to") {
                input.to_account_id = id_for_account(conn, a)?;
            }
            if let Some(a) = sub.get_one::<String>("amount") {
                input.amount = parse_decimal(a)?;
            }
            if let Some(r) = sub.get_one::<String>("rate") {
                input.conversion_rate = parse_decimal(r)?;
            }
            if let Some(d) = sub.get_one::<String>("date") {
                input.date = parse_date(d)?;
            }
            update_transfer(conn, id, &input)?;
            println!("Updated transfer #{}", id);
        }
        Some(("rm", sub)) => {
            let id = sub.get_one::<String>("id").unwrap().trim().parse::<i64>()?;
            delete_transfer(conn, id)?;
            println!("Removed transfer #{}", id);
        }
        _ => {}
    }
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> anyhow::Result<()> {
    let data = list_transfers(conn, &window_args(sub)?)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .into_iter()
            .map(|t| {
                let credited = t
                    .amount
                    .checked_mul(t.conversion_rate)
                    .ok_or_else(LedgerError::out_of_range)?;
                Ok(vec![
                    t.id.to_string(),
                    t.date.to_string(),
                    t.from_account.name,
                    t.to_account.name,
                    fmt_money(&t.amount, &t.from_account.currency.symbol),
                    t.conversion_rate.normalize().to_string(),
                    fmt_money(&credited, &t.to_account.currency.symbol),
                ])
            })
            .collect::<Result<Vec<_>>>()?;
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "From", "To", "Sent", "Rate", "Received"],
                rows
            )
        );
    }
    Ok(())
}

fn transfer_from_row(r: &Row<'_>) -> rusqlite::Result<Transfer> {
    Ok(Transfer {
        id: r.get(0)?,
        from_account_id: r.get(1)?,
        to_account_id: r.get(2)?,
        amount: get_decimal(r, 3)?,
        conversion_rate: get_decimal(r, 4)?,
        date: r.get(5)?,
    })
}

fn read_transfer(conn: &Connection, id: i64) -> Result<Option<Transfer>> {
    let transfer = conn
        .query_row(
            "SELECT id, from_account_id, to_account_id, amount, conversion_rate, date
             FROM transfers WHERE id=?1",
            params![id],
            transfer_from_row,
        )
        .optional()?;
    Ok(transfer)
}

fn apply(tx: &Transaction<'_>, from: i64, to: i64, amount: Decimal, credited: Decimal) -> Result<()> {
    ledger::adjust(tx, from, -amount)?;
    ledger::adjust(tx, to, credited)
}

fn reverse(tx: &Transaction<'_>, transfer: &Transfer) -> Result<()> {
    ledger::adjust(tx, transfer.from_account_id, transfer.amount)?;
    ledger::adjust(tx, transfer.to_account_id, -transfer.credited()?)
}

pub fn add_transfer(conn: &mut Connection, input: &TransferInput) -> Result<i64> {
    input.validate()?;
    let credited = input.credited()?;
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO transfers(from_account_id, to_account_id, amount, conversion_rate, date)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            input.from_account_id,
            input.to_account_id,
            decimal_text(input.amount),
            decimal_text(input.conversion_rate),
            input.date
        ],
    )?;
    let id = tx.last_insert_rowid();
    apply(
        &tx,
        input.from_account_id,
        input.to_account_id,
        input.amount,
        credited,
    )?;
    tx.commit()?;
    tracing::info!(
        id,
        from = input.from_account_id,
        to = input.to_account_id,
        amount = %input.amount,
        rate = %input.conversion_rate,
        "transfer added"
    );
    Ok(id)
}

/// Edits a transfer by fully reversing the stored legs and then applying the
/// new ones against freshly read balances. The row itself is rewritten last,
/// so a rejected reference aborts the whole unit with nothing applied.
pub fn update_transfer(conn: &mut Connection, id: i64, input: &TransferInput) -> Result<()> {
    let tx = conn.transaction()?;
    let old = read_transfer(&tx, id)?.ok_or(LedgerError::not_found("Transfer", id))?;
    input.validate()?;
    let credited = input.credited()?;
    reverse(&tx, &old)?;
    apply(
        &tx,
        input.from_account_id,
        input.to_account_id,
        input.amount,
        credited,
    )?;
    tx.execute(
        "UPDATE transfers SET from_account_id=?1, to_account_id=?2, amount=?3, conversion_rate=?4, date=?5
         WHERE id=?6",
        params![
            input.from_account_id,
            input.to_account_id,
            decimal_text(input.amount),
            decimal_text(input.conversion_rate),
            input.date,
            id
        ],
    )?;
    tx.commit()?;
    tracing::info!(
        id,
        from = input.from_account_id,
        to = input.to_account_id,
        amount = %input.amount,
        "transfer updated"
    );
    Ok(())
}

pub fn delete_transfer(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = conn.transaction()?;
    let transfer = read_transfer(&tx, id)?.ok_or(LedgerError::not_found("Transfer", id))?;
    tx.execute("DELETE FROM transfers WHERE id=?1", params![id])?;
    reverse(&tx, &transfer)?;
    tx.commit()?;
    tracing::info!(id, "transfer deleted");
    Ok(())
}

pub fn get_transfer(conn: &Connection, id: i64) -> Result<Option<Transfer>> {
    read_transfer(conn, id)
}

fn side(r: &Row<'_>, start: usize) -> rusqlite::Result<TransferSide> {
    Ok(TransferSide {
        id: r.get(start)?,
        name: r.get(start + 1)?,
        r#type: r.get(start + 2)?,
        currency: CurrencyInfo {
            code: r.get(start + 3)?,
            symbol: r.get(start + 4)?,
            description: r.get(start + 5)?,
        },
    })
}

/// Transfers inside `window`, newest first, with both accounts resolved.
pub fn list_transfers(conn: &Connection, window: &DateWindow) -> Result<Vec<TransferItem>> {
    let Some((predicate, dates)) = window.predicate("t.date") else {
        return Ok(Vec::new());
    };
    let sql = format!(
        "SELECT t.id, t.amount, t.conversion_rate, t.date,
                fa.id, fa.name, fa.type, fc.code, fc.symbol, fc.description,
                ta.id, ta.name, ta.type, tc.code, tc.symbol, tc.description
         FROM transfers t
         JOIN accounts fa ON fa.id=t.from_account_id
         JOIN currencies fc ON fc.id=fa.currency_id
         JOIN accounts ta ON ta.id=t.to_account_id
         JOIN currencies tc ON tc.id=ta.currency_id
         WHERE {predicate}
         ORDER BY t.date DESC, t.id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(dates), |r| {
        Ok(TransferItem {
            id: r.get(0)?,
            amount: get_decimal(r, 1)?,
            conversion_rate: get_decimal(r, 2)?,
            date: r.get(3)?,
            from_account: side(r, 4)?,
            to_account: side(r, 10)?,
        })
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}
