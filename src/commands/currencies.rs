// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{LedgerError, Result};
use crate::models::{Currency, NewCurrency};
use crate::utils::{id_for_currency, maybe_print_json, pretty_table};
use rusqlite::{Connection, OptionalExtension, Row, params};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> anyhow::Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let new = currency_args(sub);
            let id = add_currency(conn, &new)?;
            println!("Added currency {} ({}) as #{}", new.code, new.symbol, id);
        }
        Some(("list", sub)) => {
            let data = list_currencies(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .into_iter()
                    .map(|c| vec![c.id.to_string(), c.code, c.symbol, c.description])
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Code", "Symbol", "Description"], rows)
                );
            }
        }
        Some(("update", sub)) => {
            let id = id_for_currency(conn, sub.get_one::<String>("id").unwrap())?;
            let new = currency_args(sub);
            update_currency(conn, id, &new)?;
            println!("Updated currency #{}", id);
        }
        Some(("rm", sub)) => {
            let id = id_for_currency(conn, sub.get_one::<String>("id").unwrap())?;
            delete_currency(conn, id)?;
            println!("Removed currency #{}", id);
        }
        _ => {}
    }
    Ok(())
}

fn currency_args(sub: &clap::ArgMatches) -> NewCurrency {
    NewCurrency {
        code: sub.get_one::<String>("code").unwrap().trim().to_uppercase(),
        description: sub.get_one::<String>("description").unwrap().trim().to_string(),
        symbol: sub.get_one::<String>("symbol").unwrap().trim().to_string(),
    }
}

fn currency_from_row(r: &Row<'_>) -> rusqlite::Result<Currency> {
    Ok(Currency {
        id: r.get(0)?,
        code: r.get(1)?,
        description: r.get(2)?,
        symbol: r.get(3)?,
    })
}

pub fn add_currency(conn: &Connection, new: &NewCurrency) -> Result<i64> {
    conn.execute(
        "INSERT INTO currencies(code, description, symbol) VALUES (?1, ?2, ?3)",
        params![new.code, new.description, new.symbol],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(id, code = %new.code, "currency added");
    Ok(id)
}

pub fn update_currency(conn: &Connection, id: i64, new: &NewCurrency) -> Result<()> {
    let updated = conn.execute(
        "UPDATE currencies SET code=?1, description=?2, symbol=?3 WHERE id=?4",
        params![new.code, new.description, new.symbol, id],
    )?;
    if updated == 0 {
        return Err(LedgerError::not_found("Currency", id));
    }
    tracing::info!(id, "currency updated");
    Ok(())
}

/// Refuses while any account is denominated in the currency.
pub fn delete_currency(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = conn.transaction()?;
    let used: i64 = tx.query_row(
        "SELECT COUNT(*) FROM accounts WHERE currency_id=?1",
        params![id],
        |r| r.get(0),
    )?;
    if used > 0 {
        return Err(LedgerError::conflict(
            "Cannot delete currency: it is used by one or more accounts.",
        ));
    }
    let deleted = tx.execute("DELETE FROM currencies WHERE id=?1", params![id])?;
    if deleted == 0 {
        return Err(LedgerError::not_found("Currency", id));
    }
    tx.commit()?;
    tracing::info!(id, "currency deleted");
    Ok(())
}

pub fn get_currency(conn: &Connection, id: i64) -> Result<Option<Currency>> {
    let currency = conn
        .query_row(
            "SELECT id, code, description, symbol FROM currencies WHERE id=?1",
            params![id],
            currency_from_row,
        )
        .optional()?;
    Ok(currency)
}

pub fn list_currencies(conn: &Connection) -> Result<Vec<Currency>> {
    let mut stmt = conn.prepare("SELECT id, code, description, symbol FROM currencies ORDER BY id")?;
    let rows = stmt.query_map([], currency_from_row)?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}
