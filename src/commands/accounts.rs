// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{LedgerError, Result};
use crate::ledger;
use crate::models::{Account, AccountItem, AccountState, AccountType, CurrencyInfo, NewAccount};
use crate::utils::{
    fmt_money, get_decimal, id_for_account, id_for_currency, maybe_print_json, pretty_table,
};
use anyhow::Context;
use rusqlite::{Connection, OptionalExtension, Row, params};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> anyhow::Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let new = account_args(conn, sub)?;
            let id = add_account(conn, &new)?;
            println!(
                "Added account '{}' ({}, {}) as #{}",
                new.name, new.r#type, new.state, id
            );
        }
        Some(("list", sub)) => {
            let data = list_accounts(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
                let rows = data
                    .into_iter()
                    .map(|a| {
                        vec![
                            a.account.id.to_string(),
                            a.account.name,
                            a.account.r#type.to_string(),
                            a.account.state.to_string(),
                            a.currency.code,
                            fmt_money(&a.balance, &a.currency.symbol),
                            a.account.created_at,
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["ID", "Name", "Type", "State", "CCY", "Balance", "Created"],
                        rows
                    )
                );
            }
        }
        Some(("update", sub)) => {
            let id = id_for_account(conn, sub.get_one::<String>("id").unwrap())?;
            let new = account_args(conn, sub)?;
            update_account(conn, id, &new)?;
            println!("Updated account #{}", id);
        }
        Some(("rm", sub)) => {
            let id = id_for_account(conn, sub.get_one::<String>("id").unwrap())?;
            delete_account(conn, id)?;
            println!("Removed account #{}", id);
        }
        _ => {}
    }
    Ok(())
}

fn account_args(conn: &Connection, sub: &clap::ArgMatches) -> anyhow::Result<NewAccount> {
    let name = sub.get_one::<String>("name").unwrap().trim().to_string();
    let r#type = sub
        .get_one::<String>("type")
        .unwrap()
        .parse::<AccountType>()?;
    let state = match sub.get_one::<String>("state") {
        Some(s) => s.parse::<AccountState>()?,
        None => AccountState::default(),
    };
    let currency_id = id_for_currency(conn, sub.get_one::<String>("currency").unwrap())
        .context("Account currency")?;
    Ok(NewAccount {
        name,
        r#type,
        state,
        currency_id,
    })
}

fn account_from_row(r: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: r.get(0)?,
        name: r.get(1)?,
        r#type: r.get(2)?,
        state: r.get(3)?,
        currency_id: r.get(4)?,
        created_at: r.get(5)?,
    })
}

/// Inserts the account together with its zero balance.
pub fn add_account(conn: &mut Connection, new: &NewAccount) -> Result<i64> {
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO accounts(name, type, state, currency_id) VALUES (?1, ?2, ?3, ?4)",
        params![new.name, new.r#type, new.state, new.currency_id],
    )?;
    let id = tx.last_insert_rowid();
    ledger::open(&tx, id)?;
    tx.commit()?;
    tracing::info!(id, name = %new.name, "account added");
    Ok(id)
}

/// Field update only; the cached balance is untouched.
pub fn update_account(conn: &Connection, id: i64, new: &NewAccount) -> Result<()> {
    let updated = conn.execute(
        "UPDATE accounts SET name=?1, type=?2, state=?3, currency_id=?4 WHERE id=?5",
        params![new.name, new.r#type, new.state, new.currency_id, id],
    )?;
    if updated == 0 {
        return Err(LedgerError::not_found("Account", id));
    }
    tracing::info!(id, "account updated");
    Ok(())
}

/// Refuses while any income, expense or transfer references the account.
pub fn delete_account(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = conn.transaction()?;
    let checks = [
        "SELECT 1 FROM incomes WHERE account_id=?1 LIMIT 1",
        "SELECT 1 FROM expenses WHERE account_id=?1 LIMIT 1",
        "SELECT 1 FROM transfers WHERE from_account_id=?1 OR to_account_id=?1 LIMIT 1",
    ];
    for sql in checks {
        let hit: Option<i64> = tx.query_row(sql, params![id], |r| r.get(0)).optional()?;
        if hit.is_some() {
            return Err(LedgerError::conflict(
                "Account is used in transactions and cannot be deleted.",
            ));
        }
    }
    ledger::close(&tx, id)?;
    let deleted = tx.execute("DELETE FROM accounts WHERE id=?1", params![id])?;
    if deleted == 0 {
        return Err(LedgerError::not_found("Account", id));
    }
    tx.commit()?;
    tracing::info!(id, "account deleted");
    Ok(())
}

pub fn get_account(conn: &Connection, id: i64) -> Result<Option<Account>> {
    let account = conn
        .query_row(
            "SELECT id, name, type, state, currency_id, created_at FROM accounts WHERE id=?1",
            params![id],
            account_from_row,
        )
        .optional()?;
    Ok(account)
}

const ITEM_SQL: &str = "SELECT a.id, a.name, a.type, a.state, a.currency_id, a.created_at,
        b.amount, c.code, c.symbol, c.description
     FROM accounts a
     JOIN balances b ON b.account_id=a.id
     JOIN currencies c ON c.id=a.currency_id";

fn item_from_row(r: &Row<'_>) -> rusqlite::Result<AccountItem> {
    Ok(AccountItem {
        account: account_from_row(r)?,
        balance: get_decimal(r, 6)?,
        currency: CurrencyInfo {
            code: r.get(7)?,
            symbol: r.get(8)?,
            description: r.get(9)?,
        },
    })
}

/// Accounts in insertion order with their currency and cached balance.
pub fn list_accounts(conn: &Connection) -> Result<Vec<AccountItem>> {
    let mut stmt = conn.prepare(&format!("{ITEM_SQL} ORDER BY a.id"))?;
    let rows = stmt.query_map([], item_from_row)?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    Ok(data)
}

pub fn get_account_item(conn: &Connection, id: i64) -> Result<Option<AccountItem>> {
    let item = conn
        .query_row(
            &format!("{ITEM_SQL} WHERE a.id=?1"),
            params![id],
            item_from_row,
        )
        .optional()?;
    Ok(item)
}
