// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::Path;

use rusqlite::{Connection, params};

use crate::error::Result;

/// Opens (creating if needed) the store at `path`, applies the schema and
/// seeds the default currencies and categories.
pub fn open(path: &Path) -> Result<Connection> {
    let mut conn = Connection::open(path)?;
    init_schema(&conn)?;
    seed_defaults(&mut conn)?;
    tracing::debug!(path = %path.display(), "opened ledger store");
    Ok(conn)
}

/// Unseeded scratch store, mostly for tests.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS currencies(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code TEXT NOT NULL,
        description TEXT NOT NULL,
        symbol TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS accounts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        type TEXT NOT NULL CHECK(type IN ('Bank','Cash','CreditCard')),
        state TEXT NOT NULL DEFAULT 'Active' CHECK(state IN ('Active','Inactive','Closed')),
        currency_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(currency_id) REFERENCES currencies(id) ON DELETE RESTRICT
    );

    -- cached running total, one row per account
    CREATE TABLE IF NOT EXISTS balances(
        account_id INTEGER PRIMARY KEY,
        amount TEXT NOT NULL DEFAULT '0',
        FOREIGN KEY(account_id) REFERENCES accounts(id) ON DELETE RESTRICT
    );

    CREATE TABLE IF NOT EXISTS transfers(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        from_account_id INTEGER NOT NULL,
        to_account_id INTEGER NOT NULL,
        amount TEXT NOT NULL,
        conversion_rate TEXT NOT NULL DEFAULT '1',
        date TEXT NOT NULL,
        FOREIGN KEY(from_account_id) REFERENCES accounts(id) ON DELETE RESTRICT,
        FOREIGN KEY(to_account_id) REFERENCES accounts(id) ON DELETE RESTRICT
    );
    CREATE INDEX IF NOT EXISTS idx_transfers_from ON transfers(from_account_id, date);
    CREATE INDEX IF NOT EXISTS idx_transfers_to ON transfers(to_account_id, date);

    CREATE TABLE IF NOT EXISTS incomes(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        account_id INTEGER NOT NULL,
        source TEXT NOT NULL CHECK(source IN ('Salary','Interest','Profit','Other')),
        amount TEXT NOT NULL,
        date TEXT NOT NULL,
        FOREIGN KEY(account_id) REFERENCES accounts(id) ON DELETE RESTRICT
    );
    CREATE INDEX IF NOT EXISTS idx_incomes_account ON incomes(account_id, date);

    CREATE TABLE IF NOT EXISTS expense_categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        parent_id INTEGER,
        FOREIGN KEY(parent_id) REFERENCES expense_categories(id) ON DELETE RESTRICT
    );

    CREATE TABLE IF NOT EXISTS expenses(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        category_id INTEGER NOT NULL,
        account_id INTEGER NOT NULL,
        amount TEXT NOT NULL,
        date TEXT NOT NULL,
        FOREIGN KEY(category_id) REFERENCES expense_categories(id) ON DELETE RESTRICT,
        FOREIGN KEY(account_id) REFERENCES accounts(id) ON DELETE RESTRICT
    );
    CREATE INDEX IF NOT EXISTS idx_expenses_account ON expenses(account_id, date);
    CREATE INDEX IF NOT EXISTS idx_expenses_date ON expenses(date);
    "#,
    )?;
    Ok(())
}

const DEFAULT_CURRENCIES: &[(&str, &str, &str)] = &[
    ("USD", "US Dollar", "$"),
    ("EUR", "Euro", "€"),
    ("BDT", "Bangladeshi Taka", "৳"),
    ("GBP", "British Pound", "£"),
    ("JPY", "Japanese Yen", "¥"),
    ("AUD", "Australian Dollar", "A$"),
    ("CAD", "Canadian Dollar", "C$"),
    ("CHF", "Swiss Franc", "CHF"),
    ("CNY", "Chinese Yuan", "¥"),
    ("INR", "Indian Rupee", "₹"),
];

const DEFAULT_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Food",
        &["Breakfast", "Lunch", "Dinner", "Snack", "Fruit", "Ingredients"],
    ),
    (
        "Clothing/Beauty",
        &[
            "Shirt",
            "Pants",
            "Jacket",
            "Shoes",
            "Bag",
            "Accessories",
            "Haircut",
            "Cosmetics",
        ],
    ),
    (
        "Living",
        &[
            "Furniture",
            "Appliances",
            "Rent",
            "Management Fees",
            "Water",
            "Electricity",
            "Gas",
            "Cable TV",
            "Internet",
        ],
    ),
    (
        "Transportation",
        &["Bus", "Subway", "Taxi", "High Speed Rail", "Airplane"],
    ),
    ("Education", &["Stationery", "Tutoring Fee", "Tuition"]),
    ("Entertainment", &["Mobile", "Toys", "Travel", "Shopping"]),
    (
        "Personal 3C",
        &["Telephone", "PC Related", "Cell Phone", "Camera"],
    ),
    ("Publications", &["Books", "Newspaper", "Magazine"]),
    (
        "Medical",
        &["Medical Fee", "Drugs", "Physical Checkup", "Health Insurance"],
    ),
    (
        "Social",
        &["Gifts", "Social Activities", "Wedding", "Funeral"],
    ),
    (
        "Others",
        &["Pet", "Lending Money", "Charity", "Incidental Expenses"],
    ),
    ("Fee", &["Transfer Fee"]),
];

/// Seeds each reference table only while it is still empty.
pub fn seed_defaults(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;

    let currencies: i64 = tx.query_row("SELECT COUNT(*) FROM currencies", [], |r| r.get(0))?;
    if currencies == 0 {
        let mut insert =
            tx.prepare("INSERT INTO currencies(code, description, symbol) VALUES (?1, ?2, ?3)")?;
        for (code, description, symbol) in DEFAULT_CURRENCIES {
            insert.execute(params![code, description, symbol])?;
        }
        tracing::info!(count = DEFAULT_CURRENCIES.len(), "seeded currencies");
    }

    let categories: i64 =
        tx.query_row("SELECT COUNT(*) FROM expense_categories", [], |r| r.get(0))?;
    if categories == 0 {
        let mut insert =
            tx.prepare("INSERT INTO expense_categories(name, parent_id) VALUES (?1, ?2)")?;
        for (parent, children) in DEFAULT_CATEGORIES {
            insert.execute(params![parent, Option::<i64>::None])?;
            let parent_id = tx.last_insert_rowid();
            for child in children.iter() {
                insert.execute(params![child, parent_id])?;
            }
        }
        tracing::info!(count = DEFAULT_CATEGORIES.len(), "seeded expense categories");
    }

    tx.commit()?;
    Ok(())
}
