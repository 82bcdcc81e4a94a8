use chrono::{Datelike, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Error;

const DB_PATH: &str = "supermarket.db";

pub fn connect() -> Result<Connection, Error> {
    let conn = Connection::open(DB_PATH)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<(), Error> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS supermarket (
            \"index\" INTEGER PRIMARY KEY,
            site      TEXT NOT NULL,
            produto   TEXT NOT NULL,
            valor     REAL NOT NULL,
            data      TEXT NOT NULL
        );",
    )?;
    Ok(())
}

/// One normalized product observation produced by extraction, not yet keyed.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub site: String,
    pub product: String,
    pub price: f64,
    pub captured_on: NaiveDate,
}

/// A persisted catalog row. `index` is assigned by the store, never taken
/// from source-site data.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRow {
    pub index: i64,
    pub site: String,
    pub product: String,
    pub price: f64,
    pub captured_on: String,
}

/// Capture dates are stored as D/M/YYYY text without zero padding.
pub fn capture_date_text(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.day(), date.month(), date.year())
}

/// Drop and rewrite the whole table from one scraping run's batch, row
/// position becoming the synthetic index.
pub fn bulk_replace(conn: &Connection, records: &[ProductRecord]) -> Result<usize, Error> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "DROP TABLE IF EXISTS supermarket;
         CREATE TABLE supermarket (
            \"index\" INTEGER PRIMARY KEY,
            site      TEXT NOT NULL,
            produto   TEXT NOT NULL,
            valor     REAL NOT NULL,
            data      TEXT NOT NULL
         );",
    )?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO supermarket (\"index\", site, produto, valor, data)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for (i, r) in records.iter().enumerate() {
            stmt.execute(params![
                i as i64,
                r.site,
                r.product,
                r.price,
                capture_date_text(r.captured_on),
            ])?;
        }
    }
    tx.commit()?;
    Ok(records.len())
}

/// Insert one row with the next synthetic index: max(existing) + 1, or 0 for
/// an empty table. The read and the write share a transaction so the index
/// computation holds under the single-writer discipline.
pub fn insert(
    conn: &Connection,
    site: &str,
    product: &str,
    price: f64,
    captured_on: NaiveDate,
) -> Result<i64, Error> {
    let tx = conn.unchecked_transaction()?;
    let next: i64 = tx.query_row(
        "SELECT COALESCE(MAX(\"index\") + 1, 0) FROM supermarket",
        [],
        |r| r.get(0),
    )?;
    tx.execute(
        "INSERT INTO supermarket (\"index\", site, produto, valor, data)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![next, site, product, price, capture_date_text(captured_on)],
    )?;
    tx.commit()?;
    Ok(next)
}

pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<CatalogRow>, Error> {
    let row = conn
        .query_row(
            "SELECT \"index\", site, produto, valor, data
             FROM supermarket WHERE \"index\" = ?1",
            [id],
            map_row,
        )
        .optional()?;
    Ok(row)
}

/// Rewrite the non-key fields of one row. A missing index is an error; an
/// update must never materialize a row.
pub fn update(
    conn: &Connection,
    id: i64,
    site: &str,
    product: &str,
    price: f64,
) -> Result<(), Error> {
    let changed = conn.execute(
        "UPDATE supermarket SET site = ?1, produto = ?2, valor = ?3 WHERE \"index\" = ?4",
        params![site, product, price, id],
    )?;
    if changed == 0 {
        return Err(Error::RowMissing { id });
    }
    Ok(())
}

/// Remove one row. Deleting an absent index is a no-op, reported as `false`.
pub fn delete(conn: &Connection, id: i64) -> Result<bool, Error> {
    let removed = conn.execute("DELETE FROM supermarket WHERE \"index\" = ?1", [id])?;
    Ok(removed > 0)
}

pub fn fetch_all(conn: &Connection) -> Result<Vec<CatalogRow>, Error> {
    let mut stmt = conn.prepare(
        "SELECT \"index\", site, produto, valor, data
         FROM supermarket ORDER BY \"index\"",
    )?;
    let rows = stmt
        .query_map([], map_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn count(conn: &Connection) -> Result<usize, Error> {
    let n: usize = conn.query_row("SELECT COUNT(*) FROM supermarket", [], |r| r.get(0))?;
    Ok(n)
}

fn map_row(row: &rusqlite::Row) -> rusqlite::Result<CatalogRow> {
    Ok(CatalogRow {
        index: row.get(0)?,
        site: row.get(1)?,
        product: row.get(2)?,
        price: row.get(3)?,
        captured_on: row.get(4)?,
    })
}

// ── Tests ──
