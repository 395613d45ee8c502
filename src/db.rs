// 🗄️ Ledger Store - SQLite persistence for reference tables and import plans
//
// Every read is scoped to one owner (uid) and skips soft-deleted rows.
// A commit writes the whole plan plus its audit event in one SQL transaction:
// either everything lands or nothing does.

use crate::entities::{Account, Category, Counterparty, ReferenceTables, Tag};
use crate::error::{ImportError, ImportResult};
use crate::model::{CategoryType, ImportPlan, ImportSummary, TransactionType};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::info;

// ============================================================================
// STORE INTERFACE
// ============================================================================

pub trait LedgerStore {
    /// Active accounts, categories, tags and counterparties of one owner
    fn load_references(&self, owner_uid: i64) -> ImportResult<ReferenceTables>;

    /// Write one plan atomically, together with its audit event
    fn commit(&mut self, owner_uid: i64, plan: &ImportPlan, event: &ImportEvent) -> ImportResult<()>;
}

/// Audit record for one committed import (every import is an event)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ImportEvent {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub owner_uid: i64,
    pub source_file: String,
    pub source_sha256: String,
    pub summary: serde_json::Value,
}

impl ImportEvent {
    pub fn new(
        owner_uid: i64,
        source_file: &str,
        source_sha256: &str,
        summary: &ImportSummary,
    ) -> ImportResult<Self> {
        Ok(Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            owner_uid,
            source_file: source_file.to_string(),
            source_sha256: source_sha256.to_string(),
            summary: serde_json::to_value(summary)?,
        })
    }
}

/// SHA-256 of a source file, hex encoded
pub fn file_sha256(path: &Path) -> ImportResult<String> {
    let bytes = fs::read(path)
        .map_err(|e| ImportError::Source(format!("cannot read {}: {}", path.display(), e)))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

/// The store keeps identifiers in signed 64-bit columns
fn to_db_id(id: u64) -> ImportResult<i64> {
    i64::try_from(id).map_err(|_| ImportError::IdentifierRange(id))
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> ImportResult<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Reference tables
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS account (
            account_id INTEGER PRIMARY KEY,
            uid INTEGER NOT NULL,
            deleted INTEGER NOT NULL DEFAULT 0,
            name TEXT NOT NULL,
            currency TEXT NOT NULL DEFAULT ''
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS transaction_category (
            category_id INTEGER PRIMARY KEY,
            uid INTEGER NOT NULL,
            deleted INTEGER NOT NULL DEFAULT 0,
            type INTEGER NOT NULL,
            name TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS transaction_tag (
            tag_id INTEGER PRIMARY KEY,
            uid INTEGER NOT NULL,
            deleted INTEGER NOT NULL DEFAULT 0,
            tag_group_id INTEGER NOT NULL DEFAULT 0,
            name TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS counterparty (
            counterparty_id INTEGER PRIMARY KEY,
            uid INTEGER NOT NULL,
            deleted INTEGER NOT NULL DEFAULT 0,
            name TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Ledger tables
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            transaction_id INTEGER PRIMARY KEY,
            uid INTEGER NOT NULL,
            deleted INTEGER NOT NULL DEFAULT 0,
            type INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            account_id INTEGER NOT NULL,
            transaction_time INTEGER NOT NULL,
            timezone_utc_offset INTEGER NOT NULL,
            amount INTEGER NOT NULL,
            related_id INTEGER NOT NULL DEFAULT 0,
            related_account_id INTEGER NOT NULL DEFAULT 0,
            related_account_amount INTEGER NOT NULL DEFAULT 0,
            hide_amount INTEGER NOT NULL DEFAULT 0,
            comment TEXT NOT NULL DEFAULT '',
            counterparty_id INTEGER NOT NULL DEFAULT 0,
            geo_longitude REAL NOT NULL DEFAULT 0,
            geo_latitude REAL NOT NULL DEFAULT 0,
            created_ip TEXT NOT NULL DEFAULT '',
            scheduled_created INTEGER NOT NULL DEFAULT 0,
            planned INTEGER NOT NULL DEFAULT 0,
            source_template_id INTEGER NOT NULL DEFAULT 0,
            created_unix_time INTEGER NOT NULL,
            updated_unix_time INTEGER NOT NULL,
            deleted_unix_time INTEGER NOT NULL DEFAULT 0,
            cfo_id INTEGER NOT NULL DEFAULT 0,
            UNIQUE (uid, transaction_time)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS transaction_tag_index (
            tag_index_id INTEGER PRIMARY KEY,
            uid INTEGER NOT NULL,
            deleted INTEGER NOT NULL DEFAULT 0,
            transaction_time INTEGER NOT NULL,
            tag_id INTEGER NOT NULL,
            transaction_id INTEGER NOT NULL,
            created_unix_time INTEGER NOT NULL,
            updated_unix_time INTEGER NOT NULL,
            deleted_unix_time INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    // ==========================================================================
    // Import events (audit trail)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS import_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            owner_uid INTEGER NOT NULL,
            source_file TEXT NOT NULL,
            source_sha256 TEXT NOT NULL,
            summary TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_tag_index_transaction ON transaction_tag_index(transaction_id)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// SQLITE STORE
// ============================================================================

pub struct SqliteLedgerStore {
    conn: Connection,
}

impl SqliteLedgerStore {
    /// Open (or create) a ledger database and make sure the tables exist
    pub fn open(path: &Path) -> ImportResult<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn from_connection(conn: Connection) -> ImportResult<Self> {
        setup_database(&conn)?;
        Ok(SqliteLedgerStore { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Post-commit totals for one owner
    pub fn verify_counts(&self, owner_uid: i64) -> ImportResult<StoreCounts> {
        let mut stmt = self.conn.prepare(
            "SELECT type, COUNT(*) FROM \"transaction\"
             WHERE uid = ?1 AND deleted = 0
             GROUP BY type",
        )?;
        let by_type = stmt
            .query_map(params![owner_uid], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<BTreeMap<i64, i64>, _>>()?;

        let tag_indexes: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM transaction_tag_index WHERE uid = ?1 AND deleted = 0",
            params![owner_uid],
            |row| row.get(0),
        )?;

        Ok(StoreCounts { by_type, tag_indexes })
    }

    pub fn import_events(&self, owner_uid: i64) -> ImportResult<Vec<ImportEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT event_id, timestamp, owner_uid, source_file, source_sha256, summary
             FROM import_events
             WHERE owner_uid = ?1
             ORDER BY id",
        )?;

        let events = stmt
            .query_map(params![owner_uid], |row| {
                let timestamp_str: String = row.get(1)?;
                let summary_json: String = row.get(5)?;

                Ok(ImportEvent {
                    event_id: row.get(0)?,
                    timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                        .map_err(|_| rusqlite::Error::InvalidQuery)?
                        .with_timezone(&Utc),
                    owner_uid: row.get(2)?,
                    source_file: row.get(3)?,
                    source_sha256: row.get(4)?,
                    summary: serde_json::from_str(&summary_json)
                        .map_err(|_| rusqlite::Error::InvalidQuery)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(events)
    }

    fn load_accounts(&self, owner_uid: i64) -> ImportResult<Vec<Account>> {
        let mut stmt = self.conn.prepare(
            "SELECT account_id, name, currency FROM account WHERE uid = ?1 AND deleted = 0",
        )?;
        let accounts = stmt
            .query_map(params![owner_uid], |row| {
                Ok(Account::new(row.get(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(accounts)
    }

    fn load_categories(&self, owner_uid: i64) -> ImportResult<Vec<Category>> {
        let mut stmt = self.conn.prepare(
            "SELECT category_id, name, type FROM transaction_category WHERE uid = ?1 AND deleted = 0",
        )?;
        let rows = stmt
            .query_map(params![owner_uid], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, i64>(2)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        // Unknown type codes are not usable for lookups
        Ok(rows
            .into_iter()
            .filter_map(|(id, name, code)| {
                CategoryType::from_code(code).map(|t| Category::new(id, name, t))
            })
            .collect())
    }

    fn load_tags(&self, owner_uid: i64) -> ImportResult<Vec<Tag>> {
        let mut stmt = self.conn.prepare(
            "SELECT tag_id, name, tag_group_id FROM transaction_tag WHERE uid = ?1 AND deleted = 0",
        )?;
        let tags = stmt
            .query_map(params![owner_uid], |row| {
                Ok(Tag::new(row.get(0)?, row.get::<_, String>(1)?, row.get(2)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    fn load_counterparties(&self, owner_uid: i64) -> ImportResult<Vec<Counterparty>> {
        let mut stmt = self.conn.prepare(
            "SELECT counterparty_id, name FROM counterparty WHERE uid = ?1 AND deleted = 0",
        )?;
        let counterparties = stmt
            .query_map(params![owner_uid], |row| {
                Ok(Counterparty::new(row.get(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(counterparties)
    }
}

impl LedgerStore for SqliteLedgerStore {
    fn load_references(&self, owner_uid: i64) -> ImportResult<ReferenceTables> {
        let tables = ReferenceTables {
            accounts: self.load_accounts(owner_uid)?.into_iter().collect(),
            categories: self.load_categories(owner_uid)?.into_iter().collect(),
            tags: self.load_tags(owner_uid)?.into_iter().collect(),
            counterparties: self.load_counterparties(owner_uid)?.into_iter().collect(),
        };
        info!("Loaded references for uid {}: {}", owner_uid, tables.summary());
        Ok(tables)
    }

    fn commit(&mut self, owner_uid: i64, plan: &ImportPlan, event: &ImportEvent) -> ImportResult<()> {
        // Dropping `tx` without commit() rolls everything back
        let tx = self.conn.transaction()?;

        {
            let mut insert_tx = tx.prepare(
                "INSERT INTO \"transaction\" (
                    transaction_id, uid, deleted, type, category_id, account_id,
                    transaction_time, timezone_utc_offset, amount,
                    related_id, related_account_id, related_account_amount,
                    hide_amount, comment, counterparty_id,
                    geo_longitude, geo_latitude, created_ip,
                    scheduled_created, planned, source_template_id,
                    created_unix_time, updated_unix_time, deleted_unix_time, cfo_id
                ) VALUES (?1, ?2, 0, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                          0, ?12, ?13, 0, 0, '', 0, 0, 0, ?14, ?14, 0, 0)",
            )?;

            for record in &plan.transactions {
                insert_tx.execute(params![
                    to_db_id(record.transaction_id)?,
                    owner_uid,
                    record.transaction_type.code(),
                    record.category_id,
                    record.account_id,
                    record.transaction_time,
                    record.timezone_utc_offset,
                    record.amount,
                    to_db_id(record.related_id)?,
                    record.related_account_id,
                    record.related_account_amount,
                    record.comment,
                    record.counterparty_id,
                    record.created_unix_time,
                ])?;
            }

            let mut insert_tag = tx.prepare(
                "INSERT INTO transaction_tag_index (
                    tag_index_id, uid, deleted, transaction_time, tag_id, transaction_id,
                    created_unix_time, updated_unix_time, deleted_unix_time
                ) VALUES (?1, ?2, 0, ?3, ?4, ?5, ?6, ?6, 0)",
            )?;

            for record in &plan.tag_indexes {
                insert_tag.execute(params![
                    to_db_id(record.tag_index_id)?,
                    owner_uid,
                    record.transaction_time,
                    record.tag_id,
                    to_db_id(record.transaction_id)?,
                    record.created_unix_time,
                ])?;
            }

            tx.execute(
                "INSERT INTO import_events (
                    event_id, timestamp, owner_uid, source_file, source_sha256, summary
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    event.event_id,
                    event.timestamp.to_rfc3339(),
                    event.owner_uid,
                    event.source_file,
                    event.source_sha256,
                    serde_json::to_string(&event.summary)?,
                ],
            )?;
        }

        tx.commit()?;
        info!(
            "Committed {} transactions and {} tag indexes (event {})",
            plan.transactions.len(),
            plan.tag_indexes.len(),
            event.event_id
        );
        Ok(())
    }
}

// ============================================================================
// VERIFICATION
// ============================================================================

/// Row counts read back after a commit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreCounts {
    /// Store type code → count
    pub by_type: BTreeMap<i64, i64>,
    pub tag_indexes: i64,
}

impl StoreCounts {
    pub fn count(&self, transaction_type: TransactionType) -> i64 {
        self.by_type.get(&transaction_type.code()).copied().unwrap_or(0)
    }

    pub fn total(&self) -> i64 {
        self.by_type.values().sum()
    }

    pub fn lines(&self) -> Vec<String> {
        self.by_type
            .iter()
            .map(|(code, count)| {
                let label = TransactionType::from_code(*code)
                    .map(|t| t.as_str().to_string())
                    .unwrap_or_else(|| format!("type {}", code));
                format!("{}: {}", label, count)
            })
            .collect()
    }
}
