// Ledger Import - Core Library
// Spreadsheet rows → reconciled ledger transactions, for the CLI and tests

pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod identifiers;
pub mod model;
pub mod parser;
pub mod reconciliation;
pub mod rules;
pub mod temporal;
pub mod transfers;

// Re-export commonly used types
pub use config::ImportConfig;
pub use db::{file_sha256, setup_database, ImportEvent, LedgerStore, SqliteLedgerStore, StoreCounts};
pub use entities::{
    Account, AccountRegistry, Category, CategoryRegistry, Counterparty, CounterpartyRegistry,
    ReferenceTables, Tag, TagRegistry,
};
pub use error::{ImportError, ImportResult, RowError, SkipReason};
pub use identifiers::{IdGenerator, IdKind};
pub use model::{
    CategoryType, Classification, ImportPlan, ImportSummary, PersistedTransaction, TagIndexRecord,
    TransactionType, TransferPair,
};
pub use parser::{detect_source, get_source, read_rows, RawRow, RowNormalizer, RowSource, SourceFormat};
pub use reconciliation::ReconciliationPipeline;
pub use rules::Classifier;
pub use temporal::{uniquify, TimeUniquifier};
pub use transfers::{TransferMatchReport, TransferMatcher};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
