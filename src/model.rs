// 📒 Ledger Model - Rows as they move through the import
//
// RawRow (parser) → ParsedRow → ResolvedRow → TransferPair → PersistedTransaction
//
// Every stage is an immutable value; later stages wrap earlier ones instead of
// mutating them.

use crate::error::SkipReason;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// What a source row is, before transfer legs are matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Classification {
    Income,
    Expense,
    /// Both legs of a transfer, pre-matching
    TransferOut,
}

impl Classification {
    /// Semantic category type implied by the classification
    pub fn category_type(&self) -> CategoryType {
        match self {
            Classification::Income => CategoryType::Income,
            Classification::Expense => CategoryType::Expense,
            Classification::TransferOut => CategoryType::Transfer,
        }
    }

    pub fn is_transfer(&self) -> bool {
        matches!(self, Classification::TransferOut)
    }

    /// Record type of a row written on its own, without a counterpart
    pub fn transaction_type(&self) -> TransactionType {
        match self {
            Classification::Income => TransactionType::Income,
            Classification::Expense => TransactionType::Expense,
            Classification::TransferOut => TransactionType::TransferOut,
        }
    }
}

/// Semantic type of a ledger category, with the store's numeric codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CategoryType {
    Income,
    Expense,
    Transfer,
}

impl CategoryType {
    /// Fallback order used when the implied type has no category of that name
    pub const FALLBACK_ORDER: [CategoryType; 3] =
        [CategoryType::Income, CategoryType::Expense, CategoryType::Transfer];

    pub fn code(&self) -> i64 {
        match self {
            CategoryType::Income => 1,
            CategoryType::Expense => 2,
            CategoryType::Transfer => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(CategoryType::Income),
            2 => Some(CategoryType::Expense),
            3 => Some(CategoryType::Transfer),
            _ => None,
        }
    }
}

/// Type tag of a persisted transaction, with the store's numeric codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum TransactionType {
    Income,
    Expense,
    TransferOut,
    TransferIn,
}

impl TransactionType {
    pub fn code(&self) -> i64 {
        match self {
            TransactionType::Income => 2,
            TransactionType::Expense => 3,
            TransactionType::TransferOut => 4,
            TransactionType::TransferIn => 5,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            2 => Some(TransactionType::Income),
            3 => Some(TransactionType::Expense),
            4 => Some(TransactionType::TransferOut),
            5 => Some(TransactionType::TransferIn),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "Income",
            TransactionType::Expense => "Expense",
            TransactionType::TransferOut => "Transfer out",
            TransactionType::TransferIn => "Transfer in",
        }
    }
}

// ============================================================================
// ROWS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CategoryKey {
    pub name: String,
    pub category_type: CategoryType,
}

/// A normalized, classified source row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedRow {
    /// Line in the source file (1-indexed, header included)
    pub line: usize,
    /// Local midnight of the row's date, milliseconds since epoch. Not unique.
    pub nominal_time: i64,
    pub classification: Classification,
    pub signed: bool,
    pub amount_minor_units: i64,
    pub category_key: CategoryKey,
    pub account_ref: String,
    pub counterparty_ref: Option<String>,
    /// Ordered, no duplicates
    pub tag_refs: Vec<String>,
    pub comment: String,
}

/// ParsedRow plus everything looked up in the store and the batch-unique time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRow {
    pub row: ParsedRow,
    pub unique_time: i64,
    pub account_id: i64,
    pub category_id: i64,
    /// 0 when no counterparty was found
    pub counterparty_id: i64,
    pub tag_ids: Vec<i64>,
}

impl ResolvedRow {
    pub fn nominal_time(&self) -> i64 {
        self.row.nominal_time
    }

    pub fn category_name(&self) -> &str {
        &self.row.category_key.name
    }

    pub fn signed(&self) -> bool {
        self.row.signed
    }

    pub fn amount(&self) -> i64 {
        self.row.amount_minor_units
    }

    pub fn comment(&self) -> &str {
        &self.row.comment
    }
}

/// Two legs of one transfer, or a leg that found no partner
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TransferPair {
    Matched { source: ResolvedRow, dest: ResolvedRow },
    SourceOnly(ResolvedRow),
    DestOnly(ResolvedRow),
}

impl TransferPair {
    pub fn source(&self) -> Option<&ResolvedRow> {
        match self {
            TransferPair::Matched { source, .. } | TransferPair::SourceOnly(source) => Some(source),
            TransferPair::DestOnly(_) => None,
        }
    }

    pub fn dest(&self) -> Option<&ResolvedRow> {
        match self {
            TransferPair::Matched { dest, .. } | TransferPair::DestOnly(dest) => Some(dest),
            TransferPair::SourceOnly(_) => None,
        }
    }

    pub fn is_matched(&self) -> bool {
        matches!(self, TransferPair::Matched { .. })
    }
}

// ============================================================================
// PERSISTENCE RECORDS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistedTransaction {
    pub transaction_id: u64,
    pub transaction_type: TransactionType,
    pub category_id: i64,
    pub account_id: i64,
    /// Batch-unique time, milliseconds since epoch
    pub transaction_time: i64,
    pub timezone_utc_offset: i32,
    pub amount: i64,
    pub comment: String,
    pub counterparty_id: i64,
    pub related_id: u64,
    pub related_account_id: i64,
    pub related_account_amount: i64,
    pub created_unix_time: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagIndexRecord {
    pub tag_index_id: u64,
    pub tag_id: i64,
    pub transaction_id: u64,
    pub transaction_time: i64,
    pub created_unix_time: i64,
}

// ============================================================================
// IMPORT PLAN & SUMMARY
// ============================================================================

/// Run counts surfaced to the operator whether or not rows were skipped
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    pub total_rows: usize,
    pub parsed: usize,
    pub skipped: usize,
    pub skipped_by_reason: BTreeMap<SkipReason, usize>,
    pub transactions: usize,
    pub tag_indexes: usize,
    pub transfer_rows: usize,
    pub matched_transfers: usize,
    pub unmatched_transfers: usize,
}

impl ImportSummary {
    pub fn record_skip(&mut self, reason: SkipReason) {
        self.skipped += 1;
        *self.skipped_by_reason.entry(reason).or_insert(0) += 1;
    }

    pub fn summary(&self) -> String {
        format!(
            "{} rows: {} parsed, {} skipped | {} transactions, {} tag indexes | transfers: {} rows, {} matched pairs, {} unmatched",
            self.total_rows,
            self.parsed,
            self.skipped,
            self.transactions,
            self.tag_indexes,
            self.transfer_rows,
            self.matched_transfers,
            self.unmatched_transfers
        )
    }
}

/// Everything one run will write, in write order
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportPlan {
    pub transactions: Vec<PersistedTransaction>,
    pub tag_indexes: Vec<TagIndexRecord>,
    pub summary: ImportSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_codes_round_trip_store_values() {
        assert_eq!(TransactionType::Income.code(), 2);
        assert_eq!(TransactionType::TransferIn.code(), 5);
        assert_eq!(TransactionType::from_code(4), Some(TransactionType::TransferOut));
        assert_eq!(TransactionType::from_code(1), None);

        assert_eq!(CategoryType::Transfer.code(), 3);
        assert_eq!(CategoryType::from_code(2), Some(CategoryType::Expense));
        assert_eq!(Classification::TransferOut.category_type(), CategoryType::Transfer);
    }

    #[test]
    fn test_classification_maps_to_record_type() {
        assert_eq!(Classification::Income.transaction_type(), TransactionType::Income);
        assert_eq!(Classification::Expense.transaction_type(), TransactionType::Expense);
        assert_eq!(Classification::TransferOut.transaction_type(), TransactionType::TransferOut);
    }

    #[test]
    fn test_summary_counts_skip_reasons() {
        let mut summary = ImportSummary::default();
        summary.record_skip(SkipReason::ParseError);
        summary.record_skip(SkipReason::ParseError);
        summary.record_skip(SkipReason::MissingField);

        assert_eq!(summary.skipped, 3);
        assert_eq!(summary.skipped_by_reason[&SkipReason::ParseError], 2);
        assert!(summary.summary().contains("3 skipped"));
    }
}
