// ⚖️ Reconciliation Pipeline - Raw rows → ledger records
//
//   normalize/classify → resolve references → unique times
//     → match transfer legs → emit transactions + tag indexes
//
// Row-level problems skip the row and are counted. Only batch-level failures
// (time domain exhausted) abort the run. Nothing here touches the store: the
// result is an ImportPlan that the store commits in one transaction.

use crate::config::ImportConfig;
use crate::entities::{ReferenceTables, RowReferences, NO_COUNTERPARTY};
use crate::error::ImportResult;
use crate::identifiers::{IdGenerator, IdKind};
use crate::model::{
    ImportPlan, ImportSummary, ParsedRow, PersistedTransaction, ResolvedRow, TagIndexRecord,
    TransactionType, TransferPair,
};
use crate::parser::{RawRow, RowNormalizer};
use crate::rules::Classifier;
use crate::temporal::uniquify;
use crate::transfers::{TransferMatchReport, TransferMatcher};
use tracing::{debug, info};

// ============================================================================
// PIPELINE
// ============================================================================

pub struct ReconciliationPipeline<'a> {
    normalizer: RowNormalizer<'a>,
    references: &'a ReferenceTables,
    timezone_offset_minutes: i32,
}

impl<'a> ReconciliationPipeline<'a> {
    pub fn new(
        config: &ImportConfig,
        classifier: &'a Classifier,
        references: &'a ReferenceTables,
    ) -> ImportResult<Self> {
        Ok(ReconciliationPipeline {
            normalizer: RowNormalizer::new(config.timezone()?, classifier),
            references,
            timezone_offset_minutes: config.timezone_offset_minutes,
        })
    }

    /// Build the full write plan for one batch.
    ///
    /// `generated_at` (unix seconds) is the time field of every identifier
    /// and the created/updated time of every record in this run.
    pub fn run(
        &self,
        rows: &[RawRow],
        ids: &mut IdGenerator,
        generated_at: i64,
    ) -> ImportResult<ImportPlan> {
        let mut summary = ImportSummary {
            total_rows: rows.len(),
            ..Default::default()
        };

        // 1-4. Normalize, classify, resolve
        let mut accepted: Vec<(ParsedRow, RowReferences)> = Vec::with_capacity(rows.len());
        for raw in rows {
            let resolved = self
                .normalizer
                .normalize(raw)
                .and_then(|parsed| self.references.resolve(&parsed).map(|refs| (parsed, refs)));

            match resolved {
                Ok(entry) => accepted.push(entry),
                Err(e) => {
                    debug!("Skipping row: {}", e);
                    summary.record_skip(e.reason());
                }
            }
        }
        summary.parsed = accepted.len();
        info!("Parsed: {}, skipped: {}", summary.parsed, summary.skipped);

        // 5. Unique times across every accepted row, in source order
        let nominal: Vec<i64> = accepted.iter().map(|(row, _)| row.nominal_time).collect();
        let unique = uniquify(&nominal)?;

        let resolved: Vec<ResolvedRow> = accepted
            .into_iter()
            .zip(unique)
            .map(|((row, refs), unique_time)| ResolvedRow {
                row,
                unique_time,
                account_id: refs.account_id,
                category_id: refs.category_id,
                counterparty_id: refs.counterparty_id,
                tag_ids: refs.tag_ids,
            })
            .collect();

        // 6. Transfer legs
        let (transfers, singles): (Vec<ResolvedRow>, Vec<ResolvedRow>) = resolved
            .into_iter()
            .partition(|r| r.row.classification.is_transfer());

        let pairs = TransferMatcher::match_legs(transfers);
        let report = TransferMatchReport::from_pairs(&pairs);
        info!("{}", report.summary());

        // 7. Emit
        let mut emitter = Emitter::new(ids, generated_at, self.timezone_offset_minutes);
        for row in &singles {
            emitter.emit_single(row, row.row.classification.transaction_type());
        }
        for pair in &pairs {
            match pair {
                TransferPair::Matched { source, dest } => emitter.emit_pair(source, dest),
                TransferPair::SourceOnly(leg) | TransferPair::DestOnly(leg) => {
                    emitter.emit_single(leg, TransactionType::TransferOut)
                }
            }
        }

        // 8. Summary
        let (transactions, tag_indexes) = emitter.finish();
        summary.transactions = transactions.len();
        summary.tag_indexes = tag_indexes.len();
        summary.transfer_rows = report.transfer_rows;
        summary.matched_transfers = report.matched_pairs;
        summary.unmatched_transfers = report.unmatched_legs;
        info!("Plan ready: {}", summary.summary());

        Ok(ImportPlan {
            transactions,
            tag_indexes,
            summary,
        })
    }
}

// ============================================================================
// EMITTER
// ============================================================================

/// Cross-reference written on both records of a matched transfer
struct Related {
    id: u64,
    account_id: i64,
    amount: i64,
}

struct Emitter<'g> {
    ids: &'g mut IdGenerator,
    generated_at: i64,
    timezone_utc_offset: i32,
    transactions: Vec<PersistedTransaction>,
    tag_indexes: Vec<TagIndexRecord>,
}

impl<'g> Emitter<'g> {
    fn new(ids: &'g mut IdGenerator, generated_at: i64, timezone_utc_offset: i32) -> Self {
        Emitter {
            ids,
            generated_at,
            timezone_utc_offset,
            transactions: Vec::new(),
            tag_indexes: Vec::new(),
        }
    }

    /// One standalone record. Unmatched transfer legs come through here as
    /// TransferOut whatever their sign.
    fn emit_single(&mut self, row: &ResolvedRow, tx_type: TransactionType) {
        let id = self.ids.generate(IdKind::Transaction, self.generated_at);
        self.push_transaction(id, row, tx_type, row.comment().to_string(), row.counterparty_id, None);
        self.push_tags(id, row.unique_time, &row.tag_ids);
    }

    /// Two linked records: TransferOut for the negative leg, TransferIn for
    /// the positive leg. Comment, counterparty and tags are shared.
    fn emit_pair(&mut self, source: &ResolvedRow, dest: &ResolvedRow) {
        let source_id = self.ids.generate(IdKind::Transaction, self.generated_at);
        let dest_id = self.ids.generate(IdKind::Transaction, self.generated_at);

        let comment = if !source.comment().is_empty() {
            source.comment()
        } else {
            dest.comment()
        };
        let counterparty_id = if source.counterparty_id != NO_COUNTERPARTY {
            source.counterparty_id
        } else {
            dest.counterparty_id
        };

        self.push_transaction(
            source_id,
            source,
            TransactionType::TransferOut,
            comment.to_string(),
            counterparty_id,
            Some(Related { id: dest_id, account_id: dest.account_id, amount: dest.amount() }),
        );
        self.push_transaction(
            dest_id,
            dest,
            TransactionType::TransferIn,
            comment.to_string(),
            counterparty_id,
            Some(Related { id: source_id, account_id: source.account_id, amount: source.amount() }),
        );

        let tags = union_preserving_order(&source.tag_ids, &dest.tag_ids);
        self.push_tags(source_id, source.unique_time, &tags);
        self.push_tags(dest_id, dest.unique_time, &tags);
    }

    fn push_transaction(
        &mut self,
        id: u64,
        row: &ResolvedRow,
        tx_type: TransactionType,
        comment: String,
        counterparty_id: i64,
        related: Option<Related>,
    ) {
        let (related_id, related_account_id, related_account_amount) = related
            .map(|r| (r.id, r.account_id, r.amount))
            .unwrap_or((0, 0, 0));

        self.transactions.push(PersistedTransaction {
            transaction_id: id,
            transaction_type: tx_type,
            category_id: row.category_id,
            account_id: row.account_id,
            transaction_time: row.unique_time,
            timezone_utc_offset: self.timezone_utc_offset,
            amount: row.amount(),
            comment,
            counterparty_id,
            related_id,
            related_account_id,
            related_account_amount,
            created_unix_time: self.generated_at,
        });
    }

    fn push_tags(&mut self, transaction_id: u64, transaction_time: i64, tag_ids: &[i64]) {
        for &tag_id in tag_ids {
            let tag_index_id = self.ids.generate(IdKind::TagIndex, self.generated_at);
            self.tag_indexes.push(TagIndexRecord {
                tag_index_id,
                tag_id,
                transaction_id,
                transaction_time,
                created_unix_time: self.generated_at,
            });
        }
    }

    fn finish(self) -> (Vec<PersistedTransaction>, Vec<TagIndexRecord>) {
        (self.transactions, self.tag_indexes)
    }
}

fn union_preserving_order(first: &[i64], second: &[i64]) -> Vec<i64> {
    let mut union: Vec<i64> = Vec::with_capacity(first.len() + second.len());
    for &id in first.iter().chain(second) {
        if !union.contains(&id) {
            union.push(id);
        }
    }
    union
}

// ============================================================================
// TESTS
// ============================================================================
