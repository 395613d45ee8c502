// 🔁 Transfer Matcher - Rebuild two-legged transfers
//
// The source records each transfer twice: a negative row on the account the
// money left and a positive row on the account it arrived at. Both carry the
// same transfer category and date but nothing links them.
//
// Matching is greedy: every negative leg takes the FIRST unused positive leg
// with the same nominal time and the same category name. Amounts and
// counterparties are not compared, so several transfers sharing a date and
// category can be cross-paired silently. Results must stay reproducible, so
// this rule does not change.

use crate::model::{ResolvedRow, TransferPair};
use serde::Serialize;
use tracing::{debug, warn};

// ============================================================================
// MATCH REPORT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransferMatchReport {
    pub transfer_rows: usize,
    pub matched_pairs: usize,
    pub unmatched_legs: usize,
}

impl TransferMatchReport {
    pub fn from_pairs(pairs: &[TransferPair]) -> Self {
        let matched_pairs = pairs.iter().filter(|p| p.is_matched()).count();
        let unmatched_legs = pairs.len() - matched_pairs;

        TransferMatchReport {
            transfer_rows: matched_pairs * 2 + unmatched_legs,
            matched_pairs,
            unmatched_legs,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Transfers: {} rows, {} matched pairs, {} unmatched",
            self.transfer_rows, self.matched_pairs, self.unmatched_legs
        )
    }
}

// ============================================================================
// TRANSFER MATCHER
// ============================================================================

pub struct TransferMatcher;

impl TransferMatcher {
    /// Pair transfer legs.
    ///
    /// Output order: one entry per negative leg in input order (matched or
    /// `SourceOnly`), then every unused positive leg as `DestOnly`.
    pub fn match_legs(rows: Vec<ResolvedRow>) -> Vec<TransferPair> {
        let (negatives, positives): (Vec<ResolvedRow>, Vec<ResolvedRow>) =
            rows.into_iter().partition(|row| row.signed());

        let mut positives: Vec<Option<ResolvedRow>> = positives.into_iter().map(Some).collect();
        let mut pairs = Vec::with_capacity(negatives.len() + positives.len());

        for negative in negatives {
            let candidate = positives.iter().position(|slot| {
                slot.as_ref().is_some_and(|pos| Self::is_counterpart(&negative, pos))
            });

            match candidate.and_then(|j| positives[j].take()) {
                Some(positive) => {
                    debug!(
                        "Matched transfer: line {} ↔ line {} ({})",
                        negative.row.line,
                        positive.row.line,
                        negative.category_name()
                    );
                    pairs.push(TransferPair::Matched { source: negative, dest: positive });
                }
                None => {
                    warn!(
                        "Unmatched outgoing transfer leg at line {} ({})",
                        negative.row.line,
                        negative.category_name()
                    );
                    pairs.push(TransferPair::SourceOnly(negative));
                }
            }
        }

        for positive in positives.into_iter().flatten() {
            warn!(
                "Unmatched incoming transfer leg at line {} ({})",
                positive.row.line,
                positive.category_name()
            );
            pairs.push(TransferPair::DestOnly(positive));
        }

        pairs
    }

    /// Same nominal day, same category name
    fn is_counterpart(negative: &ResolvedRow, positive: &ResolvedRow) -> bool {
        negative.nominal_time() == positive.nominal_time()
            && negative.category_name() == positive.category_name()
    }
}

// ============================================================================
// TESTS
// ============================================================================
