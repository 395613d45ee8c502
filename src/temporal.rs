// ⏰ Time Uniquifier - One transaction per millisecond
//
// The ledger store keeps UNIQUE (uid, transaction_time). Source rows only carry
// a calendar date, so many rows share the same nominal time. This module spreads
// them over distinct milliseconds without reordering rows of the same day.

use crate::error::{ImportError, ImportResult};
use std::collections::{HashMap, HashSet};

/// Assigns batch-unique times to a sequence of nominal times.
///
/// Pass one: the k-th row seen with nominal time `t` gets `t + k`.
/// Pass two: rows are walked again in the same order and each tentative value
/// probes upward past anything already taken.
///
/// The result is deterministic for a given input order and every unique time is
/// at or above its nominal time. Long collision chains can push a row well past its
/// nominal time; rows of different days may then interleave by value.
#[derive(Debug, Default)]
pub struct TimeUniquifier {
    occurrences: HashMap<i64, i64>,
    seen: HashSet<i64>,
}

impl TimeUniquifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unique times for `nominal_times`, same length and order
    pub fn assign(&mut self, nominal_times: &[i64]) -> ImportResult<Vec<i64>> {
        let tentative: Vec<(i64, i64)> = nominal_times
            .iter()
            .map(|&nominal| {
                let k = self.occurrences.entry(nominal).or_insert(-1);
                *k += 1;
                (nominal, *k)
            })
            .collect();

        let mut unique = Vec::with_capacity(tentative.len());
        for (nominal, offset) in tentative {
            let mut candidate = nominal
                .checked_add(offset)
                .ok_or(ImportError::UniquenessExhaustion { nominal_time: nominal })?;

            while self.seen.contains(&candidate) {
                candidate = candidate
                    .checked_add(1)
                    .ok_or(ImportError::UniquenessExhaustion { nominal_time: nominal })?;
            }

            self.seen.insert(candidate);
            unique.push(candidate);
        }

        Ok(unique)
    }
}

/// One-shot helper for a whole batch
pub fn uniquify(nominal_times: &[i64]) -> ImportResult<Vec<i64>> {
    TimeUniquifier::new().assign(nominal_times)
}
