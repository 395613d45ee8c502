// 🔑 Identifier Generator - Time-ordered 64-bit ids
//
// Layout (MSB → LSB):
//   32 bits unix seconds | 4 bits kind | 8 bits server id | 19 bits sequence
//
// The sequence counter lives in the generator instance, keyed by
// (kind, unix seconds). One instance per run, handed to every call site.

use std::collections::HashMap;

const SEQUENCE_BITS: u32 = 19;
const SERVER_ID_BITS: u32 = 8;
const KIND_BITS: u32 = 4;

const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;
const SERVER_ID_MASK: u64 = (1 << SERVER_ID_BITS) - 1;
const KIND_MASK: u64 = (1 << KIND_BITS) - 1;
const UNIX_TIME_MASK: u64 = (1 << 32) - 1;

/// Identifier namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    Transaction,
    TagIndex,
}

impl IdKind {
    pub fn code(&self) -> u8 {
        match self {
            IdKind::Transaction => 3,
            IdKind::TagIndex => 6,
        }
    }
}

pub struct IdGenerator {
    server_id: u8,
    sequences: HashMap<(IdKind, i64), u64>,
}

impl IdGenerator {
    pub fn new(server_id: u8) -> Self {
        IdGenerator {
            server_id,
            sequences: HashMap::new(),
        }
    }

    /// Next identifier for `kind` in the given second.
    ///
    /// More than 2^19 calls for one (kind, second) wrap the sequence; a batch
    /// import never gets close.
    pub fn generate(&mut self, kind: IdKind, unix_time: i64) -> u64 {
        let seq = match self.sequences.get_mut(&(kind, unix_time)) {
            Some(counter) => {
                *counter += 1;
                *counter
            }
            None => {
                self.sequences.insert((kind, unix_time), 0);
                0
            }
        };
        debug_assert!(seq <= SEQUENCE_MASK, "sequence overflow for {:?} at {}", kind, unix_time);

        let mut id = (unix_time as u64 & UNIX_TIME_MASK) << (KIND_BITS + SERVER_ID_BITS + SEQUENCE_BITS);
        id |= (kind.code() as u64 & KIND_MASK) << (SERVER_ID_BITS + SEQUENCE_BITS);
        id |= (self.server_id as u64 & SERVER_ID_MASK) << SEQUENCE_BITS;
        id |= seq & SEQUENCE_MASK;
        id
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Split an identifier back into (unix seconds, kind code, server id, sequence)
pub fn decompose(id: u64) -> (u64, u8, u8, u64) {
    let unix_time = id >> (KIND_BITS + SERVER_ID_BITS + SEQUENCE_BITS);
    let kind = ((id >> (SERVER_ID_BITS + SEQUENCE_BITS)) & KIND_MASK) as u8;
    let server_id = ((id >> SEQUENCE_BITS) & SERVER_ID_MASK) as u8;
    let seq = id & SEQUENCE_MASK;
    (unix_time, kind, server_id, seq)
}
