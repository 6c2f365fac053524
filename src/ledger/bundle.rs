//! Zero-value bundle assembly and transaction trytes layout.
//!
//! A transaction is 2673 trytes:
//!
//! ```text
//! message fragment 2187 | address 81 | value 27 | obsolete tag 27 | timestamp 9
//! current index 9 | last index 9 | bundle 81 | trunk 81 | branch 81 | tag 27
//! attachment timestamp 9 | lower 9 | upper 9 | nonce 27
//! ```
//!
//! Trunk, branch, attachment timestamps and nonce are left as `9` here and
//! filled in by the node during `attachToTangle`.

use std::ops::Range;

use crate::ledger::curl;
use crate::ledger::kerl::Kerl;
use crate::ledger::trytes::{self, ADDRESS_LENGTH, HASH_LENGTH, TAG_LENGTH};
use crate::ledger::types::{LedgerError, LedgerResult, TransactionId, Transfer};

pub const MESSAGE_FRAGMENT_LENGTH: usize = 2187;
pub const TRANSACTION_LENGTH: usize = 2673;

const FRAGMENT: Range<usize> = 0..2187;
const ADDRESS: Range<usize> = 2187..2268;
const VALUE: Range<usize> = 2268..2295;
const OBSOLETE_TAG: Range<usize> = 2295..2322;
const TIMESTAMP: Range<usize> = 2322..2331;
const CURRENT_INDEX: Range<usize> = 2331..2340;
const LAST_INDEX: Range<usize> = 2340..2349;
const BUNDLE: Range<usize> = 2349..2430;
const TAG: Range<usize> = 2592..2619;

#[derive(Debug, Clone)]
struct Entry {
    fragment: String,
    address: String,
    value: i64,
    obsolete_tag: String,
    tag: String,
    current_index: u64,
}

/// Build the trytes of a zero-value bundle carrying `transfers`.
///
/// Messages longer than one fragment span several transactions. The result
/// is ordered head first (highest index), the order `attachToTangle` expects.
pub fn prepare_transfers(transfers: &[Transfer], timestamp: u64) -> LedgerResult<Vec<String>> {
    let mut entries = Vec::new();

    for transfer in transfers {
        if transfer.address.len() != ADDRESS_LENGTH || !trytes::is_trytes(&transfer.address) {
            return Err(LedgerError::InvalidAddress(transfer.address.clone()));
        }
        if !trytes::is_trytes(&transfer.message) {
            return Err(LedgerError::InvalidTrytes("message"));
        }
        if !trytes::is_trytes(&transfer.tag) {
            return Err(LedgerError::InvalidTrytes("tag"));
        }
        if transfer.tag.len() > TAG_LENGTH {
            return Err(LedgerError::InvalidTag(transfer.tag.len()));
        }

        let tag = trytes::pad(&transfer.tag, TAG_LENGTH);
        let fragments = split_fragments(&transfer.message);
        for (i, fragment) in fragments.into_iter().enumerate() {
            entries.push(Entry {
                fragment,
                address: transfer.address.clone(),
                value: if i == 0 { transfer.value } else { 0 },
                obsolete_tag: tag.clone(),
                tag: tag.clone(),
                current_index: 0,
            });
        }
    }

    for (i, entry) in entries.iter_mut().enumerate() {
        entry.current_index = i as u64;
    }
    let last_index = entries.len().saturating_sub(1) as u64;

    let bundle_hash = finalize(&mut entries, timestamp, last_index);

    let mut out: Vec<String> = entries
        .iter()
        .map(|entry| {
            let mut tx = String::with_capacity(TRANSACTION_LENGTH);
            tx.push_str(&entry.fragment);
            tx.push_str(&essence(entry, timestamp, last_index));
            tx.push_str(&bundle_hash);
            tx.push_str(&"9".repeat(HASH_LENGTH * 2));
            tx.push_str(&entry.tag);
            tx.push_str(&"9".repeat(9 * 3 + 27));
            tx
        })
        .collect();
    out.reverse();
    Ok(out)
}

fn split_fragments(message: &str) -> Vec<String> {
    if message.is_empty() {
        return vec![trytes::pad("", MESSAGE_FRAGMENT_LENGTH)];
    }
    message
        .as_bytes()
        .chunks(MESSAGE_FRAGMENT_LENGTH)
        .map(|chunk| {
            // Chunks of an ASCII tryte string are valid UTF-8.
            let fragment = std::str::from_utf8(chunk).unwrap_or_default();
            trytes::pad(fragment, MESSAGE_FRAGMENT_LENGTH)
        })
        .collect()
}

/// Address through last index: the part of a transaction covered by the bundle hash.
fn essence(entry: &Entry, timestamp: u64, last_index: u64) -> String {
    let mut out = String::with_capacity(162);
    out.push_str(&entry.address);
    out.push_str(&trytes::int_to_trytes(entry.value, 27));
    out.push_str(&entry.obsolete_tag);
    out.push_str(&trytes::int_to_trytes(timestamp as i64, 9));
    out.push_str(&trytes::int_to_trytes(entry.current_index as i64, 9));
    out.push_str(&trytes::int_to_trytes(last_index as i64, 9));
    out
}

/// Compute the bundle hash, bumping the tail's obsolete tag until the
/// normalized hash is free of the value 13.
fn finalize(entries: &mut [Entry], timestamp: u64, last_index: u64) -> String {
    loop {
        let mut kerl = Kerl::new();
        for entry in entries.iter() {
            if let Some(trits) = trytes::to_trits(&essence(entry, timestamp, last_index)) {
                kerl.absorb(&trits);
            }
        }
        let hash = trytes::from_trits(&kerl.squeeze());

        if !normalize(&hash).contains(&13) {
            return hash;
        }

        if let Some(first) = entries.first_mut() {
            let mut tag_trits = trytes::to_trits(&first.obsolete_tag).unwrap_or_default();
            trytes::increment(&mut tag_trits);
            first.obsolete_tag = trytes::from_trits(&tag_trits);
        } else {
            return hash;
        }
    }
}

/// Normalize a bundle hash: each 27-tryte third is shifted so its values sum to zero.
pub fn normalize(hash: &str) -> Vec<i8> {
    let mut normalized: Vec<i8> = hash.bytes().filter_map(trytes::tryte_value).collect();

    for chunk in normalized.chunks_mut(27) {
        let mut sum: i32 = chunk.iter().map(|&v| v as i32).sum();
        while sum > 0 {
            if let Some(v) = chunk.iter_mut().find(|v| **v > -13) {
                *v -= 1;
            }
            sum -= 1;
        }
        while sum < 0 {
            if let Some(v) = chunk.iter_mut().find(|v| **v < 13) {
                *v += 1;
            }
            sum += 1;
        }
    }
    normalized
}

/// Read-only view over the trytes of one transaction.
#[derive(Debug, Clone, Copy)]
pub struct TransactionTrytes<'a>(&'a str);

impl<'a> TransactionTrytes<'a> {
    pub fn parse(trytes: &'a str) -> LedgerResult<Self> {
        if trytes.len() != TRANSACTION_LENGTH || !trytes::is_trytes(trytes) {
            return Err(LedgerError::InvalidTrytes("transaction"));
        }
        Ok(Self(trytes))
    }

    pub fn message(&self) -> &'a str {
        &self.0[FRAGMENT]
    }

    pub fn address(&self) -> &'a str {
        &self.0[ADDRESS]
    }

    pub fn value(&self) -> i64 {
        self.int_field(VALUE)
    }

    pub fn obsolete_tag(&self) -> &'a str {
        &self.0[OBSOLETE_TAG]
    }

    pub fn timestamp(&self) -> u64 {
        self.int_field(TIMESTAMP) as u64
    }

    pub fn current_index(&self) -> u64 {
        self.int_field(CURRENT_INDEX) as u64
    }

    pub fn last_index(&self) -> u64 {
        self.int_field(LAST_INDEX) as u64
    }

    pub fn bundle(&self) -> &'a str {
        &self.0[BUNDLE]
    }

    pub fn tag(&self) -> &'a str {
        &self.0[TAG]
    }

    /// Curl hash of the full transaction.
    pub fn hash(&self) -> TransactionId {
        let trits = trytes::to_trits(self.0).unwrap_or_default();
        TransactionId(trytes::from_trits(&curl::hash(&trits)))
    }

    fn int_field(&self, range: Range<usize>) -> i64 {
        trytes::to_trits(&self.0[range])
            .map(|trits| trytes::trits_to_int(&trits))
            .unwrap_or_default()
    }
}
