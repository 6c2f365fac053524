//! Curl-P-81 sponge, used to derive transaction hashes from attached trytes.

use crate::ledger::trytes::Trit;

/// Trits absorbed or squeezed per block.
pub const HASH_TRITS: usize = 243;
const STATE_TRITS: usize = HASH_TRITS * 3;
const ROUNDS: usize = 81;
const TRUTH_TABLE: [Trit; 11] = [1, 0, -1, 2, 1, -1, 0, 2, -1, 1, 0];

/// Ternary sponge over a 729-trit state.
#[derive(Clone)]
pub struct Curl {
    state: [Trit; STATE_TRITS],
}

impl Curl {
    pub fn new() -> Self {
        Self {
            state: [0; STATE_TRITS],
        }
    }

    /// Absorb `trits`, one 243-trit block at a time.
    pub fn absorb(&mut self, trits: &[Trit]) {
        for block in trits.chunks(HASH_TRITS) {
            self.state[..block.len()].copy_from_slice(block);
            self.transform();
        }
    }

    /// Squeeze one 243-trit block.
    pub fn squeeze(&mut self) -> [Trit; HASH_TRITS] {
        let mut out = [0; HASH_TRITS];
        out.copy_from_slice(&self.state[..HASH_TRITS]);
        self.transform();
        out
    }

    fn transform(&mut self) {
        let mut index = 0usize;
        for _ in 0..ROUNDS {
            let copy = self.state;
            for slot in self.state.iter_mut() {
                let a = copy[index] as i32;
                index = if index < 365 { index + 364 } else { index - 365 };
                let b = copy[index] as i32;
                *slot = TRUTH_TABLE[(a + (b << 2) + 5) as usize];
            }
        }
    }
}

impl Default for Curl {
    fn default() -> Self {
        Self::new()
    }
}

/// Curl hash of a full transaction's trits.
pub fn hash(trits: &[Trit]) -> [Trit; HASH_TRITS] {
    let mut curl = Curl::new();
    curl.absorb(trits);
    curl.squeeze()
}
