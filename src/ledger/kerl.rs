//! Kerl: Keccak-384 wrapped as a ternary sponge, used for bundle hashes.
//!
//! Each 243-trit block maps to a 384-bit two's complement integer (48 bytes,
//! big-endian). Trit 242 is always forced to zero on the way in and out.

use sha3::{Digest, Keccak384};

use crate::ledger::curl::HASH_TRITS;
use crate::ledger::trytes::Trit;

const BYTE_LENGTH: usize = 48;
const WORDS: usize = BYTE_LENGTH / 4;

/// Keccak-384 based ternary sponge.
#[derive(Clone, Default)]
pub struct Kerl {
    keccak: Keccak384,
}

impl Kerl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb `trits`. A trailing partial block is ignored.
    pub fn absorb(&mut self, trits: &[Trit]) {
        for block in trits.chunks_exact(HASH_TRITS) {
            self.keccak.update(trits_to_bytes(block));
        }
    }

    /// Squeeze one 243-trit block.
    pub fn squeeze(&mut self) -> [Trit; HASH_TRITS] {
        let digest = self.keccak.finalize_reset();
        let trits = bytes_to_trits(digest.as_slice());

        let flipped: Vec<u8> = digest.iter().map(|b| !b).collect();
        self.keccak.update(&flipped);
        trits
    }
}

/// Encode a 243-trit block as a 48-byte big-endian two's complement integer.
pub fn trits_to_bytes(trits: &[Trit]) -> [u8; BYTE_LENGTH] {
    let mut words = [0u32; WORDS];
    for &trit in trits[..HASH_TRITS - 1].iter().rev() {
        mul_small(&mut words, 3);
        match trit {
            1 => add_one(&mut words),
            -1 => sub_one(&mut words),
            _ => {}
        }
    }

    let mut bytes = [0u8; BYTE_LENGTH];
    for (i, word) in words.iter().rev().enumerate() {
        bytes[i * 4..i * 4 + 4].copy_from_slice(&word.to_be_bytes());
    }
    bytes
}

/// Decode a 48-byte big-endian two's complement integer into 243 trits.
pub fn bytes_to_trits(bytes: &[u8]) -> [Trit; HASH_TRITS] {
    let mut words = [0u32; WORDS];
    for (i, chunk) in bytes.chunks_exact(4).enumerate() {
        words[WORDS - 1 - i] = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }

    let negative = bytes[0] & 0x80 != 0;
    if negative {
        for word in words.iter_mut() {
            *word = !*word;
        }
        add_one(&mut words);
    }

    let mut trits = [0 as Trit; HASH_TRITS];
    for trit in trits.iter_mut() {
        *trit = match div_small(&mut words, 3) {
            0 => 0,
            1 => 1,
            _ => {
                add_one(&mut words);
                -1
            }
        };
    }

    if negative {
        for trit in trits.iter_mut() {
            *trit = -*trit;
        }
    }
    trits[HASH_TRITS - 1] = 0;
    trits
}

fn mul_small(words: &mut [u32; WORDS], factor: u32) {
    let mut carry = 0u64;
    for word in words.iter_mut() {
        let product = *word as u64 * factor as u64 + carry;
        *word = product as u32;
        carry = product >> 32;
    }
}

fn div_small(words: &mut [u32; WORDS], divisor: u32) -> u32 {
    let mut rem = 0u64;
    for word in words.iter_mut().rev() {
        let current = (rem << 32) | *word as u64;
        *word = (current / divisor as u64) as u32;
        rem = current % divisor as u64;
    }
    rem as u32
}

fn add_one(words: &mut [u32; WORDS]) {
    for word in words.iter_mut() {
        let (next, overflow) = word.overflowing_add(1);
        *word = next;
        if !overflow {
            return;
        }
    }
}

fn sub_one(words: &mut [u32; WORDS]) {
    for word in words.iter_mut() {
        let (next, underflow) = word.overflowing_sub(1);
        *word = next;
        if !underflow {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::trytes;

    fn block(value: i64) -> Vec<Trit> {
        trytes::int_to_trits(value, HASH_TRITS)
    }

    #[test]
    fn small_integers_map_to_twos_complement() {
        let one = trits_to_bytes(&block(1));
        assert_eq!(one[BYTE_LENGTH - 1], 1);
        assert!(one[..BYTE_LENGTH - 1].iter().all(|&b| b == 0));

        let minus_one = trits_to_bytes(&block(-1));
        assert!(minus_one.iter().all(|&b| b == 0xFF));

        let big = trits_to_bytes(&block(0x0102_0304));
        assert_eq!(&big[BYTE_LENGTH - 4..], &[1, 2, 3, 4]);
    }

    #[test]
    fn conversion_round_trips() {
        let source = trytes::to_trits(&format!("{}{}", "HELLOWORLD".repeat(8), "N")).unwrap();
        let mut expected = [0 as Trit; HASH_TRITS];
        expected.copy_from_slice(&source);
        expected[HASH_TRITS - 1] = 0;

        assert_eq!(bytes_to_trits(&trits_to_bytes(&source)), expected);

        for value in [0i64, 7, -7, 123_456_789, -987_654_321] {
            let mut b = block(value);
            b[HASH_TRITS - 1] = 0;
            assert_eq!(bytes_to_trits(&trits_to_bytes(&b)).to_vec(), b);
        }
    }

    #[test]
    fn squeeze_is_deterministic_and_chains() {
        let input = trytes::to_trits(&"ABC".repeat(54)).unwrap();

        let mut first = Kerl::new();
        first.absorb(&input);
        let a1 = first.squeeze();
        let a2 = first.squeeze();

        let mut second = Kerl::new();
        second.absorb(&input);
        assert_eq!(second.squeeze(), a1);
        assert_eq!(second.squeeze(), a2);

        assert_ne!(a1, a2);
        assert_eq!(a1[HASH_TRITS - 1], 0);
    }
}
