//! Tryte alphabet and balanced-ternary conversions.
//!
//! A tryte is one of 27 characters, `9` and `A`..`Z`, each standing for a
//! value in `-13..=13` (three balanced trits, least significant first).

/// The tryte alphabet in value order: `9` = 0, `A` = 1 … `M` = 13, `N` = -13 … `Z` = -1.
pub const TRYTE_ALPHABET: &[u8; 27] = b"9ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Trytes in an address without checksum.
pub const ADDRESS_LENGTH: usize = 81;
/// Trytes in an address carrying its 9-tryte checksum.
pub const ADDRESS_WITH_CHECKSUM_LENGTH: usize = 90;
/// Trytes in a tag field.
pub const TAG_LENGTH: usize = 27;
/// Trytes in a transaction hash.
pub const HASH_LENGTH: usize = 81;

/// A single balanced trit, -1, 0 or 1.
pub type Trit = i8;

/// Whether every character of `s` belongs to the tryte alphabet.
pub fn is_trytes(s: &str) -> bool {
    s.bytes().all(|b| b == b'9' || b.is_ascii_uppercase())
}

/// Number of trytes `encode` produces for `bytes`.
pub fn encoded_len(bytes: &[u8]) -> usize {
    bytes.len() * 2
}

/// Encode raw bytes into trytes, two trytes per byte.
pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(encoded_len(bytes));
    for &b in bytes {
        out.push(TRYTE_ALPHABET[(b % 27) as usize] as char);
        out.push(TRYTE_ALPHABET[(b / 27) as usize] as char);
    }
    out
}

/// Decode trytes produced by [`encode`]. Trailing `9` padding is ignored.
///
/// Returns `None` when the input is not valid trytes or a pair encodes a
/// value above 255.
pub fn decode(trytes: &str) -> Option<Vec<u8>> {
    let trimmed = trytes.trim_end_matches('9');
    let padded_len = trimmed.len() + trimmed.len() % 2;
    let padded = format!("{:9<width$}", trimmed, width = padded_len);

    padded
        .as_bytes()
        .chunks(2)
        .map(|pair| {
            let low = tryte_index(pair[0])? as u16;
            let high = tryte_index(pair[1])? as u16;
            u8::try_from(low + high * 27).ok()
        })
        .collect()
}

/// Strip the 9-tryte checksum from an address, if present.
pub fn no_checksum(address: &str) -> &str {
    if address.len() == ADDRESS_WITH_CHECKSUM_LENGTH {
        &address[..ADDRESS_LENGTH]
    } else {
        address
    }
}

/// Right-pad `trytes` with `9` up to `len`.
pub fn pad(trytes: &str, len: usize) -> String {
    format!("{:9<width$}", trytes, width = len)
}

fn tryte_index(c: u8) -> Option<u8> {
    match c {
        b'9' => Some(0),
        b'A'..=b'Z' => Some(c - b'A' + 1),
        _ => None,
    }
}

/// Balanced value of a tryte character.
pub fn tryte_value(c: u8) -> Option<i8> {
    tryte_index(c).map(|i| if i > 13 { i as i8 - 27 } else { i as i8 })
}

/// Tryte character for a balanced value in `-13..=13`.
pub fn value_tryte(value: i8) -> char {
    let index = if value < 0 { value + 27 } else { value };
    TRYTE_ALPHABET[index as usize] as char
}

/// Expand trytes to trits, three per tryte.
pub fn to_trits(trytes: &str) -> Option<Vec<Trit>> {
    let mut trits = Vec::with_capacity(trytes.len() * 3);
    for c in trytes.bytes() {
        let mut value = tryte_value(c)?;
        for _ in 0..3 {
            let (trit, rest) = split_trit(value as i64);
            trits.push(trit);
            value = rest as i8;
        }
    }
    Some(trits)
}

/// Collapse trits into trytes. A trailing partial tryte is zero-filled.
pub fn from_trits(trits: &[Trit]) -> String {
    trits
        .chunks(3)
        .map(|chunk| {
            let value = chunk
                .iter()
                .rev()
                .fold(0i8, |acc, &t| acc * 3 + t);
            value_tryte(value)
        })
        .collect()
}

/// Balanced-ternary representation of `value` in exactly `len` trits.
pub fn int_to_trits(value: i64, len: usize) -> Vec<Trit> {
    let mut trits = Vec::with_capacity(len);
    let mut rest = value;
    for _ in 0..len {
        let (trit, next) = split_trit(rest);
        trits.push(trit);
        rest = next;
    }
    trits
}

/// Integer value of little-endian balanced trits.
pub fn trits_to_int(trits: &[Trit]) -> i64 {
    trits.iter().rev().fold(0i64, |acc, &t| acc * 3 + t as i64)
}

/// Balanced-ternary representation of `value` in `len` trits, as trytes.
pub fn int_to_trytes(value: i64, len_trytes: usize) -> String {
    from_trits(&int_to_trits(value, len_trytes * 3))
}

/// Add one to a little-endian trit number, wrapping on overflow.
pub fn increment(trits: &mut [Trit]) {
    for trit in trits.iter_mut() {
        if *trit == 1 {
            *trit = -1;
        } else {
            *trit += 1;
            return;
        }
    }
}

fn split_trit(value: i64) -> (Trit, i64) {
    let rem = value.rem_euclid(3);
    let quotient = value.div_euclid(3);
    if rem == 2 {
        (-1, quotient + 1)
    } else {
        (rem as Trit, quotient)
    }
}
