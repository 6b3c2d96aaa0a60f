//! Temporary password generation

use rand::seq::SliceRandom;
use rand::Rng;

const UPPER: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!@#$%^&*";

/// One character from each class is always present
const MIN_LENGTH: usize = 4;

/// Password with at least one upper, lower, digit and symbol; the remaining
/// characters are drawn uniformly from the union, then everything is
/// shuffled
pub fn generate_password<R: Rng + ?Sized>(length: usize, rng: &mut R) -> String {
    let length = length.max(MIN_LENGTH);
    let union: Vec<u8> = [UPPER, LOWER, DIGITS, SYMBOLS].concat();

    let mut chars: Vec<u8> = [UPPER, LOWER, DIGITS, SYMBOLS]
        .iter()
        .filter_map(|class| class.choose(rng).copied())
        .collect();
    while chars.len() < length {
        if let Some(c) = union.choose(rng) {
            chars.push(*c);
        }
    }
    chars.shuffle(rng);

    chars.into_iter().map(char::from).collect()
}
