//! Secret generators — uniform numbers, PINs, passwords, hex keys, and
//! pronounceable names.
//!
//! Every generator drains a caller-supplied [`EntropyPool`] and nothing
//! else, so the draw sequence fully determines the output. On a pool
//! failure the fallible generators return an error and no partial secret;
//! [`make_name`] instead returns the prefix built so far — names are
//! suggestions, not secrets, and callers treat a short one as usable.

mod tables;

use std::fmt::Write as _;

use crate::entropy::EntropyPool;
use crate::error::CryptoError;

use tables::Literal;

/// The fixed 64-symbol password alphabet.
///
/// Letters that read as digits (I, O, l, o — and B for 8) are excluded;
/// the trailing eight symbols survive common password policies. One 6-bit
/// draw indexes one symbol, so order is frozen.
pub const PASSWORD_ALPHABET: &[u8; 64] =
    b"ACDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnpqrstuvwxyz0123456789#*?:+=_";

const HEX_ALPHABET: &[u8; 16] = b"0123456789abcdef";

/// Digits per PIN block; one 16-bit draw covers one block.
const PIN_BLOCK_DIGITS: usize = 4;

/// Draw a uniform integer in `[0, modulo)`.
///
/// Uses a 64-bit draw so the modulo bias stays below 2⁻³² for any
/// `modulo` that fits in a `u32`.
///
/// # Errors
///
/// Returns [`CryptoError::Generation`] if `modulo` is zero and
/// [`CryptoError::Entropy`] if the pool cannot refill.
pub fn make_number(pool: &mut EntropyPool, modulo: u32) -> Result<u32, CryptoError> {
    if modulo == 0 {
        return Err(CryptoError::Generation("modulo must be non-zero".into()));
    }
    let hi = pool.draw_bits(32)?;
    let lo = pool.draw_bits(32)?;
    let wide = (u64::from(hi) << 32) | u64::from(lo);
    // modulo is checked non-zero above; the remainder fits a u32.
    #[allow(clippy::arithmetic_side_effects, clippy::cast_possible_truncation)]
    let reduced = (wide % u64::from(modulo)) as u32;
    Ok(reduced)
}

/// Generate a decimal PIN of exactly `length` digits.
///
/// Digits come in blocks of four: one 16-bit draw reduced modulo 10 000,
/// zero-padded, with the tail truncated to `length`. The block width is a
/// compatibility point — existing deployments were generated this way.
///
/// # Errors
///
/// Returns [`CryptoError::Entropy`] if the pool cannot refill; no partial
/// PIN is returned.
pub fn make_pin(pool: &mut EntropyPool, length: usize) -> Result<String, CryptoError> {
    let mut pin = String::with_capacity(length.saturating_add(PIN_BLOCK_DIGITS));
    while pin.len() < length {
        let block = pool.draw_bits(16)? % 10_000;
        write!(pin, "{block:04}").expect("String formatting cannot fail");
    }
    pin.truncate(length);
    Ok(pin)
}

/// Generate a password of `length` symbols from [`PASSWORD_ALPHABET`].
///
/// One 6-bit draw per symbol — exactly 6 bits of entropy each, no modulo
/// bias.
///
/// # Errors
///
/// Returns [`CryptoError::Entropy`] if the pool cannot refill; no partial
/// password is returned.
pub fn make_password(pool: &mut EntropyPool, length: usize) -> Result<String, CryptoError> {
    let mut password = String::with_capacity(length);
    for _ in 0..length {
        let index = pool.draw_bits(6)?;
        password.push(char::from(PASSWORD_ALPHABET[index as usize]));
    }
    Ok(password)
}

/// Generate a lowercase hex string covering `bytes` random bytes.
///
/// Each byte is one 8-bit draw emitted low nibble first — the established
/// output format of the dump utility, reversed from conventional hex.
///
/// # Errors
///
/// Returns [`CryptoError::Entropy`] if the pool cannot refill.
pub fn make_hex_block(pool: &mut EntropyPool, bytes: usize) -> Result<String, CryptoError> {
    let mut out = String::with_capacity(bytes.saturating_mul(2));
    for _ in 0..bytes {
        let byte = pool.draw_bits(8)?;
        out.push(char::from(HEX_ALPHABET[(byte & 0x0F) as usize]));
        out.push(char::from(HEX_ALPHABET[(byte >> 4) as usize]));
    }
    Ok(out)
}

/// Generate a pronounceable pseudo-word of `min_syllables` to
/// `max_syllables` syllables.
///
/// A syllable is onset consonant(s) plus a vowel, drawn from the weighted
/// tables in this module; a word-ending cluster finishes the name. The
/// syllable count is the sum of `max − min` single-bit draws above `min`,
/// giving a centered rather than flat distribution.
///
/// On a pool failure the prefix accumulated so far is returned — possibly
/// empty, never fatal to the caller.
#[must_use]
pub fn make_name(pool: &mut EntropyPool, min_syllables: u32, max_syllables: u32) -> String {
    let mut name = String::new();
    // A failed draw leaves the prefix in place.
    let _ = build_name(pool, min_syllables, max_syllables, &mut name);
    name
}

fn build_name(
    pool: &mut EntropyPool,
    min_syllables: u32,
    max_syllables: u32,
    out: &mut String,
) -> Result<(), CryptoError> {
    let extra = max_syllables.saturating_sub(min_syllables);
    let mut count = min_syllables;
    for _ in 0..extra {
        count = count.saturating_add(pool.draw_bits(1)?);
    }

    for i in 0..count {
        let onset = draw_literal(pool, &tables::CONSONANTS)?;
        let t = pool.draw_bits(4)?;
        // A word may open on its vowel; later syllables always keep the onset.
        if !(i == 0 && t < 4) {
            out.push_str(onset.text);
        }
        if t == 0 && onset.can_dup && i != 0 {
            out.push_str(onset.text);
        } else if t >= 12 {
            let second = draw_literal(pool, &tables::CONSONANTS)?;
            let _ = pool.draw_bits(4)?;
            out.push_str(second.text);
        }

        let vowel = draw_literal(pool, &tables::VOWELS)?;
        let t = pool.draw_bits(4)?;
        out.push_str(vowel.text);
        // The first letter of the word is never doubled.
        if t == 0 && vowel.can_dup && out.len() > 1 {
            out.push_str(vowel.text);
        }
    }

    let ending = draw_literal(pool, &tables::WORD_ENDINGS)?;
    out.push_str(ending.text);
    Ok(())
}

fn draw_literal<'t>(
    pool: &mut EntropyPool,
    table: &'t [Literal],
) -> Result<&'t Literal, CryptoError> {
    let mut value = pool.draw_bits(24)?;
    for literal in table {
        if value < literal.weight {
            return Ok(literal);
        }
        value = value.saturating_sub(literal.weight);
    }
    // Weights sum to exactly 2²⁴, so the walk always lands in the table.
    Err(CryptoError::Generation("weight table underflow".into()))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::POOL_BYTES;

    fn zero_pool() -> EntropyPool {
        EntropyPool::seeded([0u8; POOL_BYTES])
    }

    fn pattern_pool() -> EntropyPool {
        let mut buf = [0u8; POOL_BYTES];
        for (i, b) in buf.iter_mut().enumerate() {
            *b = u8::try_from(i).unwrap();
        }
        EntropyPool::seeded(buf)
    }

    // ── Seeded vectors — the draw trace uniquely determines the output ──

    #[test]
    fn number_vector_from_pattern_buffer() {
        // First 64 bits of 00 01 02 … = 0x0001020304050607.
        assert_eq!(make_number(&mut pattern_pool(), 10).unwrap(), 3);
        assert_eq!(make_number(&mut pattern_pool(), 100).unwrap(), 83);
        assert_eq!(make_number(&mut pattern_pool(), 64).unwrap(), 7);
        assert_eq!(
            make_number(&mut pattern_pool(), u32::MAX).unwrap(),
            67_504_138
        );
    }

    #[test]
    fn number_rejects_zero_modulo() {
        assert!(matches!(
            make_number(&mut zero_pool(), 0),
            Err(CryptoError::Generation(_))
        ));
    }

    #[test]
    fn pin_all_zero_block_is_0000() {
        assert_eq!(make_pin(&mut zero_pool(), 4).unwrap(), "0000");
    }

    #[test]
    fn pin_vector_from_pattern_buffer() {
        // 16-bit blocks 0x0001, 0x0203, 0x0405, 0x0607 mod 10000.
        assert_eq!(
            make_pin(&mut pattern_pool(), 16).unwrap(),
            "0001051510291543"
        );
        // The tail block is truncated, not re-drawn.
        assert_eq!(make_pin(&mut pattern_pool(), 6).unwrap(), "000105");
    }

    #[test]
    fn password_all_zero_draws_hit_the_first_symbol() {
        assert_eq!(make_password(&mut zero_pool(), 4).unwrap(), "AAAA");
    }

    #[test]
    fn password_vector_from_pattern_buffer() {
        assert_eq!(
            make_password(&mut pattern_pool(), 12).unwrap(),
            "AAFDA1TGCjfK"
        );
    }

    #[test]
    fn hex_emits_low_nibble_first() {
        let mut pool = EntropyPool::seeded([0xAB; POOL_BYTES]);
        assert_eq!(make_hex_block(&mut pool, 1).unwrap(), "ba");
    }

    #[test]
    fn hex_vector_from_pattern_buffer() {
        assert_eq!(
            make_hex_block(&mut pattern_pool(), 6).unwrap(),
            "001020304050"
        );
    }

    #[test]
    fn name_vector_all_zero_draws() {
        // Zero draws walk to the highest-weight literals: dropped first
        // onset, doubled 'n' and 'e' in later syllables, empty ending.
        assert_eq!(make_name(&mut zero_pool(), 3, 3), "enneennee");
    }

    #[test]
    fn name_vector_pattern_buffer() {
        assert_eq!(make_name(&mut pattern_pool(), 2, 5), "oter");
    }

    #[test]
    fn name_returns_prefix_on_pool_exhaustion() {
        // Five zero-seeded syllables need 304 bits; the buffer holds 256.
        assert_eq!(make_name(&mut zero_pool(), 5, 5), "enneenneenneenn");
    }

    #[test]
    fn fallible_generators_return_no_partial_output() {
        let mut pool = zero_pool();
        // Drain the fixed buffer to 8 remaining bits.
        for _ in 0..7 {
            pool.draw_bits(32).unwrap();
        }
        pool.draw_bits(24).unwrap();
        assert!(matches!(
            make_password(&mut pool, 4),
            Err(CryptoError::Entropy(_))
        ));
        assert!(matches!(
            make_pin(&mut zero_pool_with_bits(8), 4),
            Err(CryptoError::Entropy(_))
        ));
    }

    fn zero_pool_with_bits(bits: usize) -> EntropyPool {
        let mut pool = zero_pool();
        let mut to_drain = 256 - bits;
        while to_drain > 0 {
            let step = to_drain.min(32);
            pool.draw_bits(u32::try_from(step).unwrap()).unwrap();
            to_drain -= step;
        }
        pool
    }

    // ── Live-CSPRNG invariants ─────────────────────────────────────────

    #[test]
    fn pin_length_and_digits_up_to_1024() {
        let mut pool = EntropyPool::new();
        for length in [1, 4, 5, 16, 1024] {
            let pin = make_pin(&mut pool, length).unwrap();
            assert_eq!(pin.len(), length);
            assert!(pin.bytes().all(|b| b.is_ascii_digit()), "bad pin: {pin}");
        }
    }

    #[test]
    fn password_symbols_stay_in_the_alphabet() {
        let mut pool = EntropyPool::new();
        for _ in 0..50 {
            let password = make_password(&mut pool, 24).unwrap();
            assert_eq!(password.len(), 24);
            assert!(password
                .bytes()
                .all(|b| PASSWORD_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn hex_output_is_lowercase_hex_of_expected_length() {
        let mut pool = EntropyPool::new();
        let block = make_hex_block(&mut pool, 16).unwrap();
        assert_eq!(block.len(), 32);
        assert!(block.bytes().all(|b| HEX_ALPHABET.contains(&b)));
    }

    #[test]
    fn names_are_lowercase_ascii() {
        let mut pool = EntropyPool::new();
        for _ in 0..200 {
            let name = make_name(&mut pool, 2, 5);
            assert!(!name.is_empty());
            assert!(
                name.bytes().all(|b| b.is_ascii_lowercase()),
                "bad name: {name}"
            );
        }
    }

    #[test]
    fn number_stays_below_modulo() {
        let mut pool = EntropyPool::new();
        for modulo in [1, 2, 10, 1000, u32::MAX] {
            for _ in 0..100 {
                assert!(make_number(&mut pool, modulo).unwrap() < modulo);
            }
        }
    }

    // ── Distribution quality ───────────────────────────────────────────

    /// Pearson χ² against a uniform expectation.
    fn chi_squared(counts: &[u64], draws: u64) -> f64 {
        let expected = draws as f64 / counts.len() as f64;
        counts
            .iter()
            .map(|&c| {
                let d = c as f64 - expected;
                d * d / expected
            })
            .sum()
    }

    #[test]
    fn number_uniformity_chi_squared() {
        let mut pool = EntropyPool::new();
        // Thresholds sit ~5σ above the χ² mean for each df — a failure
        // indicates a broken reduction, not an unlucky run.
        for (modulo, draws, threshold) in
            [(10u32, 200_000u64, 35.0), (64, 100_000, 120.0), (100, 100_000, 170.0)]
        {
            let mut counts = vec![0u64; modulo as usize];
            for _ in 0..draws {
                counts[make_number(&mut pool, modulo).unwrap() as usize] += 1;
            }
            let chi2 = chi_squared(&counts, draws);
            assert!(
                chi2 < threshold,
                "chi² {chi2} over threshold {threshold} for modulo {modulo}"
            );
        }
    }

    #[test]
    fn password_per_position_entropy() {
        const SAMPLES: usize = 40_000;
        const LENGTH: usize = 4;
        let mut pool = EntropyPool::new();
        let mut counts = vec![[0u64; 64]; LENGTH];
        for _ in 0..SAMPLES {
            let password = make_password(&mut pool, LENGTH).unwrap();
            for (position, byte) in password.bytes().enumerate() {
                let symbol = PASSWORD_ALPHABET
                    .iter()
                    .position(|&a| a == byte)
                    .unwrap();
                counts[position][symbol] += 1;
            }
        }
        for (position, table) in counts.iter().enumerate() {
            let entropy: f64 = table
                .iter()
                .filter(|&&c| c > 0)
                .map(|&c| {
                    let p = c as f64 / SAMPLES as f64;
                    -p * p.log2()
                })
                .sum();
            assert!(
                entropy >= 5.99,
                "position {position} entropy {entropy} below 5.99 bits"
            );
        }
    }
}
