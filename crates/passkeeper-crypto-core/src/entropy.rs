//! Buffered entropy pool feeding the generators.
//!
//! The pool holds 256 bits of system CSPRNG output and hands them out in
//! draws of 1–32 bits. Bits are consumed most-significant-first; a draw that
//! runs past the end of the buffer takes the residual bits, refills from the
//! CSPRNG, and completes from the fresh buffer. Consumed bits are cleared so
//! no bit can ever be handed out twice.
//!
//! There is no caller-supplied seed: reproducible output would be a
//! vulnerability, not a feature. A process-wide instance behind a mutex is
//! available via [`EntropyPool::global`] for the command-line front-ends.

use std::fmt;
use std::sync::{Mutex, OnceLock};

use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

use crate::error::CryptoError;

/// Pool size in bytes (256 bits).
pub const POOL_BYTES: usize = 32;

/// Pool size in bits.
const POOL_BITS: usize = POOL_BYTES * 8;

/// Largest draw a single call may request.
pub const MAX_DRAW_BITS: u32 = 32;

static GLOBAL: OnceLock<Mutex<EntropyPool>> = OnceLock::new();

/// A CSPRNG-refilled bit buffer.
pub struct EntropyPool {
    buf: [u8; POOL_BYTES],
    /// Bits consumed from the front of `buf`. `POOL_BITS` means exhausted.
    bit_pos: usize,
    /// Test pools carry a fixed buffer and refuse to refill.
    #[cfg(test)]
    refill_fails: bool,
}

impl EntropyPool {
    /// Create an empty pool. The first draw triggers the first CSPRNG fill.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buf: [0u8; POOL_BYTES],
            bit_pos: POOL_BITS,
            #[cfg(test)]
            refill_fails: false,
        }
    }

    /// The process-wide pool, constructed lazily.
    ///
    /// All draws serialize on the mutex; an interrupted draw cannot happen,
    /// so the uniformity contract holds across threads.
    pub fn global() -> &'static Mutex<Self> {
        GLOBAL.get_or_init(|| Mutex::new(Self::new()))
    }

    /// A pool preloaded with a fixed buffer whose refill always fails.
    /// Drives the deterministic generator vectors and exhaustion tests.
    #[cfg(test)]
    pub(crate) const fn seeded(buf: [u8; POOL_BYTES]) -> Self {
        Self {
            buf,
            bit_pos: 0,
            refill_fails: true,
        }
    }

    /// Draw `n` bits (1 ≤ n ≤ 32) as a uniform unsigned integer.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Generation`] if `n` is out of range and
    /// [`CryptoError::Entropy`] if the CSPRNG refuses a refill. A failed
    /// refill consumes the residual bits; the caller must abort rather than
    /// use any partial value.
    // Bit indices are bounded by POOL_BITS and shifts by 8/32, so the
    // arithmetic below cannot overflow.
    #[allow(clippy::arithmetic_side_effects)]
    pub fn draw_bits(&mut self, n: u32) -> Result<u32, CryptoError> {
        if !(1..=MAX_DRAW_BITS).contains(&n) {
            return Err(CryptoError::Generation(format!(
                "bit draw out of range: {n} (expected 1..=32)"
            )));
        }

        let mut out: u32 = 0;
        for _ in 0..n {
            if self.bit_pos == POOL_BITS {
                self.refill()?;
            }
            let byte = self.bit_pos / 8;
            let shift = 7 - (self.bit_pos % 8);
            let bit = (self.buf[byte] >> shift) & 1;
            out = (out << 1) | u32::from(bit);
            // Clear the consumed bit so it cannot be reused.
            self.buf[byte] &= !(1u8 << shift);
            self.bit_pos += 1;
        }
        Ok(out)
    }

    /// Unread bits left before the next refill.
    #[cfg(test)]
    pub(crate) const fn remaining_bits(&self) -> usize {
        POOL_BITS - self.bit_pos
    }

    fn refill(&mut self) -> Result<(), CryptoError> {
        #[cfg(test)]
        if self.refill_fails {
            return Err(CryptoError::Entropy("test pool exhausted".into()));
        }
        OsRng
            .try_fill_bytes(&mut self.buf)
            .map_err(|e| CryptoError::Entropy(format!("CSPRNG refill failed: {e}")))?;
        self.bit_pos = 0;
        Ok(())
    }
}

impl Default for EntropyPool {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EntropyPool {
    fn drop(&mut self) {
        self.buf.zeroize();
    }
}

impl fmt::Debug for EntropyPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the buffer — unread bits are future secrets.
        f.debug_struct("EntropyPool")
            .field("bit_pos", &self.bit_pos)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern_buf() -> [u8; POOL_BYTES] {
        let mut buf = [0u8; POOL_BYTES];
        for (i, b) in buf.iter_mut().enumerate() {
            *b = u8::try_from(i).unwrap();
        }
        buf
    }

    #[test]
    fn draws_consume_most_significant_bits_first() {
        let mut pool = EntropyPool::seeded([0xAB; POOL_BYTES]);
        assert_eq!(pool.draw_bits(8).unwrap(), 0xAB);
        // 0xAB = 1010_1011 — the next 4 bits are the high nibble of the
        // second byte.
        assert_eq!(pool.draw_bits(4).unwrap(), 0xA);
        assert_eq!(pool.draw_bits(4).unwrap(), 0xB);
        assert_eq!(pool.draw_bits(1).unwrap(), 1);
        assert_eq!(pool.draw_bits(1).unwrap(), 0);
    }

    #[test]
    fn wide_draw_spans_bytes() {
        let mut pool = EntropyPool::seeded(pattern_buf());
        assert_eq!(pool.draw_bits(32).unwrap(), 0x0001_0203);
        assert_eq!(pool.draw_bits(32).unwrap(), 0x0405_0607);
        assert_eq!(pool.draw_bits(16).unwrap(), 0x0809);
    }

    #[test]
    fn unaligned_draws_keep_the_stream_contiguous() {
        let mut pool = EntropyPool::seeded(pattern_buf());
        // 0x00 0x01 0x02 = 0000_0000 0000_0001 0000_0010
        assert_eq!(pool.draw_bits(3).unwrap(), 0b000);
        assert_eq!(pool.draw_bits(7).unwrap(), 0b0_0000_00);
        assert_eq!(pool.draw_bits(6).unwrap(), 0b00_0001);
        assert_eq!(pool.draw_bits(8).unwrap(), 0b0000_0010);
    }

    #[test]
    fn rejects_out_of_range_draws() {
        let mut pool = EntropyPool::new();
        assert!(matches!(
            pool.draw_bits(0),
            Err(CryptoError::Generation(_))
        ));
        assert!(matches!(
            pool.draw_bits(33),
            Err(CryptoError::Generation(_))
        ));
    }

    #[test]
    fn lazy_pool_refills_on_first_draw() {
        let mut pool = EntropyPool::new();
        assert_eq!(pool.remaining_bits(), 0);
        pool.draw_bits(32).unwrap();
        assert_eq!(pool.remaining_bits(), POOL_BITS - 32);
    }

    #[test]
    fn draws_refill_across_the_boundary() {
        let mut pool = EntropyPool::new();
        for _ in 0..8 {
            pool.draw_bits(32).unwrap();
        }
        assert_eq!(pool.remaining_bits(), 0);
        // The next draw crosses into a fresh buffer.
        pool.draw_bits(20).unwrap();
        assert_eq!(pool.remaining_bits(), POOL_BITS - 20);
    }

    #[test]
    fn residual_draw_with_failed_refill_errors() {
        let mut pool = EntropyPool::seeded([0u8; POOL_BYTES]);
        for _ in 0..7 {
            pool.draw_bits(32).unwrap();
        }
        assert_eq!(pool.remaining_bits(), 32);
        pool.draw_bits(26).unwrap();
        // 6 bits left; a 8-bit draw takes them and then fails to refill.
        assert!(matches!(pool.draw_bits(8), Err(CryptoError::Entropy(_))));
    }

    #[test]
    fn consumed_bits_are_cleared() {
        let mut pool = EntropyPool::seeded([0xFF; POOL_BYTES]);
        pool.draw_bits(12).unwrap();
        assert_eq!(pool.buf[0], 0x00);
        assert_eq!(pool.buf[1], 0x0F);
    }

    #[test]
    fn debug_output_hides_the_buffer() {
        let pool = EntropyPool::seeded([0xAB; POOL_BYTES]);
        let debug = format!("{pool:?}");
        assert!(!debug.contains("171"));
        assert!(!debug.contains("ab"));
    }

    #[test]
    fn global_pool_draws() {
        let mut pool = EntropyPool::global().lock().unwrap();
        let value = pool.draw_bits(32).unwrap();
        // Any u32 is valid; the point is that the shared pool works.
        let _ = value;
    }
}
