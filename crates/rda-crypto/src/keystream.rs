//! Linear congruential keystream used by RDA block encryption.
//!
//! The generator keeps a 32-bit state and advances it with
//! `x = x * multiplier + increment` (wrapping). Each step yields a 15-bit key
//! taken from bits 16..31 of the new state, so bit 15 of a key is always zero.
//!
//! ## Usage
//!
//! ```rust
//! use rda_crypto::keystream::Keystream;
//!
//! let mut keystream = Keystream::default();
//! keystream.advance();
//! assert_eq!(keystream.current(), 0x63B2);
//!
//! keystream.reset();
//! assert_eq!(keystream.next(), Some(0x63B2));
//! ```

/// Seed used by every encrypted RDA V2.2 block
pub const DEFAULT_SEED: u32 = 0x71C7_1C71;

/// Multiplier of the stock generator
pub const DEFAULT_MULTIPLIER: u32 = 214_013;

/// Increment of the stock generator
pub const DEFAULT_INCREMENT: u32 = 2_531_011;

/// Deterministic 15-bit keystream generator.
///
/// [`current`](Self::current) is stable until [`advance`](Self::advance) is
/// called again. The [`Iterator`] implementation advances first and then
/// yields the new key, which is the order the cipher consumes keys in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keystream {
    seed: u32,
    multiplier: u32,
    increment: u32,
    state: u32,
}

impl Keystream {
    /// Create a generator with the stock multiplier and increment.
    pub const fn new(seed: u32) -> Self {
        Self::with_parameters(seed, DEFAULT_MULTIPLIER, DEFAULT_INCREMENT)
    }

    /// Create a generator with custom parameters.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rda_crypto::keystream::Keystream;
    ///
    /// let keys: Vec<u16> = Keystream::with_parameters(73258, 312988, 92122)
    ///     .take(2)
    ///     .collect();
    /// assert_eq!(keys, [0x56AC, 0x2479]);
    /// ```
    pub const fn with_parameters(seed: u32, multiplier: u32, increment: u32) -> Self {
        Self {
            seed,
            multiplier,
            increment,
            state: seed,
        }
    }

    /// Step the generator once.
    pub fn advance(&mut self) {
        self.state = self
            .state
            .wrapping_mul(self.multiplier)
            .wrapping_add(self.increment);
    }

    /// Key derived from the current state.
    pub const fn current(&self) -> u16 {
        ((self.state >> 16) & 0x7FFF) as u16
    }

    /// Restore the state to the seed the generator was created with.
    pub fn reset(&mut self) {
        self.state = self.seed;
    }

    /// Seed the generator was created with
    pub const fn seed(&self) -> u32 {
        self.seed
    }

    /// Advance and XOR one little-endian word with the new key.
    pub fn apply_word(&mut self, word: [u8; 2]) -> [u8; 2] {
        self.advance();
        (u16::from_le_bytes(word) ^ self.current()).to_le_bytes()
    }

    /// Apply the keystream to a whole buffer in place.
    ///
    /// Every complete 16-bit word is transformed; an odd trailing byte is
    /// left untouched. Encoding and decoding are the same operation. For
    /// data arriving in arbitrary chunks use the stream adaptors in
    /// [`crate::stream`], which keep the word pairing across calls.
    pub fn apply_keystream(&mut self, data: &mut [u8]) {
        for word in data.chunks_exact_mut(2) {
            let transformed = self.apply_word([word[0], word[1]]);
            word.copy_from_slice(&transformed);
        }
    }
}

impl Default for Keystream {
    fn default() -> Self {
        Self::new(DEFAULT_SEED)
    }
}

impl Iterator for Keystream {
    type Item = u16;

    fn next(&mut self) -> Option<u16> {
        self.advance();
        Some(self.current())
    }
}
