//! Cipher primitives for RDA resource archives
//!
//! RDA V2.2 archives protect block headers and file data with a simple XOR
//! cipher over 16-bit little-endian words. The key for each word comes from a
//! linear congruential generator seeded with a fixed constant.
//!
//! # Components
//!
//! - [`Keystream`] - the 15-bit key generator, with stock or custom parameters
//! - [`CipherReader`] - applies the cipher while reading, for any read sizes
//! - [`CipherWriter`] - applies the cipher while writing, for any write sizes
//!
//! The transform is symmetric: the same operation encrypts and decrypts.
//!
//! # Examples
//!
//! ## Decrypting a block
//!
//! ```
//! use rda_crypto::CipherReader;
//! use std::io::Read;
//!
//! let encrypted = [0xD6, 0x63, 0x90, 0x19, 0x55, 0x39, 0x96, 0x23];
//! let mut plain = Vec::new();
//! CipherReader::new(encrypted.as_slice()).read_to_end(&mut plain).unwrap();
//!
//! let units: Vec<u16> = plain
//!     .chunks_exact(2)
//!     .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
//!     .collect();
//! assert_eq!(String::from_utf16(&units).unwrap(), "data");
//! ```
//!
//! ## Encrypting in place
//!
//! ```
//! use rda_crypto::Keystream;
//!
//! let mut data = *b"payload";
//! Keystream::default().apply_keystream(&mut data);
//! Keystream::default().apply_keystream(&mut data);
//! assert_eq!(&data, b"payload");
//! ```

#![warn(missing_docs)]

pub mod keystream;
pub mod stream;

pub use keystream::{DEFAULT_INCREMENT, DEFAULT_MULTIPLIER, DEFAULT_SEED, Keystream};
pub use stream::{CipherReader, CipherWriter};
