//! Base32 codec for embedding binary camera frames in a text line.
//!
//! Wire alphabet (RFC 4648 without padding):
//! ```text
//! ABCDEFGHIJKLMNOPQRSTUVWXYZ234567
//! ```
//! Input bytes are consumed 8 bits at a time and re-packed into 5-bit groups,
//! most significant bit first.  A trailing group with fewer than 5 bits is
//! zero-padded in its low bits.  No `=` characters are ever emitted: the
//! decoded length travels out of band in the image descriptor's `size` field.
//!
//! Encoding is plain `BASE32_NOPAD`.  Decoding is hand-written: it accepts
//! lowercase, skips separators, stops once the expected length is reached,
//! and zero-fills whatever it could not decode.

use data_encoding::BASE32_NOPAD;
use thiserror::Error;

/// The 32 output symbols, indexed by 5-bit value.
pub const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Errors reported by [`decode`] and [`decode_into`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Base32Error {
    /// A byte outside the alphabet (and outside the skipped separators) was found.
    #[error("invalid base32 symbol 0x{symbol:02X} at offset {offset}")]
    InvalidSymbol { symbol: u8, offset: usize },

    /// The text ended before `expected` bytes could be produced.
    #[error("base32 text decodes to {decoded} bytes, expected {expected}")]
    LengthMismatch { expected: usize, decoded: usize },
}

/// Returns the number of symbols [`encode`] produces for `len` input bytes.
pub fn encoded_len(len: usize) -> usize {
    (len * 8 + 4) / 5
}

/// Encodes `bytes` into base32 text.
///
/// # Examples
///
/// ```rust
/// use flyt_core::protocol::base32;
///
/// assert_eq!(base32::encode(b"foobar"), "MZXW6YTBOI");
/// assert_eq!(base32::encode(&[]), "");
/// ```
pub fn encode(bytes: &[u8]) -> String {
    BASE32_NOPAD.encode(bytes)
}

/// Decodes `text` into exactly `expected_len` bytes.
///
/// # Errors
///
/// - [`Base32Error::InvalidSymbol`] on the first byte that is neither an
///   alphabet symbol (letters in either case) nor one of the skipped
///   separators: space, tab, CR, LF, `-`.
/// - [`Base32Error::LengthMismatch`] when the text holds fewer than
///   `expected_len` bytes worth of symbols.  A short buffer is never returned.
///
/// # Examples
///
/// ```rust
/// use flyt_core::protocol::base32;
///
/// let bytes = base32::decode("mzxw-6ytb oi", 6).unwrap();
/// assert_eq!(bytes, b"foobar");
/// assert!(base32::decode("MZXW", 6).is_err());
/// ```
pub fn decode(text: &str, expected_len: usize) -> Result<Vec<u8>, Base32Error> {
    // `expected_len` usually comes from the peer; never allocate more than
    // the text can fill.
    check_capacity(text, expected_len)?;
    let mut out = vec![0u8; expected_len];
    decode_into(text, &mut out)?;
    Ok(out)
}

/// Scans `text` the way [`decode_into`] would, without producing output.
fn check_capacity(text: &str, expected_len: usize) -> Result<(), Base32Error> {
    let mut symbols = 0usize;
    for (offset, symbol) in text.bytes().enumerate() {
        if symbols * 5 / 8 >= expected_len {
            return Ok(());
        }
        match symbol {
            b'A'..=b'Z' | b'a'..=b'z' | b'2'..=b'7' => symbols += 1,
            b' ' | b'\t' | b'\r' | b'\n' | b'-' => {}
            _ => return Err(Base32Error::InvalidSymbol { symbol, offset }),
        }
    }
    let decoded = symbols * 5 / 8;
    if decoded < expected_len {
        return Err(Base32Error::LengthMismatch {
            expected: expected_len,
            decoded,
        });
    }
    Ok(())
}

/// Decodes `text` into `out`, filling it completely.
///
/// Decoding stops as soon as `out` is full; symbols after that point are not
/// examined.  On failure the part of `out` that could not be decoded is
/// zero-filled.
///
/// # Errors
///
/// Same as [`decode`].
pub fn decode_into(text: &str, out: &mut [u8]) -> Result<(), Base32Error> {
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;
    let mut count = 0usize;

    for (offset, symbol) in text.bytes().enumerate() {
        if count == out.len() {
            break;
        }

        let value = match symbol {
            b'A'..=b'Z' => symbol - b'A',
            b'a'..=b'z' => symbol - b'a',
            b'2'..=b'7' => symbol - b'2' + 26,
            b' ' | b'\t' | b'\r' | b'\n' | b'-' => continue,
            _ => {
                out[count..].fill(0);
                return Err(Base32Error::InvalidSymbol { symbol, offset });
            }
        };

        buffer = (buffer << 5) | u32::from(value);
        bits += 5;
        if bits >= 8 {
            out[count] = (buffer >> (bits - 8)) as u8;
            count += 1;
            bits -= 8;
            buffer &= (1 << bits) - 1;
        }
    }

    if count < out.len() {
        out[count..].fill(0);
        return Err(Base32Error::LengthMismatch {
            expected: out.len(),
            decoded: count,
        });
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
