//! `crypto_labs` rebuilds textbook primitives from first principles so that
//! every step of the arithmetic stays visible to the reader.
//! RC5-32 block cipher with a padded, chained mode of operation.
//!
//! ## Block primitive
//!
//! A block is two 32-bit little-endian words `(A, B)`.  The key schedule
//! expands the key into `2(r + 1)` words seeded from the magic constants
//! `P32` and `Q32`, then mixes the key words in over `3·max(|S|, |L|)` steps.
//! Encryption whitens with `S[0], S[1]` and runs `r` data-dependent rotation
//! rounds; decryption is the exact inverse.
//!
//! ## Chained mode
//!
//! [`encrypt`] derives the key from a password, draws an 8-byte IV from two
//! generator outputs, pads the plaintext to a multiple of 8 bytes and chains
//! blocks CBC-style.  The payload is `E(IV) ‖ C_1 ‖ … ‖ C_n`: unlike textbook
//! CBC the IV travels encrypted under the block primitive.  The layout is kept
//! as is for compatibility with existing payloads.
//!
//! There is no authentication tag.  A padding failure on decrypt signals a
//! wrong password or corruption, but a wrong password can also yield garbage
//! that happens to carry valid padding.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LabError, Result};
use crate::kdf::derive_key;
use crate::prng::{Lcg, LcgParams};

/// The only supported word size, in bits.
pub const WORD_SIZE: u32 = 32;

/// Block size in bytes: two 32-bit words.
pub const BLOCK_SIZE: usize = 8;

/// Largest accepted round count.
pub const MAX_ROUNDS: usize = 255;

/// Largest accepted key length in bytes.
pub const MAX_KEY_LENGTH: usize = 255;

const P32: u32 = 0xB7E1_5163;
const Q32: u32 = 0x9E37_79B9;

/// One cipher block.
pub type Block = [u8; BLOCK_SIZE];

/// Cipher parameters `{w, r, b}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CipherConfig {
    /// Word size in bits; must be 32.
    pub word_size: u32,
    /// Number of rounds `r`.
    pub rounds: usize,
    /// Key length `b` in bytes.
    pub key_length: usize,
}

impl Default for CipherConfig {
    fn default() -> Self {
        Self {
            word_size: WORD_SIZE,
            rounds: 12,
            key_length: 16,
        }
    }
}

impl CipherConfig {
    /// Rejects unsupported word sizes and out-of-range rounds or key lengths.
    pub fn validate(&self) -> Result<()> {
        if self.word_size != WORD_SIZE {
            return Err(LabError::UnsupportedWordSize(self.word_size));
        }
        if self.rounds > MAX_ROUNDS {
            return Err(LabError::CipherParameterOutOfRange {
                name: "rounds",
                value: self.rounds,
                max: MAX_ROUNDS,
            });
        }
        if self.key_length > MAX_KEY_LENGTH {
            return Err(LabError::CipherParameterOutOfRange {
                name: "key_length",
                value: self.key_length,
                max: MAX_KEY_LENGTH,
            });
        }
        Ok(())
    }
}

/// An RC5-32 instance owning its expanded key schedule.
#[derive(Clone)]
pub struct Rc5 {
    rounds: usize,
    schedule: Vec<u32>,
}

impl fmt::Debug for Rc5 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rc5")
            .field("rounds", &self.rounds)
            .field("schedule_words", &self.schedule.len())
            .finish()
    }
}

impl Rc5 {
    /// Builds the key schedule from at most `config.key_length` bytes of `key`.
    pub fn new(key: &[u8], config: &CipherConfig) -> Result<Self> {
        config.validate()?;
        let key = &key[..key.len().min(config.key_length)];
        Ok(Self {
            rounds: config.rounds,
            schedule: expand_key(key, config.rounds),
        })
    }

    /// Expanded key words `S[0..2(r + 1)]`.
    pub fn schedule(&self) -> &[u32] {
        &self.schedule
    }

    /// Encrypts the word pair `(A, B)`.
    pub fn encrypt_words(&self, [a, b]: [u32; 2]) -> [u32; 2] {
        let s = &self.schedule;
        let mut a = a.wrapping_add(s[0]);
        let mut b = b.wrapping_add(s[1]);
        for i in 1..=self.rounds {
            a = (a ^ b).rotate_left(b % WORD_SIZE).wrapping_add(s[2 * i]);
            b = (b ^ a).rotate_left(a % WORD_SIZE).wrapping_add(s[2 * i + 1]);
        }
        [a, b]
    }

    /// Inverts [`Rc5::encrypt_words`].
    pub fn decrypt_words(&self, [a, b]: [u32; 2]) -> [u32; 2] {
        let s = &self.schedule;
        let (mut a, mut b) = (a, b);
        for i in (1..=self.rounds).rev() {
            b = b.wrapping_sub(s[2 * i + 1]).rotate_right(a % WORD_SIZE) ^ a;
            a = a.wrapping_sub(s[2 * i]).rotate_right(b % WORD_SIZE) ^ b;
        }
        [a.wrapping_sub(s[0]), b.wrapping_sub(s[1])]
    }

    /// Encrypts one block independently of any other (ECB primitive).
    pub fn encrypt_block(&self, block: &Block) -> Block {
        words_to_block(self.encrypt_words(block_to_words(block)))
    }

    /// Decrypts one block independently of any other (ECB primitive).
    pub fn decrypt_block(&self, block: &Block) -> Block {
        words_to_block(self.decrypt_words(block_to_words(block)))
    }

    /// Chains `plaintext` under `iv` and returns `E(iv) ‖ ciphertext`.
    pub fn encrypt_cbc(&self, iv: &Block, plaintext: &[u8]) -> Vec<u8> {
        let padded = pad(plaintext, BLOCK_SIZE);
        let mut out = Vec::with_capacity(BLOCK_SIZE + padded.len());
        out.extend_from_slice(&self.encrypt_block(iv));
        let mut previous = *iv;
        for chunk in padded.chunks_exact(BLOCK_SIZE) {
            let mut block = previous;
            xor_in_place(&mut block, chunk);
            previous = self.encrypt_block(&block);
            out.extend_from_slice(&previous);
        }
        out
    }

    /// Reverses [`Rc5::encrypt_cbc`] and strips the padding.
    pub fn decrypt_cbc(&self, payload: &[u8]) -> Result<Vec<u8>> {
        if payload.len() < 2 * BLOCK_SIZE {
            return Err(LabError::CiphertextTooShort { len: payload.len() });
        }
        if payload.len() % BLOCK_SIZE != 0 {
            return Err(LabError::CiphertextMisaligned { len: payload.len() });
        }
        let mut blocks = payload.chunks_exact(BLOCK_SIZE).map(to_block);
        let mut previous = match blocks.next() {
            Some(encrypted_iv) => self.decrypt_block(&encrypted_iv),
            None => return Err(LabError::CiphertextTooShort { len: payload.len() }),
        };
        let mut plaintext = Vec::with_capacity(payload.len() - BLOCK_SIZE);
        for block in blocks {
            let mut decrypted = self.decrypt_block(&block);
            xor_in_place(&mut decrypted, &previous);
            plaintext.extend_from_slice(&decrypted);
            previous = block;
        }
        let len = unpad(&plaintext, BLOCK_SIZE)?.len();
        plaintext.truncate(len);
        Ok(plaintext)
    }
}

fn expand_key(key: &[u8], rounds: usize) -> Vec<u32> {
    let c = key.len().div_ceil(4).max(1);
    let mut l = vec![0u32; c];
    for (i, &byte) in key.iter().enumerate() {
        l[i / 4] |= u32::from(byte) << (8 * (i % 4));
    }

    let t = 2 * (rounds + 1);
    let mut s = Vec::with_capacity(t);
    s.push(P32);
    for i in 1..t {
        s.push(s[i - 1].wrapping_add(Q32));
    }

    let (mut a, mut b) = (0u32, 0u32);
    let (mut i, mut j) = (0usize, 0usize);
    for _ in 0..3 * t.max(c) {
        a = s[i].wrapping_add(a).wrapping_add(b).rotate_left(3);
        s[i] = a;
        b = l[j]
            .wrapping_add(a)
            .wrapping_add(b)
            .rotate_left(a.wrapping_add(b) % WORD_SIZE);
        l[j] = b;
        i = (i + 1) % t;
        j = (j + 1) % c;
    }
    s
}

#[inline]
fn block_to_words(block: &Block) -> [u32; 2] {
    [
        u32::from_le_bytes([block[0], block[1], block[2], block[3]]),
        u32::from_le_bytes([block[4], block[5], block[6], block[7]]),
    ]
}

#[inline]
fn words_to_block([a, b]: [u32; 2]) -> Block {
    let mut out = [0u8; BLOCK_SIZE];
    out[..4].copy_from_slice(&a.to_le_bytes());
    out[4..].copy_from_slice(&b.to_le_bytes());
    out
}

#[inline]
fn to_block(chunk: &[u8]) -> Block {
    let mut out = [0u8; BLOCK_SIZE];
    out.copy_from_slice(chunk);
    out
}

#[inline]
fn xor_in_place(dst: &mut Block, src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= s;
    }
}

/// Appends 1..=`block_size` bytes, each equal to the number of bytes appended.
pub fn pad(data: &[u8], block_size: usize) -> Vec<u8> {
    let padding = block_size - data.len() % block_size;
    let mut out = Vec::with_capacity(data.len() + padding);
    out.extend_from_slice(data);
    out.resize(data.len() + padding, padding as u8);
    out
}

/// Strips padding added by [`pad`].
///
/// Only the trailing byte is inspected: it must be in `1..=block_size` and no
/// larger than the data.  Empty input is returned unchanged.
pub fn unpad(data: &[u8], block_size: usize) -> Result<&[u8]> {
    let Some(&last) = data.last() else {
        return Ok(data);
    };
    let padding = usize::from(last);
    if padding == 0 || padding > block_size || padding > data.len() {
        return Err(LabError::InvalidPadding);
    }
    Ok(&data[..data.len() - padding])
}

/// Builds an IV from two consecutive outputs of a fresh generator.
pub fn generate_iv(params: &LcgParams) -> Result<Block> {
    if params.m > 1 << 32 {
        return Err(LabError::IvModulusTooLarge(params.m));
    }
    let mut lcg = Lcg::new(*params)?;
    // m ≤ 2^32 keeps every output within a u32.
    let first = lcg.advance() as u32;
    let second = lcg.advance() as u32;
    Ok(words_to_block([first, second]))
}

/// Encrypts `plaintext` under a key derived from `password`.
pub fn encrypt(
    plaintext: &[u8],
    password: &str,
    config: &CipherConfig,
    iv_params: &LcgParams,
) -> Result<Vec<u8>> {
    let cipher = Rc5::new(&derive_key(password, config.key_length), config)?;
    let iv = generate_iv(iv_params)?;
    let payload = cipher.encrypt_cbc(&iv, plaintext);
    debug!(
        plaintext_len = plaintext.len(),
        payload_len = payload.len(),
        rounds = config.rounds,
        "encrypted payload"
    );
    Ok(payload)
}

/// Decrypts a payload produced by [`encrypt`] with the same password and config.
pub fn decrypt(payload: &[u8], password: &str, config: &CipherConfig) -> Result<Vec<u8>> {
    let cipher = Rc5::new(&derive_key(password, config.key_length), config)?;
    let plaintext = cipher.decrypt_cbc(payload)?;
    debug!(
        payload_len = payload.len(),
        plaintext_len = plaintext.len(),
        "decrypted payload"
    );
    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> CipherConfig {
        CipherConfig::default()
    }

    #[test]
    fn test_rc5_reference_vectors() {
        let zero = Rc5::new(&[0u8; 16], &cfg()).unwrap();
        let ct = zero.encrypt_block(&[0u8; 8]);
        assert_eq!(hex::encode_upper(ct), "21A5DBEE154B8F6D");
        assert_eq!(zero.decrypt_block(&ct), [0u8; 8]);

        let key = hex::decode("915F4619BE41B2516355A50110A9CE91").unwrap();
        let cipher = Rc5::new(&key, &cfg()).unwrap();
        assert_eq!(hex::encode_upper(cipher.encrypt_block(&ct)), "F7C013AC5B2B8952");
    }

    #[test]
    fn test_schedule_length_and_seed() {
        let cipher = Rc5::new(b"k", &CipherConfig { rounds: 8, ..cfg() }).unwrap();
        assert_eq!(cipher.schedule().len(), 18);
        let empty = Rc5::new(&[], &CipherConfig { key_length: 0, ..cfg() }).unwrap();
        assert_eq!(empty.schedule().len(), 26);
    }

    #[test]
    fn test_key_truncated_to_key_length() {
        let short = CipherConfig { key_length: 4, ..cfg() };
        let a = Rc5::new(b"abcdXXXX", &short).unwrap();
        let b = Rc5::new(b"abcdYYYY", &short).unwrap();
        assert_eq!(a.schedule(), b.schedule());
    }

    #[test]
    fn test_block_inverse_for_odd_key_length() {
        let config = CipherConfig { rounds: 16, key_length: 5, ..cfg() };
        let cipher = Rc5::new(b"hello", &config).unwrap();
        let block = *b"8 bytes!";
        assert_eq!(cipher.decrypt_block(&cipher.encrypt_block(&block)), block);
    }

    #[test]
    fn test_partial_key_word_bytes_reach_schedule() {
        let config = CipherConfig { key_length: 5, ..cfg() };
        let a = Rc5::new(b"abcde", &config).unwrap();
        let b = Rc5::new(b"abcdf", &config).unwrap();
        assert_ne!(a.schedule(), b.schedule());
        assert_eq!(hex::encode_upper(a.encrypt_block(&[0u8; 8])), "8AF084A2B366BD8D");
        assert_eq!(hex::encode_upper(b.encrypt_block(&[0u8; 8])), "56B13FD00B0AE746");
        assert_eq!(hex::encode_upper(a.encrypt_block(b"8 bytes!")), "6698A5BFFCC3EB17");
    }

    #[test]
    fn test_round_and_key_length_bounds() {
        let edge = CipherConfig { rounds: MAX_ROUNDS, key_length: MAX_KEY_LENGTH, ..cfg() };
        assert!(edge.validate().is_ok());
        assert_eq!(Rc5::new(b"k", &edge).unwrap().schedule().len(), 2 * (MAX_ROUNDS + 1));
        assert!(matches!(
            CipherConfig { rounds: MAX_ROUNDS + 1, ..cfg() }.validate(),
            Err(LabError::CipherParameterOutOfRange { name: "rounds", value: 256, max: 255 })
        ));
        assert!(matches!(
            Rc5::new(b"k", &CipherConfig { key_length: MAX_KEY_LENGTH + 1, ..cfg() }),
            Err(LabError::CipherParameterOutOfRange { name: "key_length", value: 256, max: 255 })
        ));
    }

    #[test]
    fn test_unsupported_word_size() {
        let bad = CipherConfig { word_size: 16, ..cfg() };
        assert!(matches!(
            Rc5::new(b"key", &bad),
            Err(LabError::UnsupportedWordSize(16))
        ));
    }

    #[test]
    fn test_padding_law() {
        assert_eq!(pad(b"", 8), vec![8; 8]);
        assert_eq!(pad(b"abc", 8).len(), 8);
        assert_eq!(pad(&[1; 8], 8).len(), 16);
        for len in 0..20 {
            let data = vec![0x5A; len];
            assert_eq!(unpad(&pad(&data, 8), 8).unwrap(), &data[..]);
        }
    }

    #[test]
    fn test_unpad_rejects_bad_trailer() {
        assert!(matches!(unpad(&[1, 2, 0], 8), Err(LabError::InvalidPadding)));
        assert!(matches!(unpad(&[9; 16], 8), Err(LabError::InvalidPadding)));
        assert!(matches!(unpad(&[4, 4], 8), Err(LabError::InvalidPadding)));
        assert_eq!(unpad(&[], 8).unwrap(), &[] as &[u8]);
    }

    #[test]
    fn test_iv_from_generator() {
        let iv = generate_iv(&LcgParams::new(100, 13, 7, 1)).unwrap();
        assert_eq!(iv, [20, 0, 0, 0, 67, 0, 0, 0]);
        assert!(matches!(
            generate_iv(&LcgParams::new(u64::MAX, 2, 1, 1)),
            Err(LabError::IvModulusTooLarge(_))
        ));
    }

    #[test]
    fn test_iv_modulus_boundary() {
        let widest = LcgParams::new(1 << 32, 5, 3, (1 << 32) - 1);
        let iv = generate_iv(&widest).unwrap();
        let first = widest.step(widest.x0);
        assert_eq!(&iv[..4], &(first as u32).to_le_bytes());
        assert_eq!(&iv[4..], &(widest.step(first) as u32).to_le_bytes());
        assert!(matches!(
            generate_iv(&LcgParams::new((1 << 32) + 1, 5, 3, 1)),
            Err(LabError::IvModulusTooLarge(m)) if m == (1 << 32) + 1
        ));
    }

    #[test]
    fn test_round_trip() {
        let params = LcgParams::REFERENCE;
        for text in ["", "a", "exactly8", "a longer message spanning blocks"] {
            let payload = encrypt(text.as_bytes(), "pw", &cfg(), &params).unwrap();
            assert_eq!(payload.len() % BLOCK_SIZE, 0);
            assert!(payload.len() >= 2 * BLOCK_SIZE);
            assert_eq!(decrypt(&payload, "pw", &cfg()).unwrap(), text.as_bytes());
        }
    }

    #[test]
    fn test_iv_is_not_sent_in_clear() {
        let params = LcgParams::REFERENCE;
        let iv = generate_iv(&params).unwrap();
        let payload = encrypt(b"data", "pw", &cfg(), &params).unwrap();
        assert_ne!(&payload[..BLOCK_SIZE], &iv[..]);
        let cipher = Rc5::new(&derive_key("pw", 16), &cfg()).unwrap();
        assert_eq!(cipher.decrypt_block(&to_block(&payload[..BLOCK_SIZE])), iv);
    }

    #[test]
    fn test_wrong_password_fails_or_garbles() {
        let payload = encrypt(b"secret message", "right", &cfg(), &LcgParams::REFERENCE).unwrap();
        match decrypt(&payload, "wrong", &cfg()) {
            Err(err) => assert!(matches!(err, LabError::InvalidPadding)),
            Ok(plain) => assert_ne!(plain, b"secret message"),
        }
    }

    #[test]
    fn test_short_and_misaligned_payloads() {
        assert!(matches!(
            decrypt(&[0u8; 8], "pw", &cfg()),
            Err(LabError::CiphertextTooShort { len: 8 })
        ));
        assert!(matches!(
            decrypt(&[0u8; 17], "pw", &cfg()),
            Err(LabError::CiphertextMisaligned { len: 17 })
        ));
    }
}
