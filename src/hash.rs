//! `crypto_labs` rebuilds textbook primitives from first principles so that
//! every step of the arithmetic stays visible to the reader.
//! Merkle–Damgård digest over 64-byte blocks with a 128-bit state.
//!
//! The construction is MD5 (RFC 1321): the message is padded with a single
//! `0x80` byte, zeros up to 56 mod 64, and the 64-bit little-endian bit length.
//! Each block is compressed by four rounds of sixteen steps, after which the
//! working registers are added back into the chaining state.
//!
//! [`Md5`] is the incremental accumulator.  It buffers at most one partial
//! block between calls, and [`Md5::finalize`] consumes it, so a finished
//! accumulator can never absorb more input.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::error::{LabError, Result};

/// Digest length in bytes.
pub const DIGEST_LEN: usize = 16;

/// Compression block length in bytes.
pub const BLOCK_LEN: usize = 64;

/// Chunk size used when streaming files.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Offset inside the final block where the bit length starts.
const LENGTH_OFFSET: usize = 56;

const INIT_STATE: [u32; 4] = [0x6745_2301, 0xEFCD_AB89, 0x98BA_DCFE, 0x1032_5476];

/// Left-rotation amounts, four per round, cycled across its sixteen steps.
const SHIFTS: [[u32; 4]; 4] = [[7, 12, 17, 22], [5, 9, 14, 20], [4, 11, 16, 23], [6, 10, 15, 21]];

/// `T[i] = floor(|sin(i + 1)| · 2^32)`.
const SINE_TABLE: [u32; 64] = [
    0xd76a_a478, 0xe8c7_b756, 0x2420_70db, 0xc1bd_ceee, 0xf57c_0faf, 0x4787_c62a, 0xa830_4613,
    0xfd46_9501, 0x6980_98d8, 0x8b44_f7af, 0xffff_5bb1, 0x895c_d7be, 0x6b90_1122, 0xfd98_7193,
    0xa679_438e, 0x49b4_0821, 0xf61e_2562, 0xc040_b340, 0x265e_5a51, 0xe9b6_c7aa, 0xd62f_105d,
    0x0244_1453, 0xd8a1_e681, 0xe7d3_fbc8, 0x21e1_cde6, 0xc337_07d6, 0xf4d5_0d87, 0x455a_14ed,
    0xa9e3_e905, 0xfcef_a3f8, 0x676f_02d9, 0x8d2a_4c8a, 0xfffa_3942, 0x8771_f681, 0x6d9d_6122,
    0xfde5_380c, 0xa4be_ea44, 0x4bde_cfa9, 0xf6bb_4b60, 0xbebf_bc70, 0x289b_7ec6, 0xeaa1_27fa,
    0xd4ef_3085, 0x0488_1d05, 0xd9d4_d039, 0xe6db_99e5, 0x1fa2_7cf8, 0xc4ac_5665, 0xf429_2244,
    0x432a_ff97, 0xab94_23a7, 0xfc93_a039, 0x655b_59c3, 0x8f0c_cc92, 0xffef_f47d, 0x8584_5dd1,
    0x6fa8_7e4f, 0xfe2c_e6e0, 0xa301_4314, 0x4e08_11a1, 0xf753_7e82, 0xbd3a_f235, 0x2ad7_d2bb,
    0xeb86_d391,
];

/// A 128-bit digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// Raw digest bytes: the four state words, little-endian.
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// 32-character uppercase hexadecimal rendering.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }

    /// Parses a 32-character hex string in either case.
    pub fn from_hex(text: &str) -> Result<Self> {
        let mut bytes = [0u8; DIGEST_LEN];
        hex::decode_to_slice(text.trim(), &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

/// Incremental digest accumulator.
#[derive(Debug, Clone)]
pub struct Md5 {
    state: [u32; 4],
    buffer: [u8; BLOCK_LEN],
    buffered: usize,
    length: u64,
}

impl Default for Md5 {
    fn default() -> Self {
        Self::new()
    }
}

impl Md5 {
    /// Creates an accumulator holding the initial chaining constants.
    pub fn new() -> Self {
        Self {
            state: INIT_STATE,
            buffer: [0u8; BLOCK_LEN],
            buffered: 0,
            length: 0,
        }
    }

    /// Absorbs `data`; any chunking yields the same digest for the same bytes.
    pub fn update(&mut self, data: &[u8]) {
        self.length = self.length.wrapping_add(data.len() as u64);
        self.absorb(data);
    }

    fn absorb(&mut self, mut data: &[u8]) {
        if self.buffered > 0 {
            let take = (BLOCK_LEN - self.buffered).min(data.len());
            self.buffer[self.buffered..self.buffered + take].copy_from_slice(&data[..take]);
            self.buffered += take;
            data = &data[take..];
            if self.buffered < BLOCK_LEN {
                return;
            }
            let block = self.buffer;
            compress(&mut self.state, &block);
            self.buffered = 0;
        }
        let mut blocks = data.chunks_exact(BLOCK_LEN);
        for block in &mut blocks {
            compress(&mut self.state, block);
        }
        let rest = blocks.remainder();
        self.buffer[..rest.len()].copy_from_slice(rest);
        self.buffered = rest.len();
    }

    /// Pads, absorbs the final block(s) and returns the digest.
    pub fn finalize(mut self) -> Digest {
        let bit_len = self.length.wrapping_mul(8);
        let zeros = (BLOCK_LEN + LENGTH_OFFSET - (self.buffered + 1) % BLOCK_LEN) % BLOCK_LEN;
        let mut tail = Vec::with_capacity(1 + zeros + 8);
        tail.push(0x80);
        tail.resize(1 + zeros, 0);
        tail.extend_from_slice(&bit_len.to_le_bytes());
        self.absorb(&tail);
        debug_assert_eq!(self.buffered, 0);
        serialize_state(&self.state)
    }
}

/// Applies the message padding to a copy of `data`.
///
/// The result length is always a multiple of [`BLOCK_LEN`].
pub fn pad_message(data: &[u8]) -> Vec<u8> {
    let bit_len = (data.len() as u64).wrapping_mul(8);
    let mut padded = Vec::with_capacity(data.len() + BLOCK_LEN + 8);
    padded.extend_from_slice(data);
    padded.push(0x80);
    while padded.len() % BLOCK_LEN != LENGTH_OFFSET {
        padded.push(0);
    }
    padded.extend_from_slice(&bit_len.to_le_bytes());
    padded
}

/// Single-shot digest of `data`.
pub fn hash_bytes(data: &[u8]) -> Digest {
    let mut state = INIT_STATE;
    for block in pad_message(data).chunks_exact(BLOCK_LEN) {
        compress(&mut state, block);
    }
    serialize_state(&state)
}

/// Digest of the UTF-8 encoding of `text`.
pub fn hash_str(text: &str) -> Digest {
    hash_bytes(text.as_bytes())
}

/// Streams `reader` through the accumulator in `chunk_size` reads.
pub fn hash_reader<R: Read>(mut reader: R, chunk_size: usize) -> Result<Digest> {
    if chunk_size == 0 {
        return Err(LabError::InvalidCount("chunk size"));
    }
    let mut hasher = Md5::new();
    let mut chunk = vec![0u8; chunk_size];
    loop {
        let read = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        hasher.update(&chunk[..read]);
    }
    debug!(bytes = hasher.length, "streamed digest input");
    Ok(hasher.finalize())
}

/// Digest of the file at `path`.
pub fn hash_file(path: impl AsRef<Path>) -> Result<Digest> {
    let file = File::open(path.as_ref())?;
    hash_reader(file, DEFAULT_CHUNK_SIZE)
}

/// Hashes independent files, in parallel where threads are available, preserving input order.
pub fn hash_files<P>(paths: &[P]) -> Vec<Result<Digest>>
where
    P: AsRef<Path> + Sync,
{
    #[cfg(not(target_arch = "wasm32"))]
    {
        paths.par_iter().map(hash_file).collect()
    }
    #[cfg(target_arch = "wasm32")]
    {
        paths.iter().map(hash_file).collect()
    }
}

/// Outcome of comparing a computed digest against an expected one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HashVerification {
    /// Whether the digests agree, ignoring case.
    pub matches: bool,
    /// Expected digest, trimmed and uppercased.
    pub expected: String,
    /// Computed digest, uppercase.
    pub actual: String,
}

impl HashVerification {
    fn compare(actual: Digest, expected: &str) -> Self {
        let expected = expected.trim().to_uppercase();
        let actual = actual.to_hex();
        Self {
            matches: expected == actual,
            expected,
            actual,
        }
    }
}

/// Hashes `reader` and compares the result with `expected`.
pub fn verify_reader<R: Read>(reader: R, expected: &str) -> Result<HashVerification> {
    Ok(HashVerification::compare(
        hash_reader(reader, DEFAULT_CHUNK_SIZE)?,
        expected,
    ))
}

/// Hashes the file at `path` and compares the result with `expected`.
pub fn verify_file(path: impl AsRef<Path>, expected: &str) -> Result<HashVerification> {
    Ok(HashVerification::compare(hash_file(path)?, expected))
}

fn serialize_state(state: &[u32; 4]) -> Digest {
    let mut out = [0u8; DIGEST_LEN];
    for (dst, word) in out.chunks_exact_mut(4).zip(state) {
        dst.copy_from_slice(&word.to_le_bytes());
    }
    Digest(out)
}

#[inline(always)]
fn round_f(b: u32, c: u32, d: u32) -> u32 {
    (b & c) | (!b & d)
}

#[inline(always)]
fn round_g(b: u32, c: u32, d: u32) -> u32 {
    (b & d) | (c & !d)
}

#[inline(always)]
fn round_h(b: u32, c: u32, d: u32) -> u32 {
    b ^ c ^ d
}

#[inline(always)]
fn round_i(b: u32, c: u32, d: u32) -> u32 {
    c ^ (b | !d)
}

/// Compresses one 64-byte block into `state`.
fn compress(state: &mut [u32; 4], block: &[u8]) {
    let mut x = [0u32; 16];
    for (word, bytes) in x.iter_mut().zip(block.chunks_exact(4)) {
        *word = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    }

    let [mut a, mut b, mut c, mut d] = *state;
    for step in 0..64 {
        let round = step / 16;
        let (mix, k) = match round {
            0 => (round_f(b, c, d), step),
            1 => (round_g(b, c, d), (1 + 5 * step) % 16),
            2 => (round_h(b, c, d), (5 + 3 * step) % 16),
            _ => (round_i(b, c, d), (7 * step) % 16),
        };
        let rotated = a
            .wrapping_add(mix)
            .wrapping_add(x[k])
            .wrapping_add(SINE_TABLE[step])
            .rotate_left(SHIFTS[round][step % 4]);
        (a, b, c, d) = (d, b.wrapping_add(rotated), b, c);
    }

    state[0] = state[0].wrapping_add(a);
    state[1] = state[1].wrapping_add(b);
    state[2] = state[2].wrapping_add(c);
    state[3] = state[3].wrapping_add(d);
}
