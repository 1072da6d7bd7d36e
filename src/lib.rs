#![deny(missing_docs)]

//! `crypto_labs` rebuilds textbook primitives from first principles so that
//! every step of the arithmetic stays visible to the reader.
//! # crypto_labs
//!
//! Three classic primitives, implemented from scratch and wired together the
//! way a teaching lab would use them:
//!
//! * **Linear-congruential generator**: [`Lcg`] produces deterministic
//!   sequences from `{m, a, c, x0}`, finds its period and summarises output
//!   with [`statistics`].
//! * **Randomness diagnostics**: the [`randomness`] module estimates π with
//!   Cesàro's coprimality theorem and runs chi-square bit-balance and
//!   Wald–Wolfowitz runs tests.
//! * **Digest**: [`Md5`] is a 128-bit Merkle–Damgård hash with single-shot,
//!   streaming and verification entry points.
//! * **Block cipher**: [`Rc5`] implements RC5-32 with a configurable round
//!   count; [`cipher::encrypt`] and [`cipher::decrypt`] chain it with PKCS#7
//!   padding, a password-derived key ([`derive_key`]) and a generator-derived
//!   IV.
//!
//! None of these primitives are fit for protecting real data.
//!
//! ## Usage
//!
//! ```rust
//! use crypto_labs::{cipher, hash_str, CipherConfig, Lcg, LcgParams};
//!
//! let mut lcg = Lcg::new(LcgParams::new(100, 13, 7, 1)).unwrap();
//! assert_eq!(lcg.generate_sequence(5).unwrap(), vec![20, 67, 78, 21, 80]);
//!
//! assert_eq!(hash_str("abc").to_hex(), "900150983CD24FB0D6963F7D28E17F72");
//!
//! let config = CipherConfig::default();
//! let payload = cipher::encrypt(b"attack at dawn", "pw", &config, &LcgParams::REFERENCE).unwrap();
//! assert_eq!(cipher::decrypt(&payload, "pw", &config).unwrap(), b"attack at dawn");
//! ```

pub mod cipher;
mod config;
pub mod error;
pub mod hash;
mod io;
mod kdf;
mod prng;
pub mod randomness;

pub use cipher::{CipherConfig, Rc5};
pub use config::LabConfig;
pub use error::{LabError, Result};
pub use hash::{
    hash_bytes, hash_file, hash_files, hash_reader, hash_str, verify_file, verify_reader, Digest,
    HashVerification, Md5,
};
pub use io::{render_sequence_report, write_sequence_report};
pub use kdf::derive_key;
pub use prng::{
    statistics, Lcg, LcgParams, PeriodQuality, PeriodReport, SequenceStats, MAX_SEQUENCE_LEN,
};
pub use randomness::{
    estimate_pi, estimate_pi_system, frequency_test, randomness_report, runs_test, CesaroReport,
    FrequencyReport, RandomnessReport, RunsReport,
};
