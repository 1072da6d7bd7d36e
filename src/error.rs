//! Error type shared by every primitive in the crate.
//!
//! Variants fall into four families: parameter validation, data shape,
//! integrity (padding) and degenerate statistics.  Ambient failures from the
//! filesystem, JSON configuration and hex decoding are wrapped as well.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LabError>;

/// Errors raised by the generator, the randomness tests, the digest and the cipher.
#[derive(Debug, Error)]
pub enum LabError {
    #[error("modulus m must be greater than zero")]
    /// The LCG modulus was zero.
    InvalidModulus,
    #[error("{name} = {value} must lie in [0, {modulus})")]
    /// An LCG parameter fell outside `[0, m)`.
    ParameterOutOfRange {
        /// Parameter name (`a`, `c` or `x0`).
        name: &'static str,
        /// Offending value.
        value: u64,
        /// Modulus the value was checked against.
        modulus: u64,
    },
    #[error("modulus m = {0} produces values wider than 32 bits; cannot build an IV")]
    /// IV derivation needs every generator output to fit a 32-bit word.
    IvModulusTooLarge(u64),
    #[error("{0} must be at least 1")]
    /// A count, iteration bound or chunk size was zero.
    InvalidCount(&'static str),
    #[error("unsupported word size {0}; only 32-bit words are supported")]
    /// The cipher was configured with a word size other than 32.
    UnsupportedWordSize(u32),
    #[error("{name} = {value} exceeds the maximum of {max}")]
    /// Cipher round count or key length is out of range.
    CipherParameterOutOfRange {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: usize,
        /// Largest accepted value.
        max: usize,
    },
    #[error("bit width {0} must lie in [1, 64]")]
    /// The frequency test was asked for an impossible bit width.
    InvalidBitWidth(u32),
    #[error("sequence is empty")]
    /// A statistical test received no input.
    EmptySequence,
    #[error("sequence is too short for this test")]
    /// A statistical test or source ran out of values.
    SequenceTooShort,
    #[error("all bits are identical; the runs statistic is undefined")]
    /// The runs test saw only ones or only zeros.
    UniformBits,
    #[error("runs variance is not positive")]
    /// The runs test variance degenerated.
    NonPositiveVariance,
    #[error("ciphertext of {len} bytes is too short; need an encrypted IV and at least one block")]
    /// Payload shorter than two cipher blocks.
    CiphertextTooShort {
        /// Payload length in bytes.
        len: usize,
    },
    #[error("ciphertext of {len} bytes is not a multiple of the block size")]
    /// Payload length is not block aligned.
    CiphertextMisaligned {
        /// Payload length in bytes.
        len: usize,
    },
    #[error("decryption failed: wrong password or corrupted data")]
    /// Trailing padding byte was zero or larger than the block size.
    InvalidPadding,
    #[error("io error: {0}")]
    /// Underlying filesystem failure.
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    /// Configuration could not be parsed.
    Config(#[from] serde_json::Error),
    #[error("hex decode error: {0}")]
    /// A hex string could not be decoded.
    Hex(#[from] hex::FromHexError),
}

#[cfg(test)]
mod tests {
    use super::LabError;

    #[test]
    fn test_padding_message_points_at_password() {
        let msg = LabError::InvalidPadding.to_string();
        assert!(msg.contains("wrong password"));
        assert!(msg.contains("corrupted"));
    }

    #[test]
    fn test_parameter_message_names_range() {
        let err = LabError::ParameterOutOfRange {
            name: "a",
            value: 120,
            modulus: 100,
        };
        assert_eq!(err.to_string(), "a = 120 must lie in [0, 100)");
    }
}
