//! Password to key-bytes adapter built on the digest.

use tracing::warn;

use crate::hash::{hash_str, DIGEST_LEN};

/// Returns the first `required_len` bytes of the digest of `password`.
///
/// The digest is only [`DIGEST_LEN`] bytes long.  Requests beyond that are
/// not stretched: the returned key is silently shorter than asked for, so
/// callers should bound `required_len` to 16.
pub fn derive_key(password: &str, required_len: usize) -> Vec<u8> {
    if required_len > DIGEST_LEN {
        warn!(
            required_len,
            available = DIGEST_LEN,
            "derived key truncated to digest length"
        );
    }
    let digest = hash_str(password);
    digest.as_bytes()[..required_len.min(DIGEST_LEN)].to_vec()
}

#[cfg(test)]
mod tests {
    use super::derive_key;

    #[test]
    fn test_prefix_of_digest() {
        // MD5("abc") = 900150983CD24FB0...
        assert_eq!(derive_key("abc", 4), vec![0x90, 0x01, 0x50, 0x98]);
        assert_eq!(derive_key("abc", 16).len(), 16);
        assert!(derive_key("abc", 0).is_empty());
    }

    #[test]
    fn test_long_request_is_truncated() {
        assert_eq!(derive_key("secret", 32), derive_key("secret", 16));
    }
}
