//! Hex and HMAC-SHA256 primitives used to sign admin tokens.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use ghostwriter_shared::MalformedInput;

type HmacSha256 = Hmac<Sha256>;

/// Decode a hex string, two characters per byte, case-insensitively.
///
/// Fails on odd length or any character outside `[0-9a-fA-F]`.
pub fn hex_decode(s: &str) -> Result<Vec<u8>, MalformedInput> {
    Ok(hex::decode(s)?)
}

/// Lowercase hex encoding.
pub fn hex_encode(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Keyed HMAC-SHA256 of `message`.
pub fn hmac_sha256(key: &[u8], message: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length, so construction cannot fail.
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        let samples: [&[u8]; 4] = [b"", b"\x00", b"\xde\xad\xbe\xef", &[0u8, 1, 127, 128, 255]];
        for bytes in samples {
            assert_eq!(hex_decode(&hex_encode(bytes)).unwrap(), bytes);
        }
    }

    #[test]
    fn hex_decode_is_case_insensitive() {
        assert_eq!(hex_decode("DeadBEEF").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn hex_decode_rejects_odd_length() {
        assert!(hex_decode("abc").is_err());
    }

    #[test]
    fn hex_decode_rejects_non_hex() {
        assert!(hex_decode("zz").is_err());
        assert!(hex_decode("0g").is_err());
    }

    #[test]
    fn hmac_matches_rfc4231_case_2() {
        let mac = hmac_sha256(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(
            hex_encode(&mac),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }
}
