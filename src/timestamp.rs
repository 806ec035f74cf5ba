//! Reversible obfuscation of Unix timestamps.
//!
//! Timestamps are encrypted with AES-128-CBC under a key and IV that are
//! compiled into the binary, so the same timestamp always produces the
//! same ciphertext. This hides the raw number from casual readers of a
//! tag; it is not meant to keep anything secret.

use aes::Aes128;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use log::{debug, Logger};

use crate::errors::DecodeError;

type Encryptor = cbc::Encryptor<Aes128>;
type Decryptor = cbc::Decryptor<Aes128>;

const KEY: [u8; 16] = [
    0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef, 0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef,
];

const IV: [u8; 16] = [
    0xfe, 0xdc, 0xba, 0x98, 0x76, 0x54, 0x32, 0x10, 0xfe, 0xdc, 0xba, 0x98, 0x76, 0x54, 0x32, 0x10,
];

/// Encrypts the decimal form of `timestamp` and returns it as lower-case hex.
///
/// ```
/// use handup::timestamp::encode;
/// assert_eq!(encode(1_700_000_000), "e361f5e797f0ef7065491b63d6a2a2a7");
/// ```
pub fn encode(timestamp: u64) -> String {
    let ciphertext = Encryptor::new(&KEY.into(), &IV.into())
        .encrypt_padded_vec_mut::<Pkcs7>(timestamp.to_string().as_bytes());

    hex::encode(ciphertext)
}

/// Reverses `encode`. The result may be negative if the ciphertext was
/// produced from a negative number; see `decode_or_invalid`.
pub fn decode(encoded: &str) -> Result<i64, DecodeError> {
    let ciphertext = hex::decode(encoded).map_err(|source| DecodeError::NotHex { source })?;

    let plaintext = Decryptor::new(&KEY.into(), &IV.into())
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| DecodeError::Decryption)?;

    let plaintext = String::from_utf8(plaintext).map_err(|_| DecodeError::NotUtf8)?;

    plaintext
        .parse::<i64>()
        .map_err(|_| DecodeError::NotInteger(plaintext))
}

/// Decodes `encoded`, folding every failure and every negative result
/// into `None`. Both are logged at debug level.
pub fn decode_or_invalid(encoded: &str, logger: &Logger) -> Option<u64> {
    match decode(encoded) {
        Ok(t) if t >= 0 => Some(t as u64),
        Ok(t) => {
            debug!(logger, "Ignoring negative timestamp"; "encoded" => encoded, "timestamp" => t);
            None
        }
        Err(e) => {
            debug!(logger, "Ignoring undecodable timestamp"; "encoded" => encoded, "error" => %e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use log::{o, Drain, Never, OwnedKVList, Record};
    use proptest::prelude::*;

    use super::*;

    /// Keeps the message of every record it sees.
    #[derive(Clone, Default)]
    struct Messages(Arc<Mutex<Vec<String>>>);

    impl Drain for Messages {
        type Ok = ();
        type Err = Never;

        fn log(&self, record: &Record, _: &OwnedKVList) -> Result<(), Never> {
            self.0.lock().unwrap().push(record.msg().to_string());
            Ok(())
        }
    }

    fn quiet() -> Logger {
        log::discard()
    }

    #[test]
    fn encoding_is_deterministic() {
        assert_eq!(encode(1_700_000_000), "e361f5e797f0ef7065491b63d6a2a2a7");
        assert_eq!(encode(0), "2cd13d949546a6c88451298ce339ca7f");
        assert_eq!(encode(42), encode(42));
        assert!(!encode(0).contains('-'));
    }

    #[test]
    fn malformed_input_fails_cleanly() {
        assert!(matches!(decode("garbage"), Err(DecodeError::NotHex { .. })));
        assert!(matches!(decode("abc"), Err(DecodeError::NotHex { .. })));
        assert_eq!(decode(""), Err(DecodeError::Decryption));
        assert_eq!(decode("00112233"), Err(DecodeError::Decryption));
        assert_eq!(
            decode("00112233445566778899aabbccddeeff"),
            Err(DecodeError::Decryption)
        );
        // 1700000000 encrypted under an all-zero key
        assert_eq!(
            decode("804ee31500a438db486b86e6ee295be0"),
            Err(DecodeError::Decryption)
        );
    }

    #[test]
    fn non_numeric_plaintext_is_rejected() {
        // "abc" under the real key
        assert_eq!(
            decode("b23a09757d4c5f5efd5f09d2f8f22f78"),
            Err(DecodeError::NotInteger("abc".to_owned()))
        );
        assert_eq!(decode_or_invalid("b23a09757d4c5f5efd5f09d2f8f22f78", &quiet()), None);
    }

    #[test]
    fn negative_timestamps_are_invalid() {
        // "-5" under the real key
        assert_eq!(decode("f3dbfd2a8f6dae2d6a39831a7b78f6cc"), Ok(-5));
        assert_eq!(decode_or_invalid("f3dbfd2a8f6dae2d6a39831a7b78f6cc", &quiet()), None);
    }

    #[test]
    fn invalid_timestamps_are_logged() {
        let messages = Messages::default();
        let logger = Logger::root(messages.clone(), o!());

        assert_eq!(decode_or_invalid("f3dbfd2a8f6dae2d6a39831a7b78f6cc", &logger), None);
        assert_eq!(decode_or_invalid("garbage", &logger), None);
        assert_eq!(decode_or_invalid(&encode(7), &logger), Some(7));

        assert_eq!(
            *messages.0.lock().unwrap(),
            vec![
                "Ignoring negative timestamp".to_owned(),
                "Ignoring undecodable timestamp".to_owned()
            ]
        );
    }

    #[test]
    fn upper_case_hex_is_accepted() {
        assert_eq!(decode("E361F5E797F0EF7065491B63D6A2A2A7"), Ok(1_700_000_000));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 2000, ..ProptestConfig::default()
        })]

        #[test]
        fn decoding_reverses_encoding(t in 0u64..=i64::MAX as u64) {
            prop_assert_eq!(decode(&encode(t)), Ok(t as i64));
            prop_assert_eq!(decode_or_invalid(&encode(t), &quiet()), Some(t));
        }

        #[test]
        fn arbitrary_strings_never_panic(s in "\\PC*") {
            let _ = decode_or_invalid(&s, &quiet());
        }
    }
}
