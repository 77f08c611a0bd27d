//! Property-based tests for the message ciphers
//!
//! 1. **Round-trip**: decrypt(encrypt(p)) == p for direct and group messages
//! 2. **Tamper detection**: flipping any bit of an envelope makes decrypt
//!    hand back the tampered envelope, never a plaintext
//! 3. **Freshness**: encrypting the same plaintext twice never repeats

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chatsecure_core::crypto::{generate_asymmetric_keypair, group, hybrid, GroupKey};
use chatsecure_core::{KeyAlgorithm, Keypair};
use once_cell::sync::Lazy;
use proptest::prelude::*;

static RECIPIENT: Lazy<Keypair> =
    Lazy::new(|| generate_asymmetric_keypair(KeyAlgorithm::Rsa).unwrap());

fn flip_bit(envelope: &str, index: prop::sample::Index, bit: u8) -> String {
    let mut raw = BASE64.decode(envelope).unwrap();
    let at = index.index(raw.len());
    raw[at] ^= 1 << bit;
    BASE64.encode(raw)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_hybrid_roundtrip(plaintext in ".{0,512}") {
        let envelope = hybrid::encrypt_for_recipient(&plaintext, &RECIPIENT.public_key).unwrap();

        prop_assert_eq!(hybrid::decrypt(&envelope, RECIPIENT.private_key_pem()), plaintext);
    }

    #[test]
    fn prop_hybrid_tamper_returns_envelope(
        plaintext in "[a-z ]{1,64}",
        index in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let envelope = hybrid::encrypt_for_recipient(&plaintext, &RECIPIENT.public_key).unwrap();
        let tampered = flip_bit(&envelope, index, bit);

        prop_assert_eq!(hybrid::decrypt(&tampered, RECIPIENT.private_key_pem()), tampered.clone());
        prop_assert!(hybrid::try_decrypt(&tampered, RECIPIENT.private_key_pem()).is_err());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_group_roundtrip(plaintext in ".{0,2048}", key_bytes in any::<[u8; 32]>()) {
        let key = GroupKey::from_slice(&key_bytes).unwrap();
        let envelope = group::encrypt(&plaintext, &key).unwrap();

        prop_assert_eq!(group::decrypt(&envelope, &key), plaintext);
    }

    #[test]
    fn prop_group_tamper_returns_envelope(
        plaintext in ".{0,256}",
        index in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let key = GroupKey::generate();
        let envelope = group::encrypt(&plaintext, &key).unwrap();
        let tampered = flip_bit(&envelope, index, bit);

        prop_assert_eq!(group::decrypt(&tampered, &key), tampered);
    }

    #[test]
    fn prop_group_never_repeats(plaintext in ".{0,128}") {
        let key = GroupKey::generate();

        prop_assert_ne!(group::encrypt(&plaintext, &key).unwrap(), group::encrypt(&plaintext, &key).unwrap());
    }

    #[test]
    fn prop_group_rejects_wrong_key_length(len in (0usize..128).prop_filter("not 32", |l| *l != 32)) {
        let bytes = vec![7u8; len];

        prop_assert!(group::encrypt_with_key_bytes("hi", &bytes).is_err());
    }
}
