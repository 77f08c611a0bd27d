//! Property-based tests for message integrity hashing and signatures
//!
//! 1. **Determinism**: hashing the same binding twice gives the same hash
//! 2. **Sensitivity**: changing any single field changes the hash
//! 3. **Signature validity**: verify(m, sign(m)) holds; a modified message
//!    or a corrupted signature never verifies and never panics

use chatsecure_core::crypto::{generate_asymmetric_keypair, sign_ecdsa, verify_ecdsa};
use chatsecure_core::integrity::{hash, verify, verify_batch, MessageBinding, StoredMessage};
use chatsecure_core::{KeyAlgorithm, PrivateKeyInput};
use chrono::{DateTime, NaiveDateTime};
use proptest::prelude::*;

fn timestamp() -> impl Strategy<Value = NaiveDateTime> {
    // 2000-01-01 .. 2100-01-01, microsecond precision
    (946_684_800i64..4_102_444_800i64, 0u32..1_000_000).prop_map(|(secs, micros)| {
        DateTime::from_timestamp(secs, micros * 1_000)
            .unwrap()
            .naive_utc()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_hash_deterministic(
        body in ".*",
        sender in "[a-z0-9]{1,16}",
        receiver in "[a-z0-9]{1,16}",
        ts in timestamp(),
    ) {
        let binding = MessageBinding::new(&body, &sender, &receiver, ts);
        let h = hash(&binding);

        prop_assert_eq!(h.len(), 64);
        prop_assert_eq!(&h, &hash(&binding));
        prop_assert!(verify(&binding, &h));
    }

    #[test]
    fn prop_hash_sensitive_to_each_field(
        body in "[a-z]{1,32}",
        sender in "[a-z]{1,16}",
        receiver in "[a-z]{1,16}",
        ts in timestamp(),
    ) {
        let base = MessageBinding::new(&body, &sender, &receiver, ts);
        let h = hash(&base);

        let body2 = format!("{}!", body);
        let sender2 = format!("{}!", sender);
        let receiver2 = format!("{}!", receiver);

        let changed_body = MessageBinding { body: &body2, ..base };
        let changed_sender = MessageBinding { sender: &sender2, ..base };
        let changed_receiver = MessageBinding { receiver: &receiver2, ..base };
        let changed_time = MessageBinding { timestamp: ts + chrono::Duration::seconds(1), ..base };

        prop_assert!(!verify(&changed_body, &h));
        prop_assert!(!verify(&changed_sender, &h));
        prop_assert!(!verify(&changed_receiver, &h));
        prop_assert!(!verify(&changed_time, &h));
    }

    #[test]
    fn prop_batch_counts_failures(bodies in prop::collection::vec("[a-z]{1,8}", 0..20), corrupt in any::<prop::sample::Index>()) {
        let ts = DateTime::from_timestamp(1_700_000_000, 0).unwrap().naive_utc();
        let mut rows: Vec<StoredMessage> = bodies
            .iter()
            .map(|b| StoredMessage {
                message: b.clone(),
                sender: "alice".into(),
                receiver: "bob".into(),
                timestamp: ts,
                hash: hash(&MessageBinding::new(b, "alice", "bob", ts)),
            })
            .collect();

        prop_assert!(verify_batch(&rows).all_passed());

        if !rows.is_empty() {
            let at = corrupt.index(rows.len());
            rows[at].hash = "0".repeat(64);
            let report = verify_batch(&rows);
            prop_assert_eq!(report.failed, 1);
            prop_assert_eq!(report.total, rows.len());
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_ecdsa_sign_verify(message in ".{0,256}", garbage in ".{0,128}") {
        let kp = generate_asymmetric_keypair(KeyAlgorithm::Ecc).unwrap();
        let sig = sign_ecdsa(&message, PrivateKeyInput::Pem(kp.private_key_pem())).unwrap();

        let altered = format!("{}x", message);

        prop_assert!(verify_ecdsa(&message, &sig, &kp.public_key));
        prop_assert!(!verify_ecdsa(&altered, &sig, &kp.public_key));
        prop_assert!(!verify_ecdsa(&message, &garbage, &kp.public_key));
        prop_assert!(!verify_ecdsa(&message, &sig, &garbage));
    }
}
