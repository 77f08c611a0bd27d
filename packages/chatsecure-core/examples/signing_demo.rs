//! # Signing Demo
//!
//! Demonstrates RSA and ECDSA signatures, and sealing a signed message with
//! its integrity hash.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example signing_demo
//! ```

use chatsecure_core::crypto::{
    generate_asymmetric_keypair, sign_ecdsa, sign_rsa, verify_ecdsa, verify_rsa,
};
use chatsecure_core::integrity::{verify_batch, StoredMessage};
use chatsecure_core::messaging::seal_direct;
use chatsecure_core::{KeyAlgorithm, PrivateKeyInput};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatsecure_core=info".into()),
        )
        .init();

    println!("=== ChatSecure Core: Digital Signatures Demo ===\n");

    println!("Step 1: Generating keypairs...");
    let rsa = generate_asymmetric_keypair(KeyAlgorithm::Rsa).expect("RSA keygen failed");
    let ecc = generate_asymmetric_keypair(KeyAlgorithm::Ecc).expect("ECC keygen failed");
    println!("  {:?}", ecc);
    println!();

    let message = "Hello, Bob! This message is from Alice.";

    println!("Step 2: RSA PKCS#1 v1.5 signature...");
    let sig = sign_rsa(message, rsa.private_key_pem()).expect("Signing failed");
    println!("  Signature: {}...", &sig[..32]);
    println!("  Valid:              {}", verify_rsa(message, &sig, &rsa.public_key));
    println!("  Tampered message:   {}", verify_rsa("Hello, Bob!", &sig, &rsa.public_key));
    println!("  Garbage signature:  {}", verify_rsa(message, "%%%", &rsa.public_key));
    println!();

    println!("Step 3: Deterministic ECDSA signature...");
    let key = PrivateKeyInput::Pem(ecc.private_key_pem());
    let sig1 = sign_ecdsa(message, key).expect("Signing failed");
    let sig2 = sign_ecdsa(message, key).expect("Signing failed");
    println!("  Signature: {}", sig1);
    println!("  Same input, same signature: {}", sig1 == sig2);
    println!("  Valid: {}", verify_ecdsa(message, &sig1, &ecc.public_key));
    println!();

    println!("Step 4: Sealing a signed message for Bob...");
    let timestamp = chrono::Utc::now().naive_utc();
    let sealed = seal_direct(message, "alice", "bob", timestamp, &rsa.public_key, Some(key))
        .expect("Sealing failed");
    println!("  Integrity hash: {}", sealed.integrity_hash());

    let rows = [StoredMessage {
        message: sealed.envelope().to_string(),
        sender: "alice".into(),
        receiver: "bob".into(),
        timestamp,
        hash: sealed.integrity_hash().to_string(),
    }];
    println!("  {}", verify_batch(&rows));

    println!("\n=== Demo Complete ===");
}
