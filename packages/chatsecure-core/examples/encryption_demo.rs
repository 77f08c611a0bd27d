//! # Encryption Demo
//!
//! Demonstrates direct and group message encryption, including what a
//! reader gets back from a tampered envelope.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example encryption_demo
//! ```

use std::sync::Arc;

use chatsecure_core::crypto::{group, hybrid};
use chatsecure_core::{CoreConfig, GroupKey, MemoryRevocationStore, SecurityCore};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatsecure_core=debug".into()),
        )
        .init();

    println!("=== ChatSecure Core: Message Encryption Demo ===\n");

    let config = CoreConfig::new("demo-token-secret", "demo-app-secret")
        .expect("Failed to build config");
    let core = SecurityCore::new(config, Arc::new(MemoryRevocationStore::new()))
        .expect("Failed to initialize core");

    // Step 1: Signup provisions RSA and ECC keys for Bob
    println!("Step 1: Provisioning Bob's keys...");
    let bob = core.provision_user_keys().expect("Failed to provision keys");
    let bob_private = core
        .unwrap_private_key(&bob.rsa_private_key_wrapped)
        .expect("Failed to unwrap private key");
    let bob_private = String::from_utf8(bob_private.to_vec()).expect("PEM is UTF-8");
    println!("  Public key stored in clear ({} bytes PEM)", bob.rsa_public_key.len());
    println!(
        "  Private key stored wrapped: {}...",
        &bob.rsa_private_key_wrapped[..24]
    );
    println!();

    // Step 2: Alice encrypts a direct message for Bob
    println!("Step 2: Encrypting a direct message for Bob...");
    let envelope =
        hybrid::encrypt_for_recipient("hello", &bob.rsa_public_key).expect("Encryption failed");
    println!("  Envelope: {}...", &envelope[..48]);
    println!("  Decrypted: {}", hybrid::decrypt(&envelope, &bob_private));
    println!();

    // Step 3: Tampering is detected, the reader gets the stored text back
    println!("Step 3: Decrypting a corrupted envelope...");
    let mut corrupted = envelope.clone().into_bytes();
    let mid = corrupted.len() / 2;
    corrupted[mid] = if corrupted[mid] == b'A' { b'B' } else { b'A' };
    let corrupted = String::from_utf8(corrupted).expect("base64 is ASCII");
    let result = hybrid::decrypt(&corrupted, &bob_private);
    println!("  Returned input unchanged: {}", result == corrupted);
    println!();

    // Step 4: Group messages use a shared 256-bit key
    println!("Step 4: Group message under a shared key...");
    let key = GroupKey::generate();
    let group_envelope = group::encrypt("standup at 10", &key).expect("Encryption failed");
    println!("  Decrypted: {}", group::decrypt(&group_envelope, &key));
    println!(
        "  16-byte key rejected: {}",
        group::encrypt_with_key_bytes("x", &[0u8; 16]).is_err()
    );

    println!("\n=== Demo Complete ===");
}
