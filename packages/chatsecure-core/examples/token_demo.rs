//! # Token Demo
//!
//! Demonstrates the session token lifecycle: issue, validate, revoke.
//!
//! ## Run
//!
//! ```bash
//! SECRET_KEY=dev APP_SECRET=dev cargo run --example token_demo
//! ```
//!
//! Without the variables, demo secrets are used.

use std::sync::Arc;

use chatsecure_core::{Claims, CoreConfig, MemoryRevocationStore, SecurityCore, TokenType};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatsecure_core=debug".into()),
        )
        .init();

    println!("=== ChatSecure Core: Session Token Demo ===\n");

    let config = CoreConfig::from_env().unwrap_or_else(|e| {
        println!("  ({}; using demo secrets)\n", e);
        CoreConfig::new("demo-token-secret", "demo-app-secret").expect("Failed to build config")
    });
    let store = Arc::new(MemoryRevocationStore::new());
    let core = SecurityCore::new(config, store.clone()).expect("Failed to initialize core");
    let tokens = core.tokens();

    println!("Step 1: Issuing tokens for alice...");
    let mut claims = Claims::new();
    claims.insert("sub".into(), "alice".into());
    let access = tokens
        .issue_access(&claims, None, None)
        .await
        .expect("Issuance failed");
    let refresh = tokens
        .issue_refresh(&claims, None)
        .await
        .expect("Issuance failed");
    println!("  Access token:  {}...", &access[..32]);
    println!("  Refresh token: {}...", &refresh[..32]);
    println!("  Caller claims untouched: {:?}", claims);
    println!("  Tracked jtis: {}", store.len());
    println!();

    println!("Step 2: Validating...");
    println!("  Subject: {:?}", tokens.get_subject(&access).await);
    println!(
        "  Refresh presented as access: {:?}",
        tokens.validate_default(&refresh, TokenType::Access).await.map(|_| ())
    );
    println!();

    println!("Step 3: Revoking the access token...");
    let revoked = tokens.revoke(&access).await.expect("Store unavailable");
    println!("  Revoked: {}", revoked);
    println!("  Subject after revocation: {:?}", tokens.get_subject(&access).await);

    println!("\n=== Demo Complete ===");
}
