//! # Teller Test Utilities
//!
//! Shared test utilities for the teller service.
//!
//! This crate provides:
//! - Fixed RSA key pairs and token signing helpers (`crypto_fixtures`)
//! - A fluent claims builder (`token_builders`)
//! - Server test harness (`TestTellerServer` for E2E tests)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use teller_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> anyhow::Result<()> {
//!     let server = TestTellerServer::spawn().await?;
//!     public_key_mock(PRIMARY_KID, PRIMARY_PUBLIC_KEY_PEM)
//!         .mount(server.key_server())
//!         .await;
//!
//!     let claims = TestTokenBuilder::new().with_roles(&["customer"]).build();
//!     let token = sign_rs256(&claims, PRIMARY_KID, PRIMARY_PRIVATE_KEY_PEM);
//!
//!     let response = reqwest::Client::new()
//!         .get(format!("{}/make-change?total=0.41", server.url()))
//!         .bearer_auth(token)
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod crypto_fixtures;
pub mod server_harness;
pub mod token_builders;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use server_harness::*;
pub use token_builders::*;
