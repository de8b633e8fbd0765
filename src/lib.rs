//! yolink-uac — YoLink UAC authentication
//!
//! Keeps a bearer token valid for a YoLink account authenticated with User
//! Access Credentials (UAID + secret key), and verifies which home a set of
//! credentials belongs to during setup and re-authentication.
//!
//! # Quick Start
//!
//! ```no_run
//! use yolink_uac::prelude::*;
//!
//! # async fn example() -> yolink_uac::error::Result<()> {
//! let config = AuthConfig::default();
//! let credential = Credential::new("uaid", "secret");
//!
//! let source = std::sync::Arc::new(HttpIdentitySource::from_config(&config));
//! let verifier = IdentityVerifier::new(source).with_config(config.clone());
//! let home = verifier.verify(&credential, None).await?;
//!
//! let manager = TokenManager::new(credential, &config);
//! let token = manager.ensure_valid_token().await?;
//! println!("{} -> {token}", home.display_name);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod identity;
pub mod prelude;
pub mod util;
