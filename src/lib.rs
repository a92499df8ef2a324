//! Monitoring check for the health of a GPG public key.
//!
//! The check looks a key up in a GnuPG keyring, optionally refreshes it from
//! keyservers, and reports whether it is revoked, expired, close to expiry or
//! healthy, following the Nagios plugin output conventions.
//!
//! # Example
//!
//! ```no_run
//! use check_gpg_key::{CheckConfig, evaluate};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> check_gpg_key::Result<()> {
//!     let config = CheckConfig::new("786C63F330D7CB92", chrono::Utc::now())?
//!         .with_warning_days(30)?;
//!
//!     let result = evaluate(&config, &config.keyring()).await;
//!     println!("{result}");
//!     std::process::exit(result.exit_code());
//! }
//! ```
//!
//! # Requirements
//!
//! - `gpg` available on `PATH`
//! - Read access to the GnuPG home directory; refreshing also needs write
//!   access and a reachable keyserver

mod config;
mod error;
mod evaluator;
mod keyring;
mod parse;
mod report;
mod types;
mod validation;

pub use config::{CheckConfig, Invocation};
pub use error::{Error, Result};
pub use evaluator::evaluate;
pub use keyring::{GpgKeyring, KeyringAccessor};
pub use types::{CheckResult, KeyExpiry, ServiceState};
