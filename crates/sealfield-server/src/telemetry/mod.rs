//! Structured logging setup.
//!
//! # Telemetry invariants
//!
//! - **No plaintext, digests, or key material** may appear in any span
//!   attribute or log field. Field names and operators are fine.
//! - Log level is configurable via `SEALFIELD_LOG_LEVEL` (default: `info`),
//!   overridden by `RUST_LOG` when set.

pub mod init;

pub use init::init_telemetry;
