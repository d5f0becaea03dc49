//! # udap-core
//!
//! Shared session types for the udap-rs conformance tooling.
//!
//! Everything that operates on per-user state — credential storage, the
//! HTTP pipeline — takes an explicit [`SessionContext`] parameter. There is
//! deliberately no ambient "current session" singleton: callers own the
//! context and pass it down.

mod context;
mod settings;

pub use context::SessionContext;
pub use settings::SessionSettings;
