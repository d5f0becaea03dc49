//! # udap-store
//!
//! Session-scoped key/value storage for the udap-rs conformance tooling.
//!
//! The backends this tool runs against (web session state, device secure
//! storage) share one awkward property: individual entries may be capped at
//! a few kilobytes. Certificate containers and anchor lists do not fit.
//! [`ChunkedStore`] solves this once — it splits an opaque byte value into
//! fixed-size text chunks plus a count record, and reassembles them on
//! read — so a backend only has to supply primitive `set`/`get`/`remove`
//! over strings by implementing [`SessionStore`].
//!
//! ## Consistency
//!
//! A store writes its chunk entries first and the count entry last, so a
//! reader never finds a count that points at chunks which were not yet
//! written, even if the writing task is cancelled mid-way. The layer does
//! not provide multi-key atomicity: callers must keep to a single writer
//! per logical key. A missing chunk on read is reported as corruption,
//! never as truncated data.

mod chunked;
mod error;
mod file;
mod memory;
mod traits;

pub use chunked::{ChunkedStore, DEFAULT_CHUNK_SIZE};
pub use error::StoreError;
pub use file::FileSessionStore;
pub use memory::MemorySessionStore;
pub use traits::{DynSessionStore, SessionStore};

/// Type alias for a storage result.
pub type StoreResult<T> = Result<T, StoreError>;
