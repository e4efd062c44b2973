//! Bundle data model shared by every store.
//!
//! Both records carry a `ts` revision counter used as the optimistic
//! concurrency token by the local store. Records written without one load
//! with `ts = 1`.

mod bundle;
mod version;

pub use bundle::Bundle;
pub use version::BundleVersion;

/// Initial revision of a freshly created record.
pub const INITIAL_TS: u64 = 1;

pub(crate) fn initial_ts() -> u64 {
    INITIAL_TS
}

/// A metadata record guarded by a revision counter.
pub trait Revisioned {
    fn ts(&self) -> u64;
    fn set_ts(&mut self, ts: u64);
}
