//! User storage.
//!
//! The relational store that owns user records lives outside this
//! subsystem; [`UserStore`] is the lookup interface consumed here, and
//! [`MemoryUserStore`] is the in-process implementation used by tests and
//! database-less development setups.

mod memory;
mod user;

pub use memory::MemoryUserStore;
pub use user::{UserRecord, UserStore};
