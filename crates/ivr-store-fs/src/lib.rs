//! Filesystem backend for IVR session records.
//!
//! Each call is one pretty-printed JSON file under a data directory. Writes
//! go through a temp file and a rename, one session at a time.

mod encode;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::FsStore;
