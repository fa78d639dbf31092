//! The `SessionStore` trait.
//!
//! Implemented by storage backends (e.g. `ivr-store-fs`). The webhook layer
//! depends on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::session::{RecordUpdate, SessionId, SessionRecord};

/// Abstraction over durable per-call session storage.
///
/// Records are addressed only by [`SessionId`]. Writes are merges: fields
/// already on a record are never discarded.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait SessionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Return the record for `id`, creating and persisting an empty one if
  /// none exists yet.
  fn load<'a>(
    &'a self,
    id: &'a SessionId,
  ) -> impl Future<Output = Result<SessionRecord, Self::Error>> + Send + 'a;

  /// Merge `update` into the stored record for `id` and persist the full
  /// result. Returns the record as written.
  ///
  /// Concurrent merges for the same session are serialised.
  fn merge<'a>(
    &'a self,
    id: &'a SessionId,
    update: RecordUpdate,
  ) -> impl Future<Output = Result<SessionRecord, Self::Error>> + Send + 'a;
}
