//! [`FsStore`] — the filesystem implementation of [`SessionStore`].

use std::{
  future::Future,
  io::ErrorKind,
  path::{Path, PathBuf},
  sync::Arc,
};

use dashmap::DashMap;
use ivr_core::{
  session::{RecordUpdate, SessionId, SessionRecord},
  store::SessionStore,
};
use tokio::{
  fs,
  sync::{Mutex, OwnedMutexGuard},
};
use tracing::debug;

use crate::{
  Error, Result,
  encode::{decode_record, encode_record, file_key},
};

/// Per-session locks. Different sessions never contend.
type SessionLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Exclusive access to one session's record.
///
/// On drop the lock entry is removed from the table unless another callback
/// holds or waits on it, so the table only tracks sessions in flight.
struct SessionGuard {
  locks: SessionLocks,
  key:   String,
  guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SessionGuard {
  fn drop(&mut self) {
    drop(self.guard.take());
    self
      .locks
      .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Session records stored as `<root>/<key>.json`.
///
/// Cloning is cheap — clones share the lock table.
#[derive(Clone)]
pub struct FsStore {
  root:  PathBuf,
  locks: SessionLocks,
}

impl FsStore {
  /// Open a store rooted at `root`, creating the directory if needed.
  pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
    let root = root.as_ref().to_path_buf();
    fs::create_dir_all(&root)
      .await
      .map_err(|e| Error::io(&root, e))?;
    Ok(Self { root, locks: Arc::new(DashMap::new()) })
  }

  pub fn root(&self) -> &Path { &self.root }

  /// The file a session is stored in.
  pub fn record_path(&self, id: &SessionId) -> PathBuf {
    self.root.join(format!("{}.json", file_key(id)))
  }

  async fn lock(&self, id: &SessionId) -> SessionGuard {
    let key = file_key(id);
    let lock = self
      .locks
      .entry(key.clone())
      .or_insert_with(|| Arc::new(Mutex::new(())))
      .clone();
    SessionGuard {
      locks: self.locks.clone(),
      key,
      guard: Some(lock.lock_owned().await),
    }
  }

  /// Read a record; `None` if its file does not exist.
  async fn read(&self, path: &Path) -> Result<Option<SessionRecord>> {
    match fs::read(path).await {
      Ok(bytes) => decode_record(&bytes, path).map(Some),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => Err(Error::io(path, e)),
    }
  }

  /// Write the full record via a temp file and a rename.
  async fn write(&self, path: &Path, record: &SessionRecord) -> Result<()> {
    let content = encode_record(record)?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, content)
      .await
      .map_err(|e| Error::io(&tmp_path, e))?;
    fs::rename(&tmp_path, path)
      .await
      .map_err(|e| Error::io(path, e))?;
    Ok(())
  }

  pub async fn load(&self, id: &SessionId) -> Result<SessionRecord> {
    let _guard = self.lock(id).await;

    let path = self.record_path(id);
    if let Some(record) = self.read(&path).await? {
      return Ok(record);
    }

    let record = SessionRecord::default();
    self.write(&path, &record).await?;
    debug!(session_id = %id, path = %path.display(), "created session record");
    Ok(record)
  }

  pub async fn merge(
    &self,
    id: &SessionId,
    update: RecordUpdate,
  ) -> Result<SessionRecord> {
    let _guard = self.lock(id).await;

    // Re-read under the lock so a racing callback's write is not lost.
    let path = self.record_path(id);
    let mut record = self.read(&path).await?.unwrap_or_default();
    record.apply(update);
    self.write(&path, &record).await?;
    debug!(session_id = %id, "merged session record");
    Ok(record)
  }

  /// Number of sessions with a callback currently holding or awaiting
  /// their lock.
  pub fn tracked_sessions(&self) -> usize { self.locks.len() }
}

// ─── SessionStore impl ───────────────────────────────────────────────────────

impl SessionStore for FsStore {
  type Error = Error;

  fn load<'a>(
    &'a self,
    id: &'a SessionId,
  ) -> impl Future<Output = Result<SessionRecord>> + Send + 'a {
    FsStore::load(self, id)
  }

  fn merge<'a>(
    &'a self,
    id: &'a SessionId,
    update: RecordUpdate,
  ) -> impl Future<Output = Result<SessionRecord>> + Send + 'a {
    FsStore::merge(self, id, update)
  }
}
