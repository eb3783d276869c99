//! Persistent subscriber -> monitored players mapping.
//!
//! The whole mapping lives in memory and is rewritten to a JSON file on every
//! mutation. The file is read exactly once, at startup.

use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};
use crate::models::{
  PlayerName, SubscriberId, SubscriptionCounts, Subscriptions, is_valid_player_name,
};

/// Subscription mapping backed by a JSON file.
pub struct SubscriptionStore {
  path: PathBuf,
  inner: RwLock<Subscriptions>,
}

impl SubscriptionStore {
  /// Load the mapping from `path`.
  ///
  /// A missing or malformed file yields an empty mapping. The only startup
  /// failure is a file location that cannot be written to.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref().to_path_buf();
    let subscriptions = load(&path).await;
    check_writable(&path).await?;

    info!(
      path = %path.display(),
      subscribers = subscriptions.len(),
      "subscriptions loaded"
    );
    Ok(Self {
      path,
      inner: RwLock::new(subscriptions),
    })
  }

  /// Start monitoring `handle` for `subscriber`.
  /// Rejects duplicates with `AlreadyExists` without touching the file.
  pub async fn add(&self, subscriber: &str, handle: &str) -> Result<()> {
    if !is_valid_player_name(handle) {
      return Err(StoreError::InvalidPlayerName);
    }
    let name = PlayerName::try_from(handle).map_err(|_| StoreError::InvalidPlayerName)?;
    let mut current = self.inner.write().await;

    if current
      .get(subscriber)
      .is_some_and(|handles| handles.contains(&name))
    {
      return Err(StoreError::AlreadyExists);
    }

    let mut next = current.clone();
    next.entry(subscriber.to_string()).or_default().push(name);
    self.persist(&next).await?;
    *current = next;

    debug!(subscriber, player = %name, "added monitored player");
    Ok(())
  }

  /// Stop monitoring `handle` for `subscriber`.
  /// The subscriber disappears from the mapping once its list is empty.
  pub async fn remove(&self, subscriber: &str, handle: &str) -> Result<()> {
    let name = PlayerName::try_from(handle).map_err(|_| StoreError::NotFound)?;
    let mut current = self.inner.write().await;

    let idx = current
      .get(subscriber)
      .and_then(|handles| handles.iter().position(|h| *h == name))
      .ok_or(StoreError::NotFound)?;

    let mut next = current.clone();
    if let Some(handles) = next.get_mut(subscriber) {
      handles.remove(idx);
      if handles.is_empty() {
        next.remove(subscriber);
      }
    }
    self.persist(&next).await?;
    *current = next;

    debug!(subscriber, player = %name, "removed monitored player");
    Ok(())
  }

  /// Owned copy of the full mapping.
  pub async fn list_all(&self) -> Subscriptions {
    self.inner.read().await.clone()
  }

  /// Handles monitored by one subscriber, in insertion order.
  pub async fn handles_for(&self, subscriber: &str) -> Vec<PlayerName> {
    self
      .inner
      .read()
      .await
      .get(subscriber)
      .cloned()
      .unwrap_or_default()
  }

  /// Every subscriber whose list contains `handle`.
  pub async fn subscribers_of(&self, handle: &PlayerName) -> Vec<SubscriberId> {
    self
      .inner
      .read()
      .await
      .iter()
      .filter(|(_, handles)| handles.contains(handle))
      .map(|(subscriber, _)| subscriber.clone())
      .collect()
  }

  /// Each monitored handle once, however many subscribers follow it.
  pub async fn distinct_handles(&self) -> Vec<PlayerName> {
    let current = self.inner.read().await;
    let unique: BTreeSet<PlayerName> = current.values().flatten().copied().collect();
    unique.into_iter().collect()
  }

  pub async fn counts(&self) -> SubscriptionCounts {
    let current = self.inner.read().await;
    let handles: BTreeSet<&PlayerName> = current.values().flatten().collect();
    SubscriptionCounts {
      subscribers: current.len(),
      handles: handles.len(),
    }
  }

  /// Rewrite the whole file: write a sibling temp file, then rename it over the target.
  async fn persist(&self, subscriptions: &Subscriptions) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(subscriptions)?;
    let tmp = temp_path(&self.path);
    fs::write(&tmp, &bytes).await?;
    fs::rename(&tmp, &self.path).await?;
    Ok(())
  }
}

async fn load(path: &Path) -> Subscriptions {
  let bytes = match fs::read(path).await {
    Ok(bytes) => bytes,
    Err(e) if e.kind() == ErrorKind::NotFound => {
      info!(path = %path.display(), "no subscription file, starting empty");
      return Subscriptions::new();
    }
    Err(e) => {
      warn!(path = %path.display(), error = %e, "unreadable subscription file, starting empty");
      return Subscriptions::new();
    }
  };

  match serde_json::from_slice::<BTreeMap<String, Vec<String>>>(&bytes) {
    Ok(raw) => sanitize(raw),
    Err(e) => {
      warn!(path = %path.display(), error = %e, "malformed subscription file, starting empty");
      Subscriptions::new()
    }
  }
}

/// Drop invalid names, duplicates and empty lists from a loaded mapping.
fn sanitize(raw: BTreeMap<String, Vec<String>>) -> Subscriptions {
  let mut subscriptions = Subscriptions::new();
  for (subscriber, handles) in raw {
    let mut kept: Vec<PlayerName> = Vec::with_capacity(handles.len());
    for handle in handles {
      if !is_valid_player_name(&handle) {
        warn!(%subscriber, %handle, "skipping invalid player name in subscription file");
        continue;
      }
      match PlayerName::try_from(handle.as_str()) {
        Ok(name) if kept.contains(&name) => {
          warn!(%subscriber, %handle, "skipping duplicate player name in subscription file");
        }
        Ok(name) => kept.push(name),
        Err(_) => warn!(%subscriber, %handle, "skipping invalid player name in subscription file"),
      }
    }
    if !kept.is_empty() {
      subscriptions.insert(subscriber, kept);
    }
  }
  subscriptions
}

async fn check_writable(path: &Path) -> Result<()> {
  let tmp = temp_path(path);
  fs::write(&tmp, b"").await?;
  fs::remove_file(&tmp).await?;
  Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
  let name = path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| "subscriptions".to_string());
  path.with_file_name(format!(".{name}.tmp"))
}
