/// Staged-artifact lifecycle for reconstructed downloads (SPEC_FULL.md
/// §4.4/§4.7). The reference server schedules a detached `asyncio` task per
/// download to unlink the reconstructed file after a delay; here a single
/// background janitor sweeps a TTL-tagged registry instead of spawning one
/// task per request, and a `ScratchGuard` gives RAII cleanup for the error
/// paths that never reach the janitor at all.
use dashmap::DashMap;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

pub struct ScratchArea {
    dir: PathBuf,
    ttl_secs: u64,
    staged: DashMap<PathBuf, SystemTime>,
}

impl ScratchArea {
    pub async fn new(dir: impl Into<PathBuf>, ttl_secs: u64) -> std::io::Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            ttl_secs,
            staged: DashMap::new(),
        })
    }

    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    /// Writes `data` to a scratch file and registers it for deletion after
    /// the configured TTL, returning a guard that removes the registry
    /// entry (and, if still present, the file) when dropped early.
    pub async fn stage(&self, filename: &str, data: &[u8]) -> std::io::Result<ScratchGuard<'_>> {
        let path = self.path_for(filename);
        tokio::fs::write(&path, data).await?;
        self.staged.insert(path.clone(), SystemTime::now());
        Ok(ScratchGuard {
            area: self,
            path,
            disarmed: false,
        })
    }

    /// Explicitly removes a staged file and its registry entry, for callers
    /// that have finished with the artifact before the TTL would otherwise
    /// trigger the janitor. A no-op if the file is already gone.
    pub async fn discard(&self, filename: &str) {
        let path = self.path_for(filename);
        self.staged.remove(&path);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => info!("Discarded staged scratch file {:?}", path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to discard {:?}: {}", path, e),
        }
    }

    /// Runs forever, deleting every staged file whose TTL has elapsed.
    /// Intended to be spawned once at startup.
    pub async fn run_janitor(&self, sweep_interval: Duration) {
        let mut ticker = tokio::time::interval(sweep_interval);
        loop {
            ticker.tick().await;
            self.sweep_expired().await;
        }
    }

    async fn sweep_expired(&self) {
        let now = SystemTime::now();
        let ttl = Duration::from_secs(self.ttl_secs);
        let expired: Vec<PathBuf> = self
            .staged
            .iter()
            .filter(|entry| now.duration_since(*entry.value()).unwrap_or_default() >= ttl)
            .map(|entry| entry.key().clone())
            .collect();

        for path in expired {
            self.staged.remove(&path);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => info!("Janitor removed expired scratch file {:?}", path),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Janitor failed to remove {:?}: {}", path, e),
            }
        }
    }
}

/// Removes its scratch file immediately when dropped, unless `disarm()` was
/// called first to hand responsibility off to the janitor's normal TTL.
pub struct ScratchGuard<'a> {
    area: &'a ScratchArea,
    path: PathBuf,
    disarmed: bool,
}

impl<'a> ScratchGuard<'a> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Leaves the file in place for the janitor to clean up on its normal
    /// schedule instead of deleting it when the guard drops.
    pub fn disarm(mut self) {
        self.disarmed = true;
    }
}

impl<'a> Drop for ScratchGuard<'a> {
    fn drop(&mut self) {
        if self.disarmed {
            return;
        }
        self.area.staged.remove(&self.path);
        let path = self.path.clone();
        tokio::spawn(async move {
            match tokio::fs::remove_file(&path).await {
                Ok(()) | Err(_) => {}
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stage_then_disarm_leaves_file_for_janitor() {
        let dir = std::env::temp_dir().join(format!("scratch-test-{}", uuid::Uuid::new_v4()));
        let area = ScratchArea::new(&dir, 30).await.unwrap();
        let guard = area.stage("file.bin", b"hello").await.unwrap();
        let path = guard.path().to_path_buf();
        guard.disarm();
        assert!(tokio::fs::metadata(&path).await.is_ok());
    }

    #[tokio::test]
    async fn dropping_guard_without_disarm_removes_file() {
        let dir = std::env::temp_dir().join(format!("scratch-test-{}", uuid::Uuid::new_v4()));
        let area = ScratchArea::new(&dir, 30).await.unwrap();
        let guard = area.stage("file.bin", b"hello").await.unwrap();
        let path = guard.path().to_path_buf();
        drop(guard);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(tokio::fs::metadata(&path).await.is_err());
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_entries() {
        let dir = std::env::temp_dir().join(format!("scratch-test-{}", uuid::Uuid::new_v4()));
        let area = ScratchArea::new(&dir, 0).await.unwrap();
        let guard = area.stage("file.bin", b"hello").await.unwrap();
        guard.disarm();
        area.sweep_expired().await;
        assert_eq!(area.staged.len(), 0);
    }
}
