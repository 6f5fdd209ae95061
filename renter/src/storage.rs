/// Opaque blob storage for shard bodies. The renter never interprets shard
/// content (SPEC_FULL.md §4.2) — it just writes and serves bytes under the
/// blob name the coordinator supplies.
use std::path::{Path, PathBuf};

use log::{info, warn};
use tokio::fs;

const PLACEHOLDER_NAME: &str = "storage_blocker.bin";

#[derive(Clone)]
pub struct ShardStorage {
    dir: PathBuf,
}

impl ShardStorage {
    pub async fn new(dir: &str) -> std::io::Result<Self> {
        fs::create_dir_all(dir).await?;
        Ok(Self {
            dir: PathBuf::from(dir),
        })
    }

    fn path_for(&self, blob_name: &str) -> PathBuf {
        self.dir.join(blob_name)
    }

    /// Reserves `capacity_bytes` of disk space by writing a zero-filled
    /// placeholder file at startup, mirroring the reference renter's
    /// storage-blocker file.
    pub async fn allocate_placeholder(&self, capacity_bytes: u64) -> std::io::Result<()> {
        let path = self.dir.join(PLACEHOLDER_NAME);
        let file = tokio::fs::File::create(&path).await?;
        file.set_len(capacity_bytes).await?;
        info!(
            "Reserved {} bytes of advertised capacity at {}",
            capacity_bytes,
            path.display()
        );
        Ok(())
    }

    pub async fn store(&self, blob_name: &str, data: &[u8]) -> std::io::Result<()> {
        let path = self.path_for(blob_name);
        fs::write(&path, data).await?;
        info!("Stored shard: {}", blob_name);
        Ok(())
    }

    pub async fn retrieve(&self, blob_name: &str) -> std::io::Result<Option<Vec<u8>>> {
        let path = self.path_for(blob_name);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Removing an absent blob is not an error (SPEC_FULL.md §4.7).
    pub async fn delete(&self, blob_name: &str) -> std::io::Result<()> {
        let path = self.path_for(blob_name);
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted shard: {}", blob_name);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Delete requested for absent shard: {}", blob_name);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub fn root(&self) -> &Path {
        &self.dir
    }
}
