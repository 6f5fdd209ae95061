/// Client public-key registry (SPEC_FULL.md §4.5), persisted as a single
/// JSON file the way the reference server's `load_public_keys` /
/// `save_public_keys` pair does, but guarded by the teacher's
/// `Arc<AsyncMutex<_>>` idiom instead of re-reading the file on every call.
use async_std::sync::Mutex as AsyncMutex;
use log::{error, info, warn};
use rsa::pkcs8::DecodePublicKey;
use rsa::RsaPublicKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Serialize, Deserialize, Default)]
struct RegistryFile {
    keys: HashMap<String, String>,
}

pub struct PublicKeyRegistry {
    path: PathBuf,
    keys: AsyncMutex<HashMap<String, String>>,
}

impl PublicKeyRegistry {
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let keys = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<RegistryFile>(&bytes) {
                Ok(file) => file.keys,
                Err(e) => {
                    warn!("Ignoring corrupt public key registry at {:?}: {}", path, e);
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        info!("Loaded {} public key(s) from {:?}", keys.len(), path);
        Self {
            path,
            keys: AsyncMutex::new(keys),
        }
    }

    pub async fn register(&self, username: &str, public_key_pem: &str) -> Result<(), String> {
        RsaPublicKey::from_public_key_pem(public_key_pem)
            .map_err(|e| format!("invalid public key PEM: {}", e))?;

        let mut keys = self.keys.lock().await;
        keys.insert(username.to_string(), public_key_pem.to_string());
        let snapshot = RegistryFile { keys: keys.clone() };
        drop(keys);

        if let Err(e) = self.persist(&snapshot).await {
            error!("Failed to persist public key registry: {}", e);
        }
        Ok(())
    }

    pub async fn get(&self, username: &str) -> Option<RsaPublicKey> {
        let keys = self.keys.lock().await;
        let pem = keys.get(username)?;
        RsaPublicKey::from_public_key_pem(pem).ok()
    }

    async fn persist(&self, snapshot: &RegistryFile) -> std::io::Result<()> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        tokio::fs::write(&self.path, bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs8::EncodePublicKey;
    use rsa::RsaPrivateKey;

    fn sample_pem() -> String {
        let mut rng = rand::rngs::OsRng;
        let private = RsaPrivateKey::new(&mut rng, 2048).unwrap();
        let public = RsaPublicKey::from(&private);
        public.to_public_key_pem(Default::default()).unwrap()
    }

    #[tokio::test]
    async fn register_then_get_round_trips() {
        let dir = std::env::temp_dir().join(format!("pubkey-registry-test-{}", uuid::Uuid::new_v4()));
        let registry = PublicKeyRegistry::load(dir.join("keys.json")).await;
        let pem = sample_pem();
        registry.register("alice", &pem).await.unwrap();
        assert!(registry.get("alice").await.is_some());
        assert!(registry.get("bob").await.is_none());
    }

    #[tokio::test]
    async fn rejects_invalid_pem() {
        let dir = std::env::temp_dir().join(format!("pubkey-registry-test-{}", uuid::Uuid::new_v4()));
        let registry = PublicKeyRegistry::load(dir.join("keys.json")).await;
        assert!(registry.register("alice", "not a key").await.is_err());
    }
}
