use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info};

use solstice_core::error::BootstrapError;
use solstice_core::types::{GenesisDocument, ValidatorDescriptor, ValidatorKey};

use crate::persist::GenesisFile;

/// Result of a `register` or `query` call.
///
/// `Pending` carries a subscription to the finalize broadcast; awaiting it
/// happens outside the store lock, so a waiter never blocks another caller's
/// critical section.
pub enum Outcome {
    /// Genesis is finalized; the current document.
    Ready(GenesisDocument),
    /// Quorum not yet reached; resolves at the finalize event.
    Pending(watch::Receiver<Option<GenesisDocument>>),
}

impl Outcome {
    /// Resolve to the genesis document, suspending until finalization if
    /// quorum has not been reached yet. Every waiter released by the same
    /// finalize event observes an identical document.
    pub async fn wait(self) -> Result<GenesisDocument, BootstrapError> {
        match self {
            Outcome::Ready(doc) => Ok(doc),
            Outcome::Pending(mut rx) => {
                let guard = rx
                    .wait_for(|doc| doc.is_some())
                    .await
                    .map_err(|_| BootstrapError::Shutdown)?;
                guard.as_ref().cloned().ok_or(BootstrapError::Shutdown)
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Outcome::Ready(_))
    }
}

/// Progress snapshot returned by [`RendezvousStore::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStatus {
    pub registered: usize,
    pub threshold: usize,
    pub finalized: bool,
}

struct Inner {
    registered: HashMap<ValidatorKey, ValidatorDescriptor>,
    document: Option<GenesisDocument>,
}

/// Authoritative record of registered validators and, once quorum is reached,
/// the generated genesis document.
///
/// All mutation runs under one mutex scoped to the check/update/finalize
/// decision; the lock is never held across a suspension. The finalize event is
/// fanned out through a watch channel, so subscribing races safely with a
/// concurrent finalize (a subscriber always observes the current value), and
/// every waiter resumes with the same document.
pub struct RendezvousStore {
    threshold: usize,
    file: GenesisFile,
    inner: Mutex<Inner>,
    doc_tx: watch::Sender<Option<GenesisDocument>>,
}

impl RendezvousStore {
    /// Create a store over `file`, restoring an already-finalized state if a
    /// persisted document exists. Registration is closed from the start in
    /// that case; otherwise the store begins empty and collects until
    /// `threshold` distinct validator keys have registered.
    pub fn new(threshold: usize, file: GenesisFile) -> Self {
        let restored = file.load();
        let registered = match &restored {
            Some(doc) => {
                info!(
                    validators = doc.validators.len(),
                    genesis_time = %doc.genesis_time,
                    "restored finalized genesis document from disk"
                );
                doc.validators
                    .iter()
                    .map(|v| (v.public_key.clone(), v.clone()))
                    .collect()
            }
            None => {
                info!(threshold, "no persisted genesis document; collecting registrations");
                HashMap::new()
            }
        };

        let (doc_tx, _) = watch::channel(restored.clone());
        Self {
            threshold,
            file,
            inner: Mutex::new(Inner {
                registered,
                document: restored,
            }),
            doc_tx,
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Register a validator descriptor.
    ///
    /// Before finalization this upserts the descriptor and, when the count of
    /// distinct keys reaches the threshold, finalizes: the genesis time is
    /// captured, the document snapshot is built, every current waiter is
    /// released, and the document is saved. After finalization a known key
    /// with an unchanged name updates its `core_address`/`voting_power` in
    /// place (in both the registration map and the document); an unknown key
    /// is rejected. A name change is rejected in either phase without
    /// mutating anything.
    pub async fn register(
        &self,
        descriptor: ValidatorDescriptor,
    ) -> Result<Outcome, BootstrapError> {
        let mut inner = self.inner.lock().await;

        if let Some(existing) = inner.registered.get(&descriptor.public_key) {
            if existing.name != descriptor.name {
                return Err(BootstrapError::IdentityMismatch {
                    key: descriptor.public_key.to_b58(),
                    registered: existing.name.clone(),
                });
            }
        } else if inner.document.is_some() {
            return Err(BootstrapError::RegistrationClosed);
        }

        if inner.document.is_some() {
            return self.update_validator(&mut inner, descriptor);
        }

        let key = descriptor.public_key.clone();
        inner.registered.insert(key.clone(), descriptor);

        if inner.registered.len() < self.threshold {
            debug!(
                validator = %key,
                registered = inner.registered.len(),
                threshold = self.threshold,
                "validator registered; waiting for quorum"
            );
            return Ok(Outcome::Pending(self.doc_tx.subscribe()));
        }

        // Quorum. Finalize exactly once: snapshot, broadcast, then persist.
        let doc = GenesisDocument::new(
            Utc::now(),
            inner.registered.values().cloned().collect(),
        );
        inner.document = Some(doc.clone());
        self.doc_tx.send_replace(Some(doc.clone()));
        info!(
            validators = doc.validators.len(),
            genesis_time = %doc.genesis_time,
            "genesis document finalized"
        );

        // A save failure is surfaced to the triggering caller only; the other
        // waiters have already been released. Losing durability must not
        // deadlock quorum — but the next restart would start empty, so this
        // needs operator remediation.
        if let Err(e) = self.file.save(&doc) {
            error!(error = %e, "failed to persist genesis document");
            return Err(e);
        }

        Ok(Outcome::Ready(doc))
    }

    /// Post-finalization in-place update of a known validator. Called with the
    /// state lock held.
    fn update_validator(
        &self,
        inner: &mut Inner,
        descriptor: ValidatorDescriptor,
    ) -> Result<Outcome, BootstrapError> {
        let key = descriptor.public_key.clone();
        let address = descriptor.core_address.clone();
        let power = descriptor.voting_power;
        inner.registered.insert(key.clone(), descriptor);

        let doc = match inner.document.as_mut() {
            Some(doc) => {
                if let Some(entry) = doc.validators.iter_mut().find(|v| v.public_key == key) {
                    entry.core_address = address.clone();
                    entry.voting_power = power;
                }
                doc.clone()
            }
            // Unreachable: callers check `document.is_some()` under this lock.
            None => return Err(BootstrapError::RegistrationClosed),
        };

        self.doc_tx.send_replace(Some(doc.clone()));
        info!(validator = %key, %address, "validator record updated after genesis");

        self.file.save(&doc)?;
        Ok(Outcome::Ready(doc))
    }

    /// Observe the genesis document without registering. Resolves immediately
    /// once finalized; otherwise at the next finalize event.
    pub async fn query(&self) -> Outcome {
        let inner = self.inner.lock().await;
        match &inner.document {
            Some(doc) => Outcome::Ready(doc.clone()),
            None => Outcome::Pending(self.doc_tx.subscribe()),
        }
    }

    pub async fn status(&self) -> StoreStatus {
        let inner = self.inner.lock().await;
        StoreStatus {
            registered: inner.registered.len(),
            threshold: self.threshold,
            finalized: inner.document.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn test_descriptor(index: u16) -> ValidatorDescriptor {
        ValidatorDescriptor {
            public_key: ValidatorKey::from_bytes(rand::random()),
            name: format!("validator-{index}"),
            voting_power: 10,
            core_address: format!("127.0.0.1:{}", 1000 + index),
        }
    }

    fn scratch_store(name: &str, threshold: usize) -> (RendezvousStore, PathBuf) {
        let dir = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        (
            RendezvousStore::new(threshold, GenesisFile::open(&dir)),
            dir,
        )
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn quorum_releases_every_waiter_with_one_document() {
        let (store, dir) = scratch_store("solstice_store_quorum", 3);
        let store = Arc::new(store);

        let v1 = test_descriptor(1);
        let v2 = test_descriptor(2);
        let v3 = test_descriptor(3);

        let o1 = store.register(v1.clone()).await.unwrap();
        let o2 = store.register(v2.clone()).await.unwrap();
        assert!(!o1.is_ready());
        assert!(!o2.is_ready());

        let q = store.query().await;
        assert!(!q.is_ready());
        assert_eq!(
            store.status().await,
            StoreStatus {
                registered: 2,
                threshold: 3,
                finalized: false
            }
        );

        let w1 = tokio::spawn(o1.wait());
        let w2 = tokio::spawn(o2.wait());
        let wq = tokio::spawn(q.wait());

        // The third registration triggers finalization and must itself
        // resolve with the same document as every waiter.
        let doc = store.register(v3.clone()).await.unwrap().wait().await.unwrap();

        let d1 = w1.await.unwrap().unwrap();
        let d2 = w2.await.unwrap().unwrap();
        let dq = wq.await.unwrap().unwrap();
        assert_eq!(d1, doc);
        assert_eq!(d2, doc);
        assert_eq!(dq, doc);

        assert_eq!(doc.validators.len(), 3);
        for v in [&v1, &v2, &v3] {
            assert_eq!(doc.validator(&v.public_key), Some(v));
        }

        // Subsequent queries resolve immediately with the same genesis time.
        let again = store.query().await.wait().await.unwrap();
        assert_eq!(again.genesis_time, doc.genesis_time);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn name_change_is_rejected_before_genesis() {
        let (store, dir) = scratch_store("solstice_store_prename", 2);

        let v1 = test_descriptor(1);
        assert!(!store.register(v1.clone()).await.unwrap().is_ready());

        let mut renamed = v1.clone();
        renamed.name = "foovalidator".to_string();
        assert!(matches!(
            store.register(renamed).await,
            Err(BootstrapError::IdentityMismatch { .. })
        ));

        // A same-name re-registration is an upsert, not a new identity.
        let mut moved = v1.clone();
        moved.core_address = "127.1.1.1:1001".to_string();
        assert!(!store.register(moved).await.unwrap().is_ready());
        assert_eq!(store.status().await.registered, 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn address_update_after_genesis_keeps_genesis_time() {
        let (store, dir) = scratch_store("solstice_store_update", 1);

        let v1 = test_descriptor(1);
        let doc = store.register(v1.clone()).await.unwrap().wait().await.unwrap();

        let mut moved = v1.clone();
        moved.core_address = "127.1.1.1:1001".to_string();
        let updated = store.register(moved.clone()).await.unwrap().wait().await.unwrap();

        assert_eq!(updated.genesis_time, doc.genesis_time);
        assert_eq!(updated.validators.len(), 1);
        assert_eq!(
            updated.validator(&v1.public_key).unwrap().core_address,
            "127.1.1.1:1001"
        );

        // Query reflects the new address immediately, and so does the
        // durable copy.
        let queried = store.query().await.wait().await.unwrap();
        assert_eq!(queried, updated);
        assert_eq!(GenesisFile::open(&dir).load().unwrap(), updated);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn name_change_is_rejected_after_genesis() {
        let (store, dir) = scratch_store("solstice_store_postname", 1);

        let v1 = test_descriptor(1);
        let doc = store.register(v1.clone()).await.unwrap().wait().await.unwrap();

        let mut renamed = v1.clone();
        renamed.name = "foovalidator".to_string();
        assert!(matches!(
            store.register(renamed).await,
            Err(BootstrapError::IdentityMismatch { .. })
        ));

        // State untouched.
        assert_eq!(store.query().await.wait().await.unwrap(), doc);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn new_identity_after_genesis_is_rejected() {
        let (store, dir) = scratch_store("solstice_store_closed", 1);

        let v1 = test_descriptor(1);
        let doc = store.register(v1).await.unwrap().wait().await.unwrap();

        assert!(matches!(
            store.register(test_descriptor(2)).await,
            Err(BootstrapError::RegistrationClosed)
        ));
        assert_eq!(store.query().await.wait().await.unwrap(), doc);
        assert_eq!(store.status().await.registered, 1);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn restart_restores_finalized_state() {
        let (store, dir) = scratch_store("solstice_store_restart", 2);

        let v1 = test_descriptor(1);
        let v2 = test_descriptor(2);
        let o1 = store.register(v1).await.unwrap();
        let doc = store.register(v2).await.unwrap().wait().await.unwrap();
        assert_eq!(o1.wait().await.unwrap(), doc);
        drop(store);

        // A fresh store over the same data directory is finalized from the
        // start and answers queries without waiting.
        let restored = RendezvousStore::new(2, GenesisFile::open(&dir));
        let q = restored.query().await;
        assert!(q.is_ready());
        assert_eq!(q.wait().await.unwrap(), doc);
        assert!(restored.status().await.finalized);

        // And new identities stay rejected.
        assert!(matches!(
            restored.register(test_descriptor(3)).await,
            Err(BootstrapError::RegistrationClosed)
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
