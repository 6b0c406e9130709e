use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use solstice_core::error::BootstrapError;
use solstice_core::types::GenesisDocument;

/// File name of the persisted genesis document inside the data directory.
pub const GENESIS_FILENAME: &str = "genesis.json";

/// Durable storage for the generated genesis document.
///
/// One JSON file at a well-known path under the service's data directory.
/// Saves go through a write-then-rename sequence so a concurrent restart
/// never observes a partially-written file; the JSON round-trips exactly
/// (RFC 3339 timestamp at full precision), which is what makes finalization
/// reproducible bit-for-bit across process restarts.
pub struct GenesisFile {
    path: PathBuf,
}

impl GenesisFile {
    /// Handle for the genesis document file under `data_dir`. Does not touch
    /// the filesystem; the directory must already exist before `save`.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            path: data_dir.as_ref().join(GENESIS_FILENAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically replace the durable copy of the document.
    pub fn save(&self, doc: &GenesisDocument) -> Result<(), BootstrapError> {
        let json = serde_json::to_vec_pretty(doc)
            .map_err(|e| BootstrapError::Serialization(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)
            .map_err(|e| BootstrapError::Storage(format!("{}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| BootstrapError::Storage(format!("{}: {e}", self.path.display())))?;
        Ok(())
    }

    /// Load a previously persisted document, if any.
    ///
    /// A missing or unparseable file means "not yet finalized" — never a
    /// fatal error. An unreadable file is logged so operators can intervene.
    pub fn load(&self) -> Option<GenesisDocument> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read genesis file; starting empty");
                return None;
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "genesis file is unparseable; starting empty");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use solstice_core::types::{ValidatorDescriptor, ValidatorKey};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn test_document() -> GenesisDocument {
        GenesisDocument::new(
            Utc::now(),
            vec![ValidatorDescriptor {
                public_key: ValidatorKey::from_bytes(rand::random()),
                name: "validator-1".to_string(),
                voting_power: 10,
                core_address: "127.0.0.1:1001".to_string(),
            }],
        )
    }

    #[test]
    fn save_then_load_round_trips_exactly() {
        let dir = scratch_dir("solstice_persist_roundtrip");
        let file = GenesisFile::open(&dir);

        let doc = test_document();
        file.save(&doc).unwrap();
        assert_eq!(file.load().unwrap(), doc);

        // No leftover temp file after the rename.
        assert!(!dir.join("genesis.json.tmp").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = scratch_dir("solstice_persist_missing");
        assert!(GenesisFile::open(&dir).load().is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn garbage_file_loads_as_none() {
        let dir = scratch_dir("solstice_persist_garbage");
        std::fs::write(dir.join(GENESIS_FILENAME), b"{not json").unwrap();
        assert!(GenesisFile::open(&dir).load().is_none());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn save_overwrites_previous_document() {
        let dir = scratch_dir("solstice_persist_overwrite");
        let file = GenesisFile::open(&dir);

        let first = test_document();
        file.save(&first).unwrap();

        let mut second = first.clone();
        second.validators[0].core_address = "127.1.1.1:1001".to_string();
        file.save(&second).unwrap();

        assert_eq!(file.load().unwrap(), second);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
