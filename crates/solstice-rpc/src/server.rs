use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObject;
use tracing::info;

use solstice_core::error::BootstrapError;
use solstice_core::types::ValidatorDescriptor;
use solstice_rendezvous::{GenesisFile, RendezvousStore};

use crate::api::BootstrapApiServer;
use crate::types::{RpcBootstrapStatus, RpcGenesisDocument, RpcValidator};

/// Registration of a new identity after the genesis document was finalized.
pub const ERR_REGISTRATION_CLOSED: i32 = -32001;
/// Attempt to change the immutable name of a registered identity.
pub const ERR_IDENTITY_MISMATCH: i32 = -32002;
/// The coordinator shut down while the caller was waiting on quorum.
pub const ERR_SHUTDOWN: i32 = -32003;

fn rpc_err(code: i32, msg: impl Into<String>) -> ErrorObject<'static> {
    ErrorObject::owned(code, msg.into(), None::<()>)
}

fn bootstrap_err(e: BootstrapError) -> ErrorObject<'static> {
    let code = match &e {
        BootstrapError::RegistrationClosed => ERR_REGISTRATION_CLOSED,
        BootstrapError::IdentityMismatch { .. } => ERR_IDENTITY_MISMATCH,
        BootstrapError::Shutdown => ERR_SHUTDOWN,
        BootstrapError::Serialization(_) | BootstrapError::Storage(_) => -32603,
    };
    rpc_err(code, e.to_string())
}

/// The network-facing bootstrap coordinator.
///
/// Owns one [`RendezvousStore`]; on construction it asks the persistence
/// layer for an existing genesis document and seeds the store as already
/// finalized before serving any request.
pub struct Coordinator {
    store: Arc<RendezvousStore>,
}

impl Coordinator {
    /// Build a coordinator over `data_dir`, restoring persisted state if the
    /// genesis file exists.
    pub fn new<P: AsRef<Path>>(threshold: usize, data_dir: P) -> Self {
        let store = RendezvousStore::new(threshold, GenesisFile::open(data_dir));
        Self {
            store: Arc::new(store),
        }
    }

    /// Start the JSON-RPC server on `addr`. Returns a handle; `stop()` on it
    /// releases the listener and unblocks callers waiting on network I/O,
    /// while in-flight critical sections complete normally.
    pub async fn start(self, addr: SocketAddr) -> anyhow::Result<ServerHandle> {
        let server = Server::builder().build(addr).await?;
        let module = self.into_rpc();
        let handle = server.start(module);
        info!(%addr, "bootstrap coordinator listening");
        Ok(handle)
    }
}

#[async_trait]
impl BootstrapApiServer for Coordinator {
    async fn register_validator(&self, validator: RpcValidator) -> RpcResult<RpcGenesisDocument> {
        let descriptor = ValidatorDescriptor::try_from(validator)
            .map_err(|e| rpc_err(-32602, format!("invalid public key: {e}")))?;

        // The store's critical section ends before the wait begins; this
        // task suspends without blocking other callers.
        let outcome = self
            .store
            .register(descriptor)
            .await
            .map_err(bootstrap_err)?;
        let doc = outcome.wait().await.map_err(bootstrap_err)?;

        Ok(RpcGenesisDocument::from(&doc))
    }

    async fn query_genesis(&self) -> RpcResult<RpcGenesisDocument> {
        let doc = self
            .store
            .query()
            .await
            .wait()
            .await
            .map_err(bootstrap_err)?;
        Ok(RpcGenesisDocument::from(&doc))
    }

    async fn get_status(&self) -> RpcResult<RpcBootstrapStatus> {
        Ok(self.store.status().await.into())
    }
}
