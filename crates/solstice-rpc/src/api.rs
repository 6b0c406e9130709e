use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

use crate::types::{RpcBootstrapStatus, RpcGenesisDocument, RpcValidator};

/// Bootstrap coordinator JSON-RPC 2.0 API definition.
///
/// All method names are prefixed with "bootstrap_" via `namespace = "bootstrap"`.
#[rpc(server, client, namespace = "bootstrap")]
pub trait BootstrapApi {
    /// Register a validator descriptor. Blocks until the genesis document is
    /// finalized (which this call itself may trigger), then returns it.
    /// After finalization, re-registering a known key with an unchanged name
    /// updates its core address in place and returns the current document.
    #[method(name = "registerValidator")]
    async fn register_validator(&self, validator: RpcValidator) -> RpcResult<RpcGenesisDocument>;

    /// Observe the genesis document without registering. Blocks until
    /// finalized.
    #[method(name = "queryGenesis")]
    async fn query_genesis(&self) -> RpcResult<RpcGenesisDocument>;

    /// Return registration progress. Never blocks.
    #[method(name = "getStatus")]
    async fn get_status(&self) -> RpcResult<RpcBootstrapStatus>;
}
