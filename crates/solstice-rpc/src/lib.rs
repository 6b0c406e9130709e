//! solstice-rpc
//!
//! JSON-RPC 2.0 surface of the genesis bootstrap coordinator.
//!
//! Namespace: "bootstrap"
//! Methods:
//!   bootstrap_registerValidator — register a validator descriptor; blocks
//!                                 until the genesis document is finalized
//!   bootstrap_queryGenesis      — observe the genesis document; blocks
//!                                 until finalized
//!   bootstrap_getStatus         — registration progress (non-blocking)

pub mod api;
pub mod client;
pub mod server;
pub mod types;

pub use client::ClientError;
pub use server::Coordinator;
pub use types::{RpcBootstrapStatus, RpcGenesisDocument, RpcValidator};
