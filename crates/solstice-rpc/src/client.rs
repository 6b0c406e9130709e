use std::time::Duration;

use jsonrpsee::core::client::Error as RpcError;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use thiserror::Error;

use solstice_core::types::{GenesisDocument, ValidatorDescriptor};

use crate::api::BootstrapApiClient;
use crate::server::{ERR_IDENTITY_MISMATCH, ERR_REGISTRATION_CLOSED, ERR_SHUTDOWN};
use crate::types::{RpcBootstrapStatus, RpcGenesisDocument, RpcValidator};

/// Transport-level ceiling on a single blocking call. Callers bound their own
/// wait by wrapping the call in a deadline; this just keeps the HTTP request
/// open while quorum is pending.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("registration closed: genesis document already finalized")]
    RegistrationClosed,

    #[error("identity mismatch: {0}")]
    IdentityMismatch(String),

    #[error("coordinator shut down: {0}")]
    Shutdown(String),

    #[error("invalid response payload: {0}")]
    InvalidPayload(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i32, message: String },

    #[error("transport error: {0}")]
    Transport(String),
}

fn map_rpc_err(e: RpcError) -> ClientError {
    match e {
        RpcError::Call(obj) => match obj.code() {
            ERR_REGISTRATION_CLOSED => ClientError::RegistrationClosed,
            ERR_IDENTITY_MISMATCH => ClientError::IdentityMismatch(obj.message().to_string()),
            ERR_SHUTDOWN => ClientError::Shutdown(obj.message().to_string()),
            code => ClientError::Rpc {
                code,
                message: obj.message().to_string(),
            },
        },
        other => ClientError::Transport(other.to_string()),
    }
}

fn connect(addr: &str) -> Result<HttpClient, ClientError> {
    HttpClientBuilder::default()
        .request_timeout(REQUEST_TIMEOUT)
        .build(format!("http://{addr}"))
        .map_err(|e| ClientError::Transport(e.to_string()))
}

/// Register `validator` with the coordinator at `addr` and block until the
/// genesis document is available.
pub async fn register_validator(
    addr: &str,
    validator: &ValidatorDescriptor,
) -> Result<GenesisDocument, ClientError> {
    let client = connect(addr)?;
    let doc = client
        .register_validator(RpcValidator::from(validator))
        .await
        .map_err(map_rpc_err)?;
    decode_document(doc)
}

/// Block until the coordinator at `addr` has a finalized genesis document,
/// then return it.
pub async fn query_genesis(addr: &str) -> Result<GenesisDocument, ClientError> {
    let client = connect(addr)?;
    let doc = client.query_genesis().await.map_err(map_rpc_err)?;
    decode_document(doc)
}

/// Fetch registration progress from the coordinator at `addr`.
pub async fn get_status(addr: &str) -> Result<RpcBootstrapStatus, ClientError> {
    let client = connect(addr)?;
    client.get_status().await.map_err(map_rpc_err)
}

fn decode_document(doc: RpcGenesisDocument) -> Result<GenesisDocument, ClientError> {
    GenesisDocument::try_from(doc).map_err(|e| ClientError::InvalidPayload(e.to_string()))
}
