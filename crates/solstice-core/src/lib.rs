//! solstice-core
//!
//! Domain types and errors shared by the Solstice genesis bootstrap service:
//! validator identities, validator descriptors, the canonical genesis
//! document, and the bootstrap error taxonomy.

pub mod error;
pub mod types;

pub use error::BootstrapError;
pub use types::*;
