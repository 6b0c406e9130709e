//! solstice-rendezvous
//!
//! The genesis rendezvous store and its persistence layer.
//!
//! Validator processes register concurrently; once the configured threshold of
//! distinct identities is reached the store finalizes exactly once, producing
//! the canonical `GenesisDocument`, durably saving it, and releasing every
//! caller blocked on the quorum condition with the same document.

pub mod persist;
pub mod store;

pub use persist::GenesisFile;
pub use store::{Outcome, RendezvousStore, StoreStatus};
