// bloomd-common - Shared types and protocol vocabulary for the bloomd client
//
// This crate defines the filter records and the wire tokens spoken by bloomd

pub mod protocol;
pub mod types;

// Re-export for convenience
pub use protocol::*;
pub use types::*;
