//! Store adapters that live inside the domain crate for convenience.
//!
//! The in-memory store backs unit tests and the `memory` storage provider of
//! the server. The flat-file store lives in the `json-store` crate.

pub mod memory_store;
