//! Storage backends
//!
//! Only the in-memory backend ships with wicket. It is process-local and
//! loses everything on restart, which suits tests, demos and single-node
//! deployments behind an external store of record.

pub mod memory;

pub use memory::MemoryRepositoryProvider;
