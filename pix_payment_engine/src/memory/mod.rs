//! An in-process [`OrderStore`](crate::traits::OrderStore), for tests and embedding.
mod memory_store;

pub use memory_store::MemoryStore;
