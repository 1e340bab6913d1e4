//! Artifact storage port.
//!
//! The router only ever sees `dyn ArtifactStore`, so a persistent backend can
//! replace [`InMemoryArtifactStore`] without touching request handling.
//!
//! Records live for the lifetime of the process at most. Nothing here
//! survives a restart.

mod memory;

use std::{future::Future, pin::Pin, time::Duration};

use crate::{
    artifact::{ArtifactId, ArtifactRecord, NewArtifact},
    error::Result,
};

pub use memory::{InMemoryArtifactStore, InMemoryArtifactStoreBuilder, MemoryPolicy};

/// Boxed future returned by every [`ArtifactStore`] method.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Keyed, write-once storage for generated artifacts.
///
/// # Contract
/// * `put` is a single atomic transition from "id absent" to "id present with
///   a complete record". Readers never observe a partial record.
/// * A missing key is `Ok(None)`, never an error. `Err` is reserved for
///   backend faults.
/// * Records are immutable; there is no update.
pub trait ArtifactStore: Send + Sync {
    /// Persist a new artifact and return the stored record.
    ///
    /// A requested id that is already taken fails with
    /// [`VizportError::InvalidRequest`](crate::error::VizportError::InvalidRequest).
    fn put(&self, artifact: NewArtifact) -> StoreFuture<'_, ArtifactRecord>;

    fn get<'a>(&'a self, id: &'a ArtifactId) -> StoreFuture<'a, Option<ArtifactRecord>>;

    /// Remove a record. Returns whether it was present.
    fn evict<'a>(&'a self, id: &'a ArtifactId) -> StoreFuture<'a, bool>;

    /// Remove every record older than `max_age`, returning how many went.
    fn sweep(&self, max_age: Duration) -> StoreFuture<'_, usize>;
}
