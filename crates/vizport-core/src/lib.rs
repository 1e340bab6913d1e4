//! # `vizport-core`
//!
//! Provider-agnostic building blocks of the vizport service:
//!
//! | Module        | What it provides                                                        |
//! |---------------|-------------------------------------------------------------------------|
//! | [`id`]        | `Clock` and `IdGenerator` ports, ULID based ids                         |
//! | [`artifact`]  | `ArtifactId`, immutable `ArtifactRecord`                                |
//! | [`store`]     | `ArtifactStore` port and the process-local `InMemoryArtifactStore`     |
//! | [`provider`]  | Traits a generation backend implements                                  |
//! | [`gateway`]   | `GenerationGateway`: system prompt + user prompt in, text or chunks out |
//! | [`reference`] | Stored vs. self-describing references, retrieval links                  |
//! | [`service`]   | `ArtifactService`: the create / retrieve contract                       |
//!
//! Transports (see `vizport-server`) only translate requests into
//! [`service::CreateRequest`] and map [`error::ErrorKind`] to status codes.

pub mod artifact;
pub mod error;
pub mod gateway;
pub mod generic;
pub mod id;
pub mod model;
pub mod provider;
pub mod reference;
pub mod service;
pub mod store;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use artifact::{ArtifactId, ArtifactRecord, NewArtifact};
pub use error::{ErrorKind, Result, VizportError};
pub use gateway::{Delivery, Generation, GenerationGateway};
pub use service::{ArtifactService, CreateRequest, CreateResponse, Created, CreationEvent, Storage};
pub use store::{ArtifactStore, InMemoryArtifactStore, MemoryPolicy};
