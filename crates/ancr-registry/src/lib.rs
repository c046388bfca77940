//! # ancr-registry — Registry Resolution Layer
//!
//! Finds the registry responsible for an identifier and resolves schemas,
//! credential definitions, revocation registry definitions and status list
//! snapshots through it, short-circuiting on local records and a TTL cache.
//!
//! ## Architecture
//!
//! - **Registry contract** (`registry.rs`): the `Registry` trait, its
//!   `RegistryError`, and `IdentifierPattern` for the common matchers.
//!
//! - **In-memory registry** (`memory.rs`): a complete `Registry` that assigns
//!   ledger-style or resource-style identifiers. Used by tests and the demo.
//!
//! - **Cache** (`cache.rs`): `ResolutionCache`, keyed by
//!   `(kind, identifier, [timestamp])`, created by the caller and passed in.
//!
//! - **Local records** (`record.rs`): objects this process registered, tagged
//!   with both identifier forms at write time, plus private material.
//!
//! - **Service** (`service.rs`): `RegistryService` ties the above together.
//!   Resolution returns `Resolved<T>` with `ResolutionMetadata`; registration
//!   returns `Registered<T>`.
//!
//! ## Key Design Principles
//!
//! 1. **Resolution failure is data.** `notFound`, `invalid` and
//!    `unsupportedMethod` come back as metadata, not as `Err`.
//!
//! 2. **No global state.** The cache and record store are values with shared
//!    interiors; clones observe the same entries.
//!
//! 3. **Immutable per key.** An identifier (plus timestamp for status lists)
//!    always denotes the same object, so concurrent cache writers are
//!    last-writer-wins.
//!
//! ## Crate Policy
//!
//! - Depends only on `ancr-core` internally.
//! - Registries are synchronous; transport timeouts belong to them.

pub mod cache;
pub mod memory;
pub mod record;
pub mod registry;
pub mod service;

pub use cache::{CacheKey, CachedObject, Resolvable, ResolutionCache};
pub use memory::InMemoryRegistry;
pub use record::{CredentialDefinitionSecrets, LocalRecordStore, ObjectRecord};
pub use registry::{IdentifierPattern, Registry, RegistryError, ResourceKind};
pub use service::{
    Registered, RegistryService, ResolutionErrorKind, ResolutionFailure, ResolutionMetadata,
    ResolutionOptions, ResolutionSource, Resolved,
};
