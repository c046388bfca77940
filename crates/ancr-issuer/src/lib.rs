//! # ancr-issuer — Issuer Orchestration
//!
//! Produces the registry objects and credentials holders prove against.
//! Used to build fixtures for tests and the CLI demo.
//!
//! ## Architecture
//!
//! - **Service** (`service.rs`): schema, credential definition and
//!   revocation registry creation, status list updates, offers and
//!   issuance, all routed through `ancr-registry`.
//! - **Errors** (`error.rs`): `IssuerError`.
//!
//! ## Crate Policy
//!
//! - Private key material is stored in the local record store only.
//! - Tails files are published through the `TailsStorage` collaborator
//!   before the definition is registered, so `tailsLocation` is always a
//!   public location.

pub mod error;
pub mod service;

pub use error::IssuerError;
pub use service::{CreatedRevocationRegistry, IssuedCredential, IssuerService};
