//! # ancr-revocation — Revocation State Reconstructor
//!
//! Reconstructs, for one credential slot and one point in time, the status
//! list snapshot and accumulator witness a non-revocation proof needs. Used
//! by holders while assembling presentations and by verifiers while
//! rebuilding the snapshots a presentation claims.
//!
//! ## Architecture
//!
//! - **Reconstructor** (`reconstructor.rs`): resolution of definition and
//!   snapshot through `ancr-registry`, tails retrieval, witness construction
//!   through the `ProofEngine`, interval override tokens.
//! - **Interval policy** (`interval.rs`): the best-practice check on
//!   `non_revoked` intervals.
//! - **Tails storage** (`tails.rs`): the `TailsStorage` collaborator and a
//!   hash-verifying filesystem implementation.
//! - **Status** (`status.rs`): revocation bits of a snapshot.
//!
//! ## Key Design Principles
//!
//! 1. **As-of semantics.** A lookup at `T` uses the latest snapshot with
//!    `timestamp <= T`, never a later one.
//! 2. **`to` is the lookup point.** For an interval, the snapshot current at
//!    `to` is used; if it predates `from`, an override token records it.
//! 3. **Verified tails.** A tails file is used only after its SHA-256
//!    matches the definition's `tailsHash`.

pub mod error;
pub mod interval;
pub mod reconstructor;
pub mod status;
pub mod tails;

pub use error::RevocationError;
pub use interval::{assert_best_practice_interval, CheckedInterval};
pub use reconstructor::{IntervalReconstruction, ReconstructedState, RevocationStateReconstructor};
pub use status::{is_revoked, revoked_indices};
pub use tails::{LocalTailsStorage, TailsError, TailsStorage};
