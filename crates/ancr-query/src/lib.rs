//! # ancr-query — Restriction Query Compiler
//!
//! Turns the `restrictions` of a proof request into boolean queries over
//! credential record tags, and defines the credential store those queries
//! run against.
//!
//! ## Architecture
//!
//! - **Query** (`query.rs`): the `Eq`/`And`/`Or`/`Not` tree, its WQL form and
//!   in-memory evaluation.
//! - **Records** (`record.rs`): credential records and the tags written on
//!   them at store time.
//! - **Compiler** (`compiler.rs`): restrictions and referents to queries.
//! - **Store** (`store.rs`): the `CredentialStore` contract and an in-memory
//!   implementation.
//!
//! ## Key Design Principles
//!
//! 1. **Restrictions are alternatives.** A list compiles to `OR` of `AND`s;
//!    an empty list places no constraint.
//! 2. **Both identifier forms.** Records carry as-issued and legacy tags;
//!    queries for `did:indy` or legacy identifiers check both, so a request
//!    in either form finds credentials stored in either form.
//! 3. **Normalized attribute names.** Attribute tags ignore case and
//!    whitespace.

pub mod compiler;
pub mod query;
pub mod record;
pub mod store;

pub use compiler::{
    compile_attribute_query, compile_referent_query, compile_restriction, compile_restrictions, QueryError,
};
pub use query::Query;
pub use record::{normalize_attribute_name, tags, CredentialRecord};
pub use store::{CredentialStore, InMemoryCredentialStore, StoreError};
