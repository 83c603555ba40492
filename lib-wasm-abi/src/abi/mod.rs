//! Contract ABI model, validation and transcoding.
//!
//! The ABI is the schema a deployed contract publishes so that hosts can
//! translate between JSON-shaped action payloads and the canonical binary
//! wire format. This module owns the full pipeline:
//!
//! - `schema.rs` - the in-memory ABI document (typedefs, structs, actions,
//!   tables, error messages)
//! - `typename.rs` - the `T[]` / `T?` / `T$` type-name suffix algebra
//! - `registry.rs` - built-in codecs for primitive and chain types
//! - `validation.rs` - static checks run at ABI load (duplicates, unknown
//!   types, circular typedefs/inheritance, recursive struct graphs)
//! - `context.rs` - per-call deadline and recursion-depth state
//! - `serializer.rs` - the recursive binary <-> value transcoder
//! - `errors.rs` - the error taxonomy surfaced by all of the above
//!
//! # Determinism
//!
//! Transcoding output feeds signing and hashing downstream, so encoded bytes
//! and decoded aggregate key order are canonical. Anything that could make
//! two honest nodes disagree - unordered maps in the output, unchecked
//! recursion, unbounded work - is either ordered, validated away at load
//! time, or cut off by the per-call deadline.

pub mod context;
pub mod errors;
pub mod registry;
pub mod schema;
pub mod serializer;
pub mod typename;
pub mod validation;


pub use context::{TraverseContext, MAX_ARRAY_SIZE};
pub use errors::{AbiError, AbiResult};
pub use schema::{AbiDef, ActionDef, ErrorMessageDef, FieldDef, StructDef, TableDef, TypeDef};
pub use serializer::AbiSerializer;
