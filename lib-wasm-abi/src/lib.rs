//! WASM Contract ABI Serializer
//!
//! Bidirectional transcoding between the compact binary wire format used by
//! contract payloads and JSON-shaped value trees, driven by a contract ABI
//! document (typedefs, structs with single inheritance, actions, tables).
//!
//! The two core operations are:
//! - `binary_to_variant` - decode a binary payload into a `serde_json::Value`
//! - `variant_to_binary` - encode a `serde_json::Value` into canonical bytes
//!
//! Both run under a wall-clock deadline and enforce hard structural limits
//! (array sizes, schema recursion), so adversarial schemas or payloads fail
//! in bounded time instead of diverging.
//!
//! # Determinism
//!
//! Encoded bytes are canonical: two nodes serializing the same value tree
//! against the same ABI MUST produce identical bytes, because contract
//! payloads are hashed and signed downstream. Aggregate key order on decode
//! is equally deterministic (struct declaration order, base fields first).
//!
//! # Module Structure
//!
//! - `datastream` - positional byte cursors over caller-owned buffers
//! - `varint` - LEB128 varuint32 / zig-zag varint32
//! - `types` - fixed-width chain value types (name, symbol, asset)
//! - `abi` - the ABI model, validator, built-in codec registry and the
//!   recursive transcoder

pub mod abi;
pub mod datastream;
pub mod types;
pub mod varint;

// Re-export the public surface for convenience
pub use abi::context::{TraverseContext, MAX_ARRAY_SIZE};
pub use abi::errors::{AbiError, AbiResult};
pub use abi::schema::{
    AbiDef, ActionDef, ErrorMessageDef, FieldDef, StructDef, TableDef, TypeDef,
};
pub use abi::serializer::AbiSerializer;
pub use datastream::{DataStream, DataStreamMut};
pub use types::{Asset, Name, Symbol, SymbolCode};
