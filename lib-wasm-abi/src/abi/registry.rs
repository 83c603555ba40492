//! Built-in codec registry.
//!
//! Maps built-in type names to their `(unpack, pack)` function pair. Each
//! pair is instantiated once from a generic driver over the `BuiltIn` trait,
//! so the vector (`T[]`) and optional (`T?`) forms of every primitive are
//! handled uniformly here and the recursive transcoder never has to re-enter
//! itself for primitive arrays. Names that share a wire format share a
//! single `Arc`'d record (`name`/`table_name`/`action_name`).

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::abi::context::MAX_ARRAY_SIZE;
use crate::abi::errors::{AbiError, AbiResult};
use crate::datastream::{DataStream, DataStreamMut};
use crate::types::{Asset, Name, Symbol, SymbolCode};
use crate::varint;

pub(crate) type UnpackFn = fn(&mut DataStream<'_>, bool, bool) -> AbiResult<Value>;
pub(crate) type PackFn = fn(&Value, &mut DataStreamMut<'_>, bool, bool) -> AbiResult<()>;

/// One registry record: decoder and encoder for a built-in type, each taking
/// `(is_array, is_optional)` so `T[]` and `T?` stay inside the registry.
#[derive(Debug)]
pub(crate) struct BuiltinCodec {
    pub unpack: UnpackFn,
    pub pack: PackFn,
}

/// Wire and variant conversions for one built-in type.
trait BuiltIn: Sized {
    fn unpack(ds: &mut DataStream<'_>) -> AbiResult<Self>;
    fn pack(&self, ds: &mut DataStreamMut<'_>) -> AbiResult<()>;
    fn to_variant(&self) -> Value;
    fn from_variant(var: &Value) -> AbiResult<Self>;
}

fn invalid_variant(kind: &'static str, var: &Value) -> AbiError {
    AbiError::InvalidValue {
        kind,
        text: var.to_string().chars().take(64).collect(),
    }
}

// =========================================================================
// Primitive impls
// =========================================================================

impl BuiltIn for bool {
    fn unpack(ds: &mut DataStream<'_>) -> AbiResult<Self> {
        Ok(ds.read_u8()? != 0)
    }
    fn pack(&self, ds: &mut DataStreamMut<'_>) -> AbiResult<()> {
        ds.write_u8(u8::from(*self))
    }
    fn to_variant(&self) -> Value {
        Value::Bool(*self)
    }
    fn from_variant(var: &Value) -> AbiResult<Self> {
        var.as_bool().ok_or_else(|| invalid_variant("bool", var))
    }
}

macro_rules! impl_built_in_uint {
    ($ty:ty, $kind:literal, $read:ident, $write:ident) => {
        impl BuiltIn for $ty {
            fn unpack(ds: &mut DataStream<'_>) -> AbiResult<Self> {
                ds.$read()
            }
            fn pack(&self, ds: &mut DataStreamMut<'_>) -> AbiResult<()> {
                ds.$write(*self)
            }
            fn to_variant(&self) -> Value {
                Value::from(*self)
            }
            fn from_variant(var: &Value) -> AbiResult<Self> {
                var.as_u64()
                    .and_then(|v| <$ty>::try_from(v).ok())
                    .ok_or_else(|| invalid_variant($kind, var))
            }
        }
    };
}

macro_rules! impl_built_in_int {
    ($ty:ty, $kind:literal, $read:ident, $write:ident) => {
        impl BuiltIn for $ty {
            fn unpack(ds: &mut DataStream<'_>) -> AbiResult<Self> {
                ds.$read()
            }
            fn pack(&self, ds: &mut DataStreamMut<'_>) -> AbiResult<()> {
                ds.$write(*self)
            }
            fn to_variant(&self) -> Value {
                Value::from(*self)
            }
            fn from_variant(var: &Value) -> AbiResult<Self> {
                var.as_i64()
                    .and_then(|v| <$ty>::try_from(v).ok())
                    .ok_or_else(|| invalid_variant($kind, var))
            }
        }
    };
}

impl_built_in_uint!(u8, "uint8", read_u8, write_u8);
impl_built_in_uint!(u16, "uint16", read_u16, write_u16);
impl_built_in_uint!(u32, "uint32", read_u32, write_u32);
impl_built_in_uint!(u64, "uint64", read_u64, write_u64);
impl_built_in_int!(i8, "int8", read_i8, write_i8);
impl_built_in_int!(i16, "int16", read_i16, write_i16);
impl_built_in_int!(i32, "int32", read_i32, write_i32);
impl_built_in_int!(i64, "int64", read_i64, write_i64);

impl BuiltIn for f32 {
    fn unpack(ds: &mut DataStream<'_>) -> AbiResult<Self> {
        ds.read_f32()
    }
    fn pack(&self, ds: &mut DataStreamMut<'_>) -> AbiResult<()> {
        ds.write_f32(*self)
    }
    fn to_variant(&self) -> Value {
        Value::from(f64::from(*self))
    }
    fn from_variant(var: &Value) -> AbiResult<Self> {
        var.as_f64()
            .map(|v| v as f32)
            .ok_or_else(|| invalid_variant("float32", var))
    }
}

impl BuiltIn for f64 {
    fn unpack(ds: &mut DataStream<'_>) -> AbiResult<Self> {
        ds.read_f64()
    }
    fn pack(&self, ds: &mut DataStreamMut<'_>) -> AbiResult<()> {
        ds.write_f64(*self)
    }
    fn to_variant(&self) -> Value {
        Value::from(*self)
    }
    fn from_variant(var: &Value) -> AbiResult<Self> {
        var.as_f64().ok_or_else(|| invalid_variant("float64", var))
    }
}

/// `varint32` / `varuint32` built-ins: LEB128 on the wire, plain numbers in
/// the variant tree.
struct VarInt32(i32);
struct VarUint32(u32);

impl BuiltIn for VarUint32 {
    fn unpack(ds: &mut DataStream<'_>) -> AbiResult<Self> {
        Ok(Self(varint::read_varuint32(ds)?))
    }
    fn pack(&self, ds: &mut DataStreamMut<'_>) -> AbiResult<()> {
        varint::write_varuint32(ds, self.0)
    }
    fn to_variant(&self) -> Value {
        Value::from(self.0)
    }
    fn from_variant(var: &Value) -> AbiResult<Self> {
        var.as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .map(Self)
            .ok_or_else(|| invalid_variant("varuint32", var))
    }
}

impl BuiltIn for VarInt32 {
    fn unpack(ds: &mut DataStream<'_>) -> AbiResult<Self> {
        Ok(Self(varint::read_varint32(ds)?))
    }
    fn pack(&self, ds: &mut DataStreamMut<'_>) -> AbiResult<()> {
        varint::write_varint32(ds, self.0)
    }
    fn to_variant(&self) -> Value {
        Value::from(self.0)
    }
    fn from_variant(var: &Value) -> AbiResult<Self> {
        var.as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(Self)
            .ok_or_else(|| invalid_variant("varint32", var))
    }
}

// =========================================================================
// Length-prefixed impls
// =========================================================================

impl BuiltIn for String {
    fn unpack(ds: &mut DataStream<'_>) -> AbiResult<Self> {
        let len = varint::read_varuint32(ds)? as usize;
        let bytes = ds.read_exact(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| AbiError::Unpack("string is not valid utf-8".to_string()))
    }
    fn pack(&self, ds: &mut DataStreamMut<'_>) -> AbiResult<()> {
        let len = u32::try_from(self.len())
            .map_err(|_| invalid_variant("string", &Value::from(self.len())))?;
        varint::write_varuint32(ds, len)?;
        ds.write_bytes(self.as_bytes())
    }
    fn to_variant(&self) -> Value {
        Value::String(self.clone())
    }
    fn from_variant(var: &Value) -> AbiResult<Self> {
        var.as_str()
            .map(str::to_string)
            .ok_or_else(|| invalid_variant("string", var))
    }
}

/// The `bytes` built-in: varuint32 length prefix on the wire, lowercase hex
/// in the variant tree.
struct Bytes(Vec<u8>);

impl BuiltIn for Bytes {
    fn unpack(ds: &mut DataStream<'_>) -> AbiResult<Self> {
        let len = varint::read_varuint32(ds)? as usize;
        Ok(Self(ds.read_exact(len)?.to_vec()))
    }
    fn pack(&self, ds: &mut DataStreamMut<'_>) -> AbiResult<()> {
        let len = u32::try_from(self.0.len())
            .map_err(|_| invalid_variant("bytes", &Value::from(self.0.len())))?;
        varint::write_varuint32(ds, len)?;
        ds.write_bytes(&self.0)
    }
    fn to_variant(&self) -> Value {
        Value::String(hex::encode(&self.0))
    }
    fn from_variant(var: &Value) -> AbiResult<Self> {
        let text = var.as_str().ok_or_else(|| invalid_variant("bytes", var))?;
        hex::decode(text)
            .map(Self)
            .map_err(|_| invalid_variant("bytes", var))
    }
}

// =========================================================================
// Chain type impls (string literals in the variant tree)
// =========================================================================

macro_rules! impl_built_in_chain_type {
    ($ty:ty, $kind:literal) => {
        impl BuiltIn for $ty {
            fn unpack(ds: &mut DataStream<'_>) -> AbiResult<Self> {
                <$ty>::unpack(ds)
            }
            fn pack(&self, ds: &mut DataStreamMut<'_>) -> AbiResult<()> {
                <$ty>::pack(self, ds)
            }
            fn to_variant(&self) -> Value {
                Value::String(self.to_string())
            }
            fn from_variant(var: &Value) -> AbiResult<Self> {
                var.as_str()
                    .ok_or_else(|| invalid_variant($kind, var))?
                    .parse()
            }
        }
    };
}

impl_built_in_chain_type!(Name, "name");
impl_built_in_chain_type!(Symbol, "symbol");
impl_built_in_chain_type!(SymbolCode, "symbol_code");
impl_built_in_chain_type!(Asset, "asset");

// =========================================================================
// Generic drivers and registry construction
// =========================================================================

fn unpack_value<T: BuiltIn>(
    ds: &mut DataStream<'_>,
    is_array: bool,
    is_optional: bool,
) -> AbiResult<Value> {
    if is_array {
        let size = varint::read_varuint32(ds)?;
        if size >= MAX_ARRAY_SIZE {
            return Err(AbiError::ArraySizeExceeds {
                size,
                max: MAX_ARRAY_SIZE,
            });
        }
        let mut items = Vec::new();
        for _ in 0..size {
            items.push(T::unpack(ds)?.to_variant());
        }
        Ok(Value::Array(items))
    } else if is_optional {
        if ds.read_u8()? == 0 {
            Ok(Value::Null)
        } else {
            Ok(T::unpack(ds)?.to_variant())
        }
    } else {
        Ok(T::unpack(ds)?.to_variant())
    }
}

fn pack_value<T: BuiltIn>(
    var: &Value,
    ds: &mut DataStreamMut<'_>,
    is_array: bool,
    is_optional: bool,
) -> AbiResult<()> {
    if is_array {
        let items = var.as_array().ok_or_else(|| invalid_variant("array", var))?;
        let len = u32::try_from(items.len()).map_err(|_| invalid_variant("array", var))?;
        varint::write_varuint32(ds, len)?;
        for item in items {
            T::from_variant(item)?.pack(ds)?;
        }
        Ok(())
    } else if is_optional {
        if var.is_null() {
            ds.write_u8(0)
        } else {
            ds.write_u8(1)?;
            T::from_variant(var)?.pack(ds)
        }
    } else {
        T::from_variant(var)?.pack(ds)
    }
}

fn codec_for<T: BuiltIn>() -> Arc<BuiltinCodec> {
    Arc::new(BuiltinCodec {
        unpack: unpack_value::<T>,
        pack: pack_value::<T>,
    })
}

/// Build the name -> codec map. Called once per serializer construction.
pub(crate) fn configure_built_in_types() -> HashMap<&'static str, Arc<BuiltinCodec>> {
    let mut map: HashMap<&'static str, Arc<BuiltinCodec>> = HashMap::new();

    map.insert("bool", codec_for::<bool>());
    map.insert("int8", codec_for::<i8>());
    map.insert("uint8", codec_for::<u8>());
    map.insert("int16", codec_for::<i16>());
    map.insert("uint16", codec_for::<u16>());
    map.insert("int32", codec_for::<i32>());
    map.insert("uint32", codec_for::<u32>());
    map.insert("int64", codec_for::<i64>());
    map.insert("uint64", codec_for::<u64>());
    map.insert("varint32", codec_for::<VarInt32>());
    map.insert("varuint32", codec_for::<VarUint32>());
    map.insert("float32", codec_for::<f32>());
    map.insert("float64", codec_for::<f64>());

    // one shared record for every name-shaped built-in
    let name_codec = codec_for::<Name>();
    map.insert("name", Arc::clone(&name_codec));
    map.insert("table_name", Arc::clone(&name_codec));
    map.insert("action_name", name_codec);

    map.insert("bytes", codec_for::<Bytes>());
    map.insert("string", codec_for::<String>());
    map.insert("symbol", codec_for::<Symbol>());
    map.insert("symbol_code", codec_for::<SymbolCode>());
    map.insert("asset", codec_for::<Asset>());

    map
}
