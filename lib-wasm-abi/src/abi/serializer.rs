//! The recursive binary <-> value transcoder.
//!
//! `AbiSerializer` owns the validated schema maps and the built-in codec
//! registry. Transcoding resolves the requested type through typedefs,
//! dispatches primitives (including their `[]`/`?` forms) to the registry,
//! and walks arrays, optionals and struct inheritance chains recursively,
//! checking the per-call deadline at every entry.
//!
//! After `set_abi` succeeds the schema maps never change, so `&self`
//! transcoding is safe from multiple threads as long as each call brings its
//! own buffers; re-loading an ABI takes `&mut self`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::debug;

use crate::abi::context::{TraverseContext, MAX_ARRAY_SIZE};
use crate::abi::errors::{AbiError, AbiResult};
use crate::abi::registry::{configure_built_in_types, BuiltinCodec};
use crate::abi::schema::{AbiDef, StructDef, SUPPORTED_ABI_VERSION_PREFIX};
use crate::abi::typename::{fundamental_type, is_array, is_optional, remove_bin_extension};
use crate::datastream::{DataStream, DataStreamMut};
use crate::varint;

/// Encode output starts at this capacity and is truncated to the bytes
/// actually written.
const PACK_BUFFER_CAPACITY: usize = 1024 * 1024;

/// Schema-driven transcoder between contract binary payloads and JSON-shaped
/// value trees.
#[derive(Debug)]
pub struct AbiSerializer {
    pub(crate) typedefs: HashMap<String, String>,
    pub(crate) structs: HashMap<String, StructDef>,
    pub(crate) actions: HashMap<String, String>,
    pub(crate) tables: HashMap<String, String>,
    pub(crate) error_messages: HashMap<u64, String>,
    pub(crate) built_in_types: HashMap<&'static str, Arc<BuiltinCodec>>,
    pub(crate) max_serialization_time: Duration,
}

impl AbiSerializer {
    /// Construct a serializer and validate `abi` under `max_serialization_time`.
    pub fn new(abi: &AbiDef, max_serialization_time: Duration) -> AbiResult<Self> {
        let mut serializer = Self {
            typedefs: HashMap::new(),
            structs: HashMap::new(),
            actions: HashMap::new(),
            tables: HashMap::new(),
            error_messages: HashMap::new(),
            built_in_types: configure_built_in_types(),
            max_serialization_time,
        };
        serializer.set_abi(abi, max_serialization_time)?;
        Ok(serializer)
    }

    /// Replace the loaded schema. All-or-nothing: on error the serializer
    /// must not be used for transcoding until a subsequent `set_abi` succeeds.
    pub fn set_abi(&mut self, abi: &AbiDef, max_serialization_time: Duration) -> AbiResult<()> {
        let mut ctx = TraverseContext::new(max_serialization_time);

        if !abi.version.starts_with(SUPPORTED_ABI_VERSION_PREFIX) {
            return Err(AbiError::UnsupportedAbiVersion(abi.version.clone()));
        }
        self.max_serialization_time = max_serialization_time;
        self.typedefs.clear();
        self.structs.clear();
        self.actions.clear();
        self.tables.clear();
        self.error_messages.clear();

        for struct_def in &abi.structs {
            self.structs
                .insert(struct_def.name.clone(), struct_def.clone());
        }
        for typedef in &abi.types {
            if !self.is_type_inner(&typedef.type_name, &mut ctx)? {
                return Err(AbiError::InvalidTypeInsideAbi(typedef.type_name.clone())
                    .context(format!("typedef '{}'", typedef.new_type_name)));
            }
            if self.is_type_inner(&typedef.new_type_name, &mut ctx)? {
                return Err(AbiError::DuplicateAbiDef {
                    kind: "type",
                    name: typedef.new_type_name.clone(),
                });
            }
            self.typedefs
                .insert(typedef.new_type_name.clone(), typedef.type_name.clone());
        }
        for action in &abi.actions {
            self.actions
                .insert(action.name.clone(), action.type_name.clone());
        }
        for table in &abi.tables {
            self.tables.insert(table.name.clone(), table.type_name.clone());
        }
        for message in &abi.error_messages {
            self.error_messages
                .insert(message.error_code, message.error_msg.clone());
        }

        // The source sequences may contain duplicates which would make the
        // document an invalid ABI.
        reject_duplicates("type", self.typedefs.len(), abi.types.iter().map(|t| t.new_type_name.as_str()))?;
        reject_duplicates("struct", self.structs.len(), abi.structs.iter().map(|s| s.name.as_str()))?;
        reject_duplicates("action", self.actions.len(), abi.actions.iter().map(|a| a.name.as_str()))?;
        reject_duplicates("table", self.tables.len(), abi.tables.iter().map(|t| t.name.as_str()))?;

        self.validate(&mut ctx)?;

        debug!(
            typedefs = self.typedefs.len(),
            structs = self.structs.len(),
            actions = self.actions.len(),
            tables = self.tables.len(),
            "contract ABI accepted"
        );
        Ok(())
    }

    // =========================================================================
    // Type algebra
    // =========================================================================

    pub fn is_builtin_type(&self, type_name: &str) -> bool {
        self.built_in_types.contains_key(type_name)
    }

    pub fn is_integer(&self, type_name: &str) -> bool {
        type_name.starts_with("uint") || type_name.starts_with("int")
    }

    /// Bit width of an integer type name, e.g. 32 for `uint32`.
    pub fn get_integer_size(&self, type_name: &str) -> AbiResult<u32> {
        let digits = if let Some(rest) = type_name.strip_prefix("uint") {
            rest
        } else if let Some(rest) = type_name.strip_prefix("int") {
            rest
        } else {
            return Err(AbiError::InvalidTypeInsideAbi(format!(
                "'{type_name}' is not an integer type"
            )));
        };
        digits.parse().map_err(|_| {
            AbiError::InvalidTypeInsideAbi(format!("'{type_name}' is not an integer type"))
        })
    }

    /// Follow typedef substitutions until a non-typedef name is reached,
    /// bounded by the typedef count so adversarial chains cannot diverge.
    pub fn resolve_type(&self, type_name: &str) -> String {
        let Some(mut target) = self.typedefs.get(type_name) else {
            return type_name.to_string();
        };
        for _ in 0..self.typedefs.len() {
            match self.typedefs.get(target) {
                Some(next) => target = next,
                None => break,
            }
        }
        target.clone()
    }

    pub fn is_struct(&self, type_name: &str) -> bool {
        self.structs.contains_key(&self.resolve_type(type_name))
    }

    /// True if `type_name` (after suffix stripping and typedef resolution)
    /// names a built-in, a typedef of a type, or a struct.
    pub fn is_type(&self, type_name: &str, max_serialization_time: Duration) -> AbiResult<bool> {
        let mut ctx = TraverseContext::new(max_serialization_time);
        self.is_type_inner(type_name, &mut ctx)
    }

    pub(crate) fn is_type_inner(
        &self,
        type_name: &str,
        ctx: &mut TraverseContext,
    ) -> AbiResult<bool> {
        ctx.check_deadline()?;
        let fundamental = fundamental_type(type_name);
        if self.built_in_types.contains_key(fundamental) {
            return Ok(true);
        }
        if let Some(target) = self.typedefs.get(fundamental) {
            return self.is_type_inner(target, ctx);
        }
        Ok(self.structs.contains_key(fundamental))
    }

    // =========================================================================
    // Schema lookups
    // =========================================================================

    /// The struct definition behind `type_name`, after typedef resolution.
    pub fn get_struct(&self, type_name: &str) -> AbiResult<&StructDef> {
        let resolved = self.resolve_type(type_name);
        self.structs.get(&resolved).ok_or_else(|| {
            AbiError::InvalidTypeInsideAbi(format!("unknown struct '{type_name}'"))
        })
    }

    /// Payload type of an action, if the ABI declares it.
    pub fn get_action_type(&self, action: &str) -> Option<&str> {
        self.actions.get(action).map(String::as_str)
    }

    /// Row type of a table, if the ABI declares it.
    pub fn get_table_type(&self, table: &str) -> Option<&str> {
        self.tables.get(table).map(String::as_str)
    }

    /// Contract-defined message for an error code, if the ABI declares it.
    pub fn get_error_message(&self, error_code: u64) -> Option<&str> {
        self.error_messages.get(&error_code).map(String::as_str)
    }

    // =========================================================================
    // binary -> value
    // =========================================================================

    /// Decode `binary` as a value of `type_name`.
    pub fn binary_to_variant(
        &self,
        type_name: &str,
        binary: &[u8],
        max_serialization_time: Duration,
    ) -> AbiResult<Value> {
        let mut ds = DataStream::new(binary);
        let mut ctx = TraverseContext::new(max_serialization_time);
        self.binary_to_variant_inner(type_name, &mut ds, &mut ctx)
    }

    fn binary_to_variant_inner(
        &self,
        type_name: &str,
        ds: &mut DataStream<'_>,
        ctx: &mut TraverseContext,
    ) -> AbiResult<Value> {
        ctx.check_deadline()?;
        ctx.recursion_depth += 1;

        let rtype = self.resolve_type(type_name);
        let ftype = fundamental_type(&rtype);
        if let Some(codec) = self.built_in_types.get(ftype) {
            return (codec.unpack)(ds, is_array(&rtype), is_optional(&rtype))
                .map_err(|e| e.context(format!("unable to unpack type '{rtype}'")));
        }

        if is_array(&rtype) {
            let size = varint::read_varuint32(ds)
                .map_err(|e| e.context(format!("unable to unpack size of array '{rtype}'")))?;
            if size >= MAX_ARRAY_SIZE {
                return Err(AbiError::ArraySizeExceeds {
                    size,
                    max: MAX_ARRAY_SIZE,
                });
            }
            let mut items = Vec::new();
            for _ in 0..size {
                let item = self.binary_to_variant_inner(ftype, ds, ctx)?;
                if item.is_null() {
                    return Err(AbiError::Unpack(format!("invalid packed array '{rtype}'")));
                }
                items.push(item);
            }
            return Ok(Value::Array(items));
        }

        if is_optional(&rtype) {
            let flag = ds
                .read_u8()
                .map_err(|e| {
                    e.context(format!("unable to unpack presence flag of optional '{rtype}'"))
                })?;
            return if flag == 0 {
                Ok(Value::Null)
            } else {
                self.binary_to_variant_inner(ftype, ds, ctx)
            };
        }

        if let Some(struct_def) = self.structs.get(rtype.as_str()) {
            let mut object = Map::new();
            if !struct_def.base.is_empty() {
                let base =
                    self.binary_to_variant_inner(&self.resolve_type(&struct_def.base), ds, ctx)?;
                match base {
                    // base fields come first, in base declaration order
                    Value::Object(base_object) => object = base_object,
                    other => {
                        object.insert(struct_def.base.clone(), other);
                    }
                }
            }
            for field in &struct_def.fields {
                let value = self
                    .binary_to_variant_inner(remove_bin_extension(&field.type_name), ds, ctx)
                    .map_err(|e| {
                        e.context(format!(
                            "struct '{}' field '{}'",
                            struct_def.name, field.name
                        ))
                    })?;
                object.insert(field.name.clone(), value);
            }
            return Ok(Value::Object(object));
        }

        Err(AbiError::Unpack(format!(
            "unable to unpack '{rtype}' from stream"
        )))
    }

    // =========================================================================
    // value -> binary
    // =========================================================================

    /// Encode `var` as a value of `type_name` into fresh canonical bytes.
    pub fn variant_to_binary(
        &self,
        type_name: &str,
        var: &Value,
        max_serialization_time: Duration,
    ) -> AbiResult<Vec<u8>> {
        let mut ctx = TraverseContext::new(max_serialization_time);
        let mut buf = vec![0u8; PACK_BUFFER_CAPACITY];
        let mut ds = DataStreamMut::new(&mut buf);
        self.variant_to_binary_inner(type_name, var, &mut ds, &mut ctx)?;
        let written = ds.tellp();
        buf.truncate(written);
        Ok(buf)
    }

    /// Encode `var` as a value of `type_name` into a caller-owned stream.
    pub fn variant_to_binary_into(
        &self,
        type_name: &str,
        var: &Value,
        ds: &mut DataStreamMut<'_>,
        max_serialization_time: Duration,
    ) -> AbiResult<()> {
        let mut ctx = TraverseContext::new(max_serialization_time);
        self.variant_to_binary_inner(type_name, var, ds, &mut ctx)
    }

    fn variant_to_binary_inner(
        &self,
        type_name: &str,
        var: &Value,
        ds: &mut DataStreamMut<'_>,
        ctx: &mut TraverseContext,
    ) -> AbiResult<()> {
        ctx.check_deadline()?;
        ctx.recursion_depth += 1;

        let rtype = self.resolve_type(type_name);

        if let Some(codec) = self.built_in_types.get(fundamental_type(&rtype)) {
            return (codec.pack)(var, ds, is_array(&rtype), is_optional(&rtype))
                .map_err(|e| e.context(format!("cannot convert value to '{rtype}'")));
        }

        if is_array(&rtype) {
            let items = var.as_array().ok_or_else(|| {
                AbiError::InvalidTypeInsideAbi(format!("expected array for '{rtype}'"))
            })?;
            let len = u32::try_from(items.len()).map_err(|_| {
                AbiError::InvalidTypeInsideAbi(format!("array too long for '{rtype}'"))
            })?;
            varint::write_varuint32(ds, len)?;
            for item in items {
                self.variant_to_binary_inner(fundamental_type(&rtype), item, ds, ctx)?;
            }
            return Ok(());
        }

        if is_optional(&rtype) {
            return if var.is_null() {
                ds.write_u8(0)
            } else {
                ds.write_u8(1)?;
                self.variant_to_binary_inner(fundamental_type(&rtype), var, ds, ctx)
            };
        }

        if let Some(struct_def) = self.structs.get(rtype.as_str()) {
            let object = var.as_object().ok_or_else(|| {
                AbiError::InvalidTypeInsideAbi(format!("expected object for struct '{rtype}'"))
            })?;
            if !struct_def.base.is_empty() {
                // the base serializes from the same aggregate
                self.variant_to_binary_inner(&self.resolve_type(&struct_def.base), var, ds, ctx)?;
            }
            for field in &struct_def.fields {
                let value = object.get(&field.name).ok_or_else(|| {
                    AbiError::InvalidTypeInsideAbi(format!("missing field '{}'", field.name))
                        .context(format!("struct '{}'", struct_def.name))
                })?;
                self.variant_to_binary_inner(remove_bin_extension(&field.type_name), value, ds, ctx)
                    .map_err(|e| {
                        e.context(format!(
                            "struct '{}' field '{}'",
                            struct_def.name, field.name
                        ))
                    })?;
            }
            return Ok(());
        }

        Err(AbiError::InvalidTypeInsideAbi(format!(
            "unknown type '{rtype}'"
        )))
    }
}

/// Mapping smaller than its source sequence means a name appeared twice.
fn reject_duplicates<'a>(
    kind: &'static str,
    mapped: usize,
    mut names: impl Iterator<Item = &'a str> + Clone,
) -> AbiResult<()> {
    if mapped == names.clone().count() {
        return Ok(());
    }
    let mut seen = std::collections::HashSet::new();
    let name = names
        .find(|n| !seen.insert(*n))
        .unwrap_or_default()
        .to_string();
    Err(AbiError::DuplicateAbiDef { kind, name })
}
