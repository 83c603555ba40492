//! The in-memory contract ABI document.
//!
//! An `AbiDef` is what a contract publishes: named typedefs, structs with
//! optional single-base inheritance, the struct type behind each action and
//! table, and custom error messages. The document deserializes directly from
//! contract ABI JSON; field names on the wire match the published format
//! (`new_type_name`/`type` for typedefs, `name`/`type` elsewhere).
//!
//! The document itself carries no invariants - `AbiSerializer::set_abi`
//! validates it (duplicates, unknown types, cycles) before any transcoding.

use serde::{Deserialize, Serialize};

/// Version prefix accepted by the serializer.
pub const SUPPORTED_ABI_VERSION_PREFIX: &str = "wasm::abi/1.";

/// A type alias: `new_type_name` serializes exactly like `type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypeDef {
    pub new_type_name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// One named, typed field of a struct.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// A struct: ordered fields, optionally inheriting a base struct.
///
/// An empty `base` means no inheritance. Base fields serialize first, in the
/// base's declaration order, recursively.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StructDef {
    pub name: String,
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

/// Maps an action name to the struct type of its payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// Maps a table name to the struct type of its rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableDef {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// A contract-defined error code and its message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorMessageDef {
    pub error_code: u64,
    pub error_msg: String,
}

/// The complete ABI document.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AbiDef {
    pub version: String,
    #[serde(default)]
    pub types: Vec<TypeDef>,
    #[serde(default)]
    pub structs: Vec<StructDef>,
    #[serde(default)]
    pub actions: Vec<ActionDef>,
    #[serde(default)]
    pub tables: Vec<TableDef>,
    #[serde(default)]
    pub error_messages: Vec<ErrorMessageDef>,
}

impl AbiDef {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Self::default()
        }
    }

    pub fn with_typedef(
        mut self,
        new_type_name: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        self.types.push(TypeDef {
            new_type_name: new_type_name.into(),
            type_name: type_name.into(),
        });
        self
    }

    pub fn with_struct(mut self, struct_def: StructDef) -> Self {
        self.structs.push(struct_def);
        self
    }

    pub fn with_action(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.actions.push(ActionDef {
            name: name.into(),
            type_name: type_name.into(),
        });
        self
    }

    pub fn with_table(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.tables.push(TableDef {
            name: name.into(),
            type_name: type_name.into(),
        });
        self
    }

    pub fn with_error_message(mut self, error_code: u64, error_msg: impl Into<String>) -> Self {
        self.error_messages.push(ErrorMessageDef {
            error_code,
            error_msg: error_msg.into(),
        });
        self
    }
}

impl StructDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base: String::new(),
            fields: Vec::new(),
        }
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            type_name: type_name.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_accumulate() {
        let abi = AbiDef::new("wasm::abi/1.0")
            .with_typedef("account_name", "name")
            .with_struct(
                StructDef::new("transfer")
                    .with_field("from", "account_name")
                    .with_field("to", "account_name")
                    .with_field("quantity", "asset"),
            )
            .with_action("transfer", "transfer")
            .with_table("accounts", "account")
            .with_error_message(1, "insufficient funds");

        assert_eq!(abi.types.len(), 1);
        assert_eq!(abi.structs[0].fields.len(), 3);
        assert_eq!(abi.actions[0].type_name, "transfer");
        assert_eq!(abi.tables[0].name, "accounts");
        assert_eq!(abi.error_messages[0].error_code, 1);
    }

    #[test]
    fn deserializes_published_json_shape() {
        let json = r#"{
            "version": "wasm::abi/1.0",
            "types": [{"new_type_name": "account_name", "type": "name"}],
            "structs": [{
                "name": "transfer",
                "base": "",
                "fields": [
                    {"name": "from", "type": "account_name"},
                    {"name": "memo", "type": "string"}
                ]
            }],
            "actions": [{"name": "transfer", "type": "transfer"}]
        }"#;
        let abi: AbiDef = serde_json::from_str(json).unwrap();
        assert_eq!(abi.types[0].type_name, "name");
        assert_eq!(abi.structs[0].fields[1].name, "memo");
        // omitted sections default to empty
        assert!(abi.tables.is_empty());
        assert!(abi.error_messages.is_empty());
    }

    #[test]
    fn json_round_trip() {
        let abi = AbiDef::new("wasm::abi/1.1")
            .with_struct(StructDef::new("pt").with_field("x", "uint32"));
        let json = serde_json::to_string(&abi).unwrap();
        let restored: AbiDef = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, abi);
    }
}
