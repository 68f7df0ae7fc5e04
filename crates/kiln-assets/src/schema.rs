//! Fixed per-kind declaration schemas.
//!
//! Each declaration-backed asset kind carries one constant [`Schema`] used
//! purely for validation before semantic parsing proceeds. Address-reference
//! fields double as the markers the dependency collector walks, so collected
//! dependency sets exactly match what the real load requests.

use serde_json::Value;

use crate::address::Address;
use crate::collect::Dependency;
use crate::error::{LoadError, LoadResult};
use crate::registry::AssetKind;

/// The expected shape of one declaration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Bool,
    Number,
    String,
    Object,
    Array,
    /// A string holding a relative address of another asset.
    AddressRef(AssetKind),
}

impl FieldType {
    fn matches(self, value: &Value) -> bool {
        match self {
            FieldType::Bool => value.is_boolean(),
            FieldType::Number => value.is_number(),
            FieldType::String | FieldType::AddressRef(_) => value.is_string(),
            FieldType::Object => value.is_object(),
            FieldType::Array => value.is_array(),
        }
    }

    fn name(self) -> &'static str {
        match self {
            FieldType::Bool => "boolean",
            FieldType::Number => "number",
            FieldType::String => "string",
            FieldType::Object => "object",
            FieldType::Array => "array",
            FieldType::AddressRef(_) => "string (asset address)",
        }
    }
}

/// One field of a declaration schema.
#[derive(Debug, Clone, Copy)]
pub struct SchemaField {
    pub name: &'static str,
    pub ty: FieldType,
    pub required: bool,
}

/// A fixed, type-specific declaration schema.
#[derive(Debug)]
pub struct Schema {
    pub fields: &'static [SchemaField],
}

impl Schema {
    /// Validate a parsed declaration document.
    ///
    /// On failure the violation is logged and returned with the offending
    /// keyword and a pointer into the document.
    pub fn validate(&self, address: &Address, document: &Value) -> LoadResult<()> {
        let Some(object) = document.as_object() else {
            return Err(violation(
                address,
                "type",
                String::new(),
                "declaration is not an object".to_string(),
            ));
        };

        for field in self.fields {
            match object.get(field.name) {
                None if field.required => {
                    return Err(violation(
                        address,
                        "required",
                        format!("/{}", field.name),
                        "missing required property".to_string(),
                    ));
                }
                None => {}
                Some(value) => {
                    if !field.ty.matches(value) {
                        return Err(violation(
                            address,
                            "type",
                            format!("/{}", field.name),
                            format!("expected {}", field.ty.name()),
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    /// Append every address reference this declaration statically makes.
    ///
    /// References resolve against the declaring asset's address using the
    /// same rule the loader applies.
    pub fn collect(&self, address: &Address, document: &Value, out: &mut Vec<Dependency>) {
        let Some(object) = document.as_object() else {
            return;
        };

        for field in self.fields {
            if let FieldType::AddressRef(kind) = field.ty
                && let Some(Value::String(reference)) = object.get(field.name)
            {
                out.push(Dependency {
                    kind,
                    address: address.resolve(reference),
                });
            }
        }
    }
}

fn violation(address: &Address, keyword: &'static str, pointer: String, detail: String) -> LoadError {
    tracing::error!(
        address = %address,
        keyword,
        pointer = %pointer,
        detail = %detail,
        "declaration failed schema validation"
    );
    LoadError::Schema {
        address: address.clone(),
        keyword,
        pointer,
        detail,
    }
}
