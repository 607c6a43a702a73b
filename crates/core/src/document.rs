#![forbid(unsafe_code)]

use serde_json::{Map, Value};

pub const FIELD_CREATED_AT: &str = "createdAt";
pub const FIELD_UPDATED_AT: &str = "updatedAt";
pub const FIELD_BRANCH: &str = "branch";

pub type Fields = Map<String, Value>;

/// A stored document: the store-assigned id plus its field map. The store
/// merges `createdAt` (and `updatedAt` on edit) into `fields` as epoch ms.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn i64_field(&self, key: &str) -> Option<i64> {
        self.fields.get(key).and_then(Value::as_i64)
    }

    /// Missing timestamps read as 0 so they sort as the oldest entries.
    pub fn created_at_ms(&self) -> i64 {
        self.i64_field(FIELD_CREATED_AT).unwrap_or(0)
    }

    pub fn updated_at_ms(&self) -> Option<i64> {
        self.i64_field(FIELD_UPDATED_AT)
    }

    pub fn branch(&self) -> Option<&str> {
        self.str_field(FIELD_BRANCH)
    }

    /// `{id, ...fields}`, the shape used by backups.
    pub fn to_tagged_value(&self) -> Value {
        let mut out = Map::with_capacity(self.fields.len() + 1);
        out.insert("id".to_string(), Value::String(self.id.clone()));
        for (key, value) in &self.fields {
            if key == "id" {
                continue;
            }
            out.insert(key.clone(), value.clone());
        }
        Value::Object(out)
    }
}
