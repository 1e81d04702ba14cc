//! Field definitions as written in the definition file, and their
//! conversion into live codecs.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use sealfield::{FieldCodec, FieldError, FieldSpec, FieldValue, IndexIntent, KeyMaterial};
use serde::Deserialize;
use serde_json::Value;

/// Logical type of a registered field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// UTF-8 text (char, email, text columns).
    #[default]
    Text,
    /// 64-bit signed integer.
    Integer,
    /// `true` / `false`.
    Boolean,
    /// Calendar date, `YYYY-MM-DD`.
    Date,
    /// Naive datetime, `YYYY-MM-DD HH:MM:SS[.fff]`.
    Datetime,
}

impl FieldKind {
    /// Canonical bytes for a JSON `value` of this kind.
    ///
    /// Returns `None` if `value` is not a valid value of this kind.
    pub fn canonical(self, value: &Value) -> Option<Vec<u8>> {
        match self {
            FieldKind::Text => value.as_str().map(|s| s.to_owned().to_canonical()),
            FieldKind::Integer => value.as_i64().map(|n| n.to_canonical()),
            FieldKind::Boolean => value.as_bool().map(|b| b.to_canonical()),
            FieldKind::Date => reparse::<NaiveDate>(value),
            FieldKind::Datetime => reparse::<NaiveDateTime>(value),
        }
    }

    /// JSON value for canonical bytes of this kind.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Value`] if the bytes do not parse.
    pub fn to_json(self, canonical: &[u8]) -> Result<Value, FieldError> {
        Ok(match self {
            FieldKind::Text => Value::String(String::from_canonical(canonical)?),
            FieldKind::Integer => Value::from(i64::from_canonical(canonical)?),
            FieldKind::Boolean => Value::Bool(bool::from_canonical(canonical)?),
            FieldKind::Date => render(&NaiveDate::from_canonical(canonical)?),
            FieldKind::Datetime => render(&NaiveDateTime::from_canonical(canonical)?),
        })
    }
}

/// Validate a string against `T`'s canonical form and normalise it.
fn reparse<T: FieldValue>(value: &Value) -> Option<Vec<u8>> {
    let s = value.as_str()?;
    T::from_canonical(s.as_bytes()).ok().map(|v| v.to_canonical())
}

fn render<T: FieldValue>(value: &T) -> Value {
    Value::String(String::from_utf8_lossy(&value.to_canonical()).into_owned())
}

/// One entry of the field definition file.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDefinition {
    /// Unique registry name, conventionally `table.column`.
    pub name: String,
    /// Logical type.
    #[serde(default)]
    pub kind: FieldKind,
    /// Request a unique prefix index.
    #[serde(default)]
    pub unique: bool,
    /// Request a non-unique prefix index.
    #[serde(default)]
    pub db_index: bool,
    /// Declared as primary key (always rejected).
    #[serde(default)]
    pub primary_key: bool,
    /// Single explicit secret.
    #[serde(default)]
    pub key: Option<String>,
    /// Explicit secrets, highest priority first.
    #[serde(default)]
    pub keys: Option<Vec<String>>,
    /// Override the process HKDF default.
    #[serde(default)]
    pub hkdf: Option<bool>,
    /// Secret for keyed lookup digests.
    #[serde(default)]
    pub lookup_hash_key: Option<String>,
}

/// Top-level shape of the definition file.
#[derive(Debug, Clone, Deserialize)]
pub struct DefinitionFile {
    /// All field definitions.
    pub fields: Vec<FieldDefinition>,
}

/// A field ready to serve requests.
#[derive(Debug, Clone)]
pub struct RegisteredField {
    /// Logical type of the column.
    pub kind: FieldKind,
    /// Codec over the resolved definition.
    pub codec: FieldCodec,
}

impl RegisteredField {
    /// The resolved definition.
    pub fn spec(&self) -> &FieldSpec {
        self.codec.spec()
    }
}

impl FieldDefinition {
    /// Resolve this definition against process key material.
    ///
    /// # Errors
    ///
    /// Propagates [`FieldError::Configuration`] and [`FieldError::InvalidKey`]
    /// from the field builder.
    pub fn build(&self, material: &KeyMaterial) -> Result<RegisteredField, FieldError> {
        let mut builder = FieldSpec::builder(self.name.clone())
            .index_intent(IndexIntent::from_flags(self.unique, self.db_index))
            .primary_key(self.primary_key);
        if let Some(key) = &self.key {
            builder = builder.key(key.as_str());
        }
        if let Some(keys) = &self.keys {
            builder = builder.keys(keys.iter().map(String::as_str));
        }
        if let Some(hkdf) = self.hkdf {
            builder = builder.hkdf(hkdf);
        }
        if let Some(secret) = &self.lookup_hash_key {
            builder = builder.lookup_hash_key(secret.as_str());
        }
        let spec = builder.build(material)?;
        Ok(RegisteredField {
            kind: self.kind,
            codec: FieldCodec::new(Arc::new(spec)),
        })
    }
}
