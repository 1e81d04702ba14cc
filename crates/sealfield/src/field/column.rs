//! [`EncryptedColumn<T>`]: a typed column over a [`FieldCodec`].
//!
//! Each logical type supplies its canonical byte form through
//! [`FieldValue`]. Those bytes are what gets encrypted and what gets
//! digested, so equal values always produce equal lookup prefixes.

use std::marker::PhantomData;

use chrono::{NaiveDate, NaiveDateTime};

use crate::crypto::LookupDigest;
use crate::error::{FieldError, Result};

use super::codec::{Comparable, FieldCodec, LookupValue};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A logical column type with a canonical byte encoding.
pub trait FieldValue: Sized {
    /// Short type name used in diagnostics (e.g. `"integer"`).
    const KIND: &'static str;

    /// Canonical bytes for this value.
    fn to_canonical(&self) -> Vec<u8>;

    /// Parse canonical bytes back into a value.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Value`] if the bytes are not a valid encoding.
    fn from_canonical(bytes: &[u8]) -> Result<Self>;
}

fn utf8<T: FieldValue>(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|_| FieldError::Value { kind: T::KIND })
}

impl FieldValue for String {
    const KIND: &'static str = "text";

    fn to_canonical(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    fn from_canonical(bytes: &[u8]) -> Result<Self> {
        utf8::<Self>(bytes).map(str::to_owned)
    }
}

macro_rules! integer_field_value {
    ($($ty:ty),*) => {
        $(
            impl FieldValue for $ty {
                const KIND: &'static str = "integer";

                fn to_canonical(&self) -> Vec<u8> {
                    self.to_string().into_bytes()
                }

                fn from_canonical(bytes: &[u8]) -> Result<Self> {
                    utf8::<Self>(bytes)?
                        .parse()
                        .map_err(|_| FieldError::Value { kind: Self::KIND })
                }
            }
        )*
    };
}

integer_field_value!(i16, i32, i64);

impl FieldValue for bool {
    const KIND: &'static str = "boolean";

    fn to_canonical(&self) -> Vec<u8> {
        if *self { b"true".to_vec() } else { b"false".to_vec() }
    }

    fn from_canonical(bytes: &[u8]) -> Result<Self> {
        match bytes {
            b"true" => Ok(true),
            b"false" => Ok(false),
            _ => Err(FieldError::Value { kind: Self::KIND }),
        }
    }
}

impl FieldValue for NaiveDate {
    const KIND: &'static str = "date";

    fn to_canonical(&self) -> Vec<u8> {
        self.format(DATE_FORMAT).to_string().into_bytes()
    }

    fn from_canonical(bytes: &[u8]) -> Result<Self> {
        NaiveDate::parse_from_str(utf8::<Self>(bytes)?, DATE_FORMAT)
            .map_err(|_| FieldError::Value { kind: Self::KIND })
    }
}

impl FieldValue for NaiveDateTime {
    const KIND: &'static str = "datetime";

    fn to_canonical(&self) -> Vec<u8> {
        self.format(DATETIME_FORMAT).to_string().into_bytes()
    }

    fn from_canonical(bytes: &[u8]) -> Result<Self> {
        NaiveDateTime::parse_from_str(utf8::<Self>(bytes)?, DATETIME_FORMAT)
            .map_err(|_| FieldError::Value { kind: Self::KIND })
    }
}

/// An encrypted column holding values of type `T`.
#[derive(Debug, Clone)]
pub struct EncryptedColumn<T> {
    codec: FieldCodec,
    _value: PhantomData<fn() -> T>,
}

impl<T: FieldValue> EncryptedColumn<T> {
    /// Build a typed column over `codec`.
    pub fn new(codec: FieldCodec) -> Self {
        Self {
            codec,
            _value: PhantomData,
        }
    }

    /// The underlying codec.
    pub fn codec(&self) -> &FieldCodec {
        &self.codec
    }

    /// Encrypt `value` into its stored form.
    pub fn encode(&self, value: &T) -> Result<Vec<u8>> {
        self.codec.encode_for_storage(&value.to_canonical())
    }

    /// Decrypt a stored value.
    pub fn decode(&self, stored: &[u8]) -> Result<T> {
        T::from_canonical(&self.codec.decode_from_storage(stored)?)
    }

    /// Encrypt a nullable value. `None` stays NULL and is never encrypted.
    pub fn encode_nullable(&self, value: Option<&T>) -> Result<Option<Vec<u8>>> {
        value.map(|v| self.encode(v)).transpose()
    }

    /// Decrypt a nullable stored value.
    pub fn decode_nullable(&self, stored: Option<&[u8]>) -> Result<Option<T>> {
        stored.map(|s| self.decode(s)).transpose()
    }

    /// Digest to compare with stored prefixes for `column = value`.
    pub fn lookup_exact(&self, value: &T) -> Result<LookupDigest> {
        let canonical = value.to_canonical();
        match self
            .codec
            .transform_lookup_value("exact", LookupValue::Single(&canonical))?
        {
            Comparable::Digest(d) => Ok(d),
            Comparable::Digests(ds) => ds
                .into_iter()
                .next()
                .ok_or_else(|| FieldError::unsupported(self.codec.spec().name(), "exact")),
        }
    }

    /// Digests to compare with stored prefixes for `column IN (values)`.
    pub fn lookup_in(&self, values: &[T]) -> Result<Vec<LookupDigest>> {
        let canonical: Vec<Vec<u8>> = values.iter().map(FieldValue::to_canonical).collect();
        let borrowed = canonical.iter().map(Vec::as_slice).collect();
        Ok(self
            .codec
            .transform_lookup_value("in", LookupValue::Many(borrowed))?
            .into_digests())
    }

    /// Apply an arbitrary operator by name, for callers that forward ORM
    /// lookups verbatim.
    pub fn lookup(&self, operator: &str, values: &[T]) -> Result<Comparable> {
        let canonical: Vec<Vec<u8>> = values.iter().map(FieldValue::to_canonical).collect();
        let value = match canonical.as_slice() {
            [one] if operator != "in" => LookupValue::Single(one),
            many => LookupValue::Many(many.iter().map(Vec::as_slice).collect()),
        };
        self.codec.transform_lookup_value(operator, value)
    }
}
