//! Named Event Fields - The Parser → Callback Contract
//!
//! Feed parsers hand normalized values to callback variants as a bag of
//! named fields rather than positional arguments. Each variant pulls its
//! schema out of the bag through a `FieldReader`, which reports missing or
//! mistyped fields as `InvalidEventError` instead of substituting defaults.
//!
//! Values are loosely typed on purpose: venues send prices as strings,
//! sequence numbers as JSON numbers, sides as `"b"`/`"bid"`/`"buy"`. The
//! reader performs the lossless conversions and rejects the rest.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value;

use super::book::{Book, BookDelta};
use super::event::{BookSide, EventKind, Side};
use crate::error::InvalidEventError;

/// A single loosely-typed field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Side(Side),
    Book(Book),
    Delta(BookDelta),
    /// Raw JSON kept as-is (non-integer numbers, arrays, objects).
    Json(Value),
}

impl FieldValue {
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null) || matches!(self, Self::Json(Value::Null))
    }

    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(d) => Some(*d),
            Self::Int(i) => Some(Decimal::from(*i)),
            Self::Float(f) => Decimal::try_from(*f).ok(),
            Self::Text(s) => parse_decimal(s),
            Self::Json(v) => decimal_from_json(v),
            _ => None,
        }
    }

    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            Self::Decimal(d) => d.to_f64(),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Json(Value::Number(n)) => n.as_f64(),
            _ => None,
        }
    }

    pub fn to_u64(&self) -> Option<u64> {
        match self {
            Self::Int(i) => u64::try_from(*i).ok(),
            Self::Decimal(d) if d.fract().is_zero() => d.to_u64(),
            Self::Float(f) => integral_u64(*f),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Json(Value::Number(n)) => n.as_u64().or_else(|| n.as_f64().and_then(integral_u64)),
            _ => None,
        }
    }

    pub fn to_side(&self) -> Option<Side> {
        match self {
            Self::Side(s) => Some(*s),
            Self::Text(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s),
            Self::Int(i) => Some(i.to_string()),
            Self::Decimal(d) => Some(d.to_string()),
            Self::Json(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn into_book(self) -> Option<Book> {
        match self {
            Self::Book(b) => Some(b),
            Self::Json(v) => book_from_json(&v),
            _ => None,
        }
    }

    pub fn into_delta(self) -> Option<BookDelta> {
        match self {
            Self::Delta(d) => Some(d),
            Self::Json(v) => delta_from_json(&v),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        i64::try_from(v).map_or_else(|_| Self::Decimal(Decimal::from(v)), Self::Int)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<Decimal> for FieldValue {
    fn from(v: Decimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<Side> for FieldValue {
    fn from(v: Side) -> Self {
        Self::Side(v)
    }
}

impl From<Book> for FieldValue {
    fn from(v: Book) -> Self {
        Self::Book(v)
    }
}

impl From<BookDelta> for FieldValue {
    fn from(v: BookDelta) -> Self {
        Self::Delta(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::String(s) => Self::Text(s),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Json(Value::Number(n)),
            },
            other => Self::Json(other),
        }
    }
}

/// Named fields supplied by a feed parser for one event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    values: BTreeMap<String, FieldValue>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        self.values.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.values.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, FieldValue> {
        self.values.iter()
    }
}

impl IntoIterator for Fields {
    type Item = (String, FieldValue);
    type IntoIter = btree_map::IntoIter<String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Consumes a `Fields` bag against one event kind's schema.
///
/// Every accessor removes the field it reads, so whatever is left after
/// a variant has taken its schema is the set of unrecognized fields.
#[derive(Debug)]
pub struct FieldReader {
    kind: EventKind,
    fields: Fields,
}

impl FieldReader {
    pub const fn new(kind: EventKind, fields: Fields) -> Self {
        Self { kind, fields }
    }

    pub const fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn text(&mut self, name: &'static str) -> Result<String, InvalidEventError> {
        let value = self.required(name)?;
        value.into_text().ok_or_else(|| self.invalid(name, "string"))
    }

    /// Absent or null yields `None`.
    pub fn opt_text(&mut self, name: &'static str) -> Result<Option<String>, InvalidEventError> {
        match self.optional(name) {
            None => Ok(None),
            Some(value) => value
                .into_text()
                .map(Some)
                .ok_or_else(|| self.invalid(name, "string")),
        }
    }

    pub fn decimal(&mut self, name: &'static str) -> Result<Decimal, InvalidEventError> {
        let value = self.required(name)?;
        value.to_decimal().ok_or_else(|| self.invalid(name, "decimal"))
    }

    /// Epoch timestamp in fractional seconds.
    pub fn timestamp(&mut self, name: &'static str) -> Result<f64, InvalidEventError> {
        let value = self.required(name)?;
        value
            .to_f64()
            .filter(|t| t.is_finite())
            .ok_or_else(|| self.invalid(name, "timestamp"))
    }

    pub fn sequence(&mut self, name: &'static str) -> Result<u64, InvalidEventError> {
        let value = self.required(name)?;
        value.to_u64().ok_or_else(|| self.invalid(name, "sequence number"))
    }

    pub fn opt_sequence(&mut self, name: &'static str) -> Result<Option<u64>, InvalidEventError> {
        match self.optional(name) {
            None => Ok(None),
            Some(value) => value
                .to_u64()
                .map(Some)
                .ok_or_else(|| self.invalid(name, "sequence number")),
        }
    }

    pub fn side(&mut self, name: &'static str) -> Result<Side, InvalidEventError> {
        let value = self.required(name)?;
        value.to_side().ok_or_else(|| self.invalid(name, "side"))
    }

    pub fn book(&mut self, name: &'static str) -> Result<Book, InvalidEventError> {
        let value = self.required(name)?;
        value.into_book().ok_or_else(|| self.invalid(name, "book"))
    }

    pub fn delta(&mut self, name: &'static str) -> Result<BookDelta, InvalidEventError> {
        let value = self.required(name)?;
        value.into_delta().ok_or_else(|| self.invalid(name, "book delta"))
    }

    /// Drop a field without reading it.
    pub fn discard(&mut self, name: &str) {
        self.fields.remove(name);
    }

    /// Fields not consumed by any accessor.
    pub fn into_remaining(self) -> Fields {
        self.fields
    }

    fn required(&mut self, name: &'static str) -> Result<FieldValue, InvalidEventError> {
        match self.fields.remove(name) {
            None => Err(InvalidEventError::MissingField {
                kind: self.kind,
                field: name,
            }),
            Some(value) if value.is_null() => Err(self.invalid(name, "non-null value")),
            Some(value) => Ok(value),
        }
    }

    fn optional(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name).filter(|v| !v.is_null())
    }

    const fn invalid(&self, field: &'static str, expected: &'static str) -> InvalidEventError {
        InvalidEventError::InvalidField {
            kind: self.kind,
            field,
            expected,
        }
    }
}

/// Whole, non-negative floats below 2^64 only; the `as` cast would saturate.
fn integral_u64(f: f64) -> Option<u64> {
    (f.fract() == 0.0 && (0.0..18_446_744_073_709_551_616.0).contains(&f)).then_some(f as u64)
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn decimal_from_json(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => parse_decimal(s),
        Value::Number(n) => parse_decimal(&n.to_string()),
        _ => None,
    }
}

/// `{"bid": {...}, "ask": {...}}` where each side is either a
/// price → size object or an array of `[price, size]` pairs.
fn levels_from_json(value: &Value) -> Option<Vec<(Decimal, Decimal)>> {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(price, size)| Some((parse_decimal(price)?, decimal_from_json(size)?)))
            .collect(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item.as_array()?.as_slice() {
                [price, size, ..] => Some((decimal_from_json(price)?, decimal_from_json(size)?)),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

fn book_from_json(value: &Value) -> Option<Book> {
    let mut book = Book::new();
    for (key, levels) in value.as_object()? {
        let side: BookSide = key.parse().ok()?;
        book.side_mut(side).extend(levels_from_json(levels)?);
    }
    Some(book)
}

fn delta_from_json(value: &Value) -> Option<BookDelta> {
    let mut delta = BookDelta::new();
    for (key, levels) in value.as_object()? {
        let side: BookSide = key.parse().ok()?;
        for (price, size) in levels_from_json(levels)? {
            delta.push(side, price, size);
        }
    }
    Some(delta)
}
