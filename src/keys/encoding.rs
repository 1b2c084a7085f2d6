//! Canonical, type-tagged encoding of argument values.
//!
//! Arguments are serialized through serde into a [`serde_json::Value`] tree
//! that keeps the structure of the value and the names of the types it
//! meets along the way:
//!
//! | Rust value                  | Encoding                                         |
//! |-----------------------------|--------------------------------------------------|
//! | `bool`, integers, strings   | JSON primitive                                   |
//! | non-finite floats, `i128`   | `{"@type":"f64","@value":"NaN"}`                 |
//! | `None` / `()`               | `null`                                           |
//! | `Some(v)`                   | `{"@some":v}`                                    |
//! | `struct Point { x, y }`     | `{"@type":"Point","@value":{"x":..,"y":..}}`     |
//! | `struct Meters(f64)`        | `{"@type":"Meters","@value":..}`                 |
//! | `Shape::Circle { r }`       | `{"@type":"Shape::Circle","@value":{"r":..}}`    |
//! | sequences, tuples           | JSON array                                       |
//! | maps                        | `{"@map":[[key,value],..]}`, sorted by key       |
//!
//! Map keys are encoded like any other value and kept as full trees, so
//! `"1"` and `1` stay distinct keys even behind an untagged enum. Entries
//! are sorted by the compact rendering of the encoded key, so two maps with
//! equal contents encode identically whatever their iteration order.
//!
//! Tags carry the names serde reports, which for nested structs and enums
//! are short names without a module path. Two same-named types from
//! different modules are told apart only when they differ in structure or
//! sit at the top level, where the argument's full `type_name` is recorded.
//! Generic parameters are part of that full name, so `Wrapper<a::Point>`
//! and `Wrapper<b::Point>` never collide.

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::Serialize;
use serde::ser::{self, Serializer};
use serde_json::{Map, Number, Value};

use crate::{MimirError, Result};

const TYPE_TAG: &str = "@type";
const VALUE_TAG: &str = "@value";
const SOME_TAG: &str = "@some";
const MAP_TAG: &str = "@map";

/// Encode `value` into its canonical tagged tree.
pub fn to_tagged_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    value.serialize(TaggedSerializer)
}

/// Encode `value` and render it as a compact string.
pub fn to_tagged_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let tree = to_tagged_value(value)?;
    Ok(serde_json::to_string(&tree)?)
}

impl ser::Error for MimirError {
    fn custom<T: Display>(msg: T) -> Self {
        MimirError::Serialization(msg.to_string())
    }
}

fn tagged(type_name: impl Into<String>, value: Option<Value>) -> Value {
    let mut object = Map::new();
    object.insert(TYPE_TAG.to_string(), Value::String(type_name.into()));
    if let Some(value) = value {
        object.insert(VALUE_TAG.to_string(), value);
    }
    Value::Object(object)
}

fn float(type_name: &str, v: f64) -> Value {
    match Number::from_f64(v) {
        Some(number) => Value::Number(number),
        None => tagged(type_name, Some(Value::String(v.to_string()))),
    }
}

fn variant_name(name: &str, variant: &str) -> String {
    format!("{name}::{variant}")
}

struct TaggedSerializer;

impl Serializer for TaggedSerializer {
    type Ok = Value;
    type Error = MimirError;

    type SerializeSeq = SeqEncoder;
    type SerializeTuple = SeqEncoder;
    type SerializeTupleStruct = SeqEncoder;
    type SerializeTupleVariant = SeqEncoder;
    type SerializeMap = MapEncoder;
    type SerializeStruct = StructEncoder;
    type SerializeStructVariant = StructEncoder;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i128(self, v: i128) -> Result<Value> {
        Ok(tagged("i128", Some(Value::String(v.to_string()))))
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u128(self, v: u128) -> Result<Value> {
        Ok(tagged("u128", Some(Value::String(v.to_string()))))
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(float("f32", f64::from(v)))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(float("f64", v))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::Array(v.iter().map(|b| Value::from(*b)).collect()))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        let mut object = Map::new();
        object.insert(SOME_TAG.to_string(), value.serialize(TaggedSerializer)?);
        Ok(Value::Object(object))
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<Value> {
        Ok(tagged(name, None))
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(tagged(variant_name(name, variant), None))
    }

    fn serialize_newtype_struct<T>(self, name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        Ok(tagged(name, Some(value.serialize(TaggedSerializer)?)))
    }

    fn serialize_newtype_variant<T>(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        Ok(tagged(
            variant_name(name, variant),
            Some(value.serialize(TaggedSerializer)?),
        ))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqEncoder> {
        Ok(SeqEncoder::new(None, len.unwrap_or(0)))
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqEncoder> {
        Ok(SeqEncoder::new(None, len))
    }

    fn serialize_tuple_struct(self, name: &'static str, len: usize) -> Result<SeqEncoder> {
        Ok(SeqEncoder::new(Some(name.to_string()), len))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SeqEncoder> {
        Ok(SeqEncoder::new(Some(variant_name(name, variant)), len))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<MapEncoder> {
        Ok(MapEncoder {
            entries: BTreeMap::new(),
            pending_key: None,
        })
    }

    fn serialize_struct(self, name: &'static str, _len: usize) -> Result<StructEncoder> {
        Ok(StructEncoder::new(name.to_string()))
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<StructEncoder> {
        Ok(StructEncoder::new(variant_name(name, variant)))
    }
}

/// Sequences, tuples, and (tagged) tuple structs/variants.
struct SeqEncoder {
    type_name: Option<String>,
    items: Vec<Value>,
}

impl SeqEncoder {
    fn new(type_name: Option<String>, len: usize) -> Self {
        Self {
            type_name,
            items: Vec::with_capacity(len),
        }
    }

    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.items.push(value.serialize(TaggedSerializer)?);
        Ok(())
    }

    fn finish(self) -> Value {
        let array = Value::Array(self.items);
        match self.type_name {
            Some(name) => tagged(name, Some(array)),
            None => array,
        }
    }
}

impl ser::SerializeSeq for SeqEncoder {
    type Ok = Value;
    type Error = MimirError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SeqEncoder {
    type Ok = Value;
    type Error = MimirError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SeqEncoder {
    type Ok = Value;
    type Error = MimirError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SeqEncoder {
    type Ok = Value;
    type Error = MimirError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

/// Maps, as key/value pairs ordered by rendered key.
struct MapEncoder {
    entries: BTreeMap<String, (Value, Value)>,
    pending_key: Option<Value>,
}

impl ser::SerializeMap for MapEncoder {
    type Ok = Value;
    type Error = MimirError;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.pending_key = Some(key.serialize(TaggedSerializer)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self.pending_key.take().ok_or_else(|| {
            MimirError::Serialization("map value serialized before its key".to_string())
        })?;
        let rendered = serde_json::to_string(&key)?;
        self.entries
            .insert(rendered, (key, value.serialize(TaggedSerializer)?));
        Ok(())
    }

    fn end(self) -> Result<Value> {
        let pairs = self
            .entries
            .into_values()
            .map(|(key, value)| Value::Array(vec![key, value]))
            .collect();
        let mut object = Map::new();
        object.insert(MAP_TAG.to_string(), Value::Array(pairs));
        Ok(Value::Object(object))
    }
}

/// Structs and struct variants.
struct StructEncoder {
    type_name: String,
    fields: Map<String, Value>,
}

impl StructEncoder {
    fn new(type_name: String) -> Self {
        Self {
            type_name,
            fields: Map::new(),
        }
    }

    fn field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<()> {
        self.fields
            .insert(key.to_string(), value.serialize(TaggedSerializer)?);
        Ok(())
    }

    fn finish(self) -> Value {
        tagged(self.type_name, Some(Value::Object(self.fields)))
    }
}

impl ser::SerializeStruct for StructEncoder {
    type Ok = Value;
    type Error = MimirError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.field(key, value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for StructEncoder {
    type Ok = Value;
    type Error = MimirError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.field(key, value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}
