//! Writes a concrete value as a map with the discriminator in front.
//!
//! The concrete type drives the output serializer directly: its fields
//! are never buffered, so every value the format itself accepts is written
//! as is.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::Cell;

use serde::ser::{self, Impossible, Serialize, SerializeMap, SerializeStruct};
use serde::ser::{SerializeStructVariant, SerializeTupleVariant, Serializer};
use serde_json::{Map, Value};

use crate::{ConvertError, TYPE_KEY};

// -----------------------------------------------------------------------------
// Failure

/// Keeps the typed error of a failed write while the format's own error
/// carries its message out of the serializer.
pub(super) type Failure = Cell<Option<ConvertError>>;

pub(super) fn fail<E: ser::Error>(failure: &Failure, err: ConvertError) -> E {
    let error = E::custom(&err);
    failure.set(Some(err));
    error
}

#[derive(Clone, Copy)]
pub(super) struct Tag<'a> {
    pub type_path: &'static str,
    pub failure: &'a Failure,
}

impl Tag<'_> {
    fn not_an_object<E: ser::Error>(self, found: String) -> E {
        fail(
            self.failure,
            ConvertError::NotAnObject {
                type_path: String::from(self.type_path),
                found,
            },
        )
    }

    fn reserved<E: ser::Error>(self) -> E {
        fail(
            self.failure,
            ConvertError::ReservedField {
                type_path: self.type_path,
            },
        )
    }
}

// -----------------------------------------------------------------------------
// TagFirst

/// Forwards a struct or map to `serializer` with `"Type"` as its first entry.
pub(super) struct TagFirst<'a, S> {
    pub serializer: S,
    pub tag: Tag<'a>,
}

impl<S: Serializer> TagFirst<'_, S> {
    fn open(self, len: Option<usize>) -> Result<S::SerializeMap, S::Error> {
        let mut map = self.serializer.serialize_map(len.map(|len| len + 1))?;
        map.serialize_entry(TYPE_KEY, self.tag.type_path)?;
        Ok(map)
    }

    fn open_variant(self, variant: &'static str) -> Result<S::SerializeMap, S::Error> {
        if variant == TYPE_KEY {
            return Err(self.tag.reserved());
        }
        self.open(Some(1))
    }

    fn number(self, n: impl core::fmt::Display) -> Result<S::Ok, S::Error> {
        Err(self.tag.not_an_object(format!("number `{n}`")))
    }
}

impl<'a, S: Serializer> Serializer for TagFirst<'a, S> {
    type Ok = S::Ok;
    type Error = S::Error;

    type SerializeSeq = Impossible<S::Ok, S::Error>;
    type SerializeTuple = Impossible<S::Ok, S::Error>;
    type SerializeTupleStruct = Impossible<S::Ok, S::Error>;
    type SerializeTupleVariant = TagTupleVariant<S::SerializeMap>;
    type SerializeMap = TagMap<'a, S::SerializeMap>;
    type SerializeStruct = TagMap<'a, S::SerializeMap>;
    type SerializeStructVariant = TagStructVariant<S::SerializeMap>;

    fn serialize_bool(self, v: bool) -> Result<S::Ok, S::Error> {
        Err(self.tag.not_an_object(format!("boolean `{v}`")))
    }

    fn serialize_i8(self, v: i8) -> Result<S::Ok, S::Error> {
        self.number(v)
    }

    fn serialize_i16(self, v: i16) -> Result<S::Ok, S::Error> {
        self.number(v)
    }

    fn serialize_i32(self, v: i32) -> Result<S::Ok, S::Error> {
        self.number(v)
    }

    fn serialize_i64(self, v: i64) -> Result<S::Ok, S::Error> {
        self.number(v)
    }

    fn serialize_i128(self, v: i128) -> Result<S::Ok, S::Error> {
        self.number(v)
    }

    fn serialize_u8(self, v: u8) -> Result<S::Ok, S::Error> {
        self.number(v)
    }

    fn serialize_u16(self, v: u16) -> Result<S::Ok, S::Error> {
        self.number(v)
    }

    fn serialize_u32(self, v: u32) -> Result<S::Ok, S::Error> {
        self.number(v)
    }

    fn serialize_u64(self, v: u64) -> Result<S::Ok, S::Error> {
        self.number(v)
    }

    fn serialize_u128(self, v: u128) -> Result<S::Ok, S::Error> {
        self.number(v)
    }

    fn serialize_f32(self, v: f32) -> Result<S::Ok, S::Error> {
        self.number(v)
    }

    fn serialize_f64(self, v: f64) -> Result<S::Ok, S::Error> {
        self.number(v)
    }

    fn serialize_char(self, v: char) -> Result<S::Ok, S::Error> {
        Err(self.tag.not_an_object(format!("string \"{v}\"")))
    }

    fn serialize_str(self, v: &str) -> Result<S::Ok, S::Error> {
        Err(self.tag.not_an_object(format!("string \"{v}\"")))
    }

    fn serialize_bytes(self, _: &[u8]) -> Result<S::Ok, S::Error> {
        Err(self.tag.not_an_object(String::from("an array")))
    }

    fn serialize_none(self) -> Result<S::Ok, S::Error> {
        Err(self.tag.not_an_object(String::from("null")))
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<S::Ok, S::Error> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<S::Ok, S::Error> {
        Err(self.tag.not_an_object(String::from("null")))
    }

    fn serialize_unit_struct(self, _: &'static str) -> Result<S::Ok, S::Error> {
        Err(self.tag.not_an_object(String::from("null")))
    }

    fn serialize_unit_variant(
        self,
        _: &'static str,
        _: u32,
        variant: &'static str,
    ) -> Result<S::Ok, S::Error> {
        Err(self.tag.not_an_object(format!("string \"{variant}\"")))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        value: &T,
    ) -> Result<S::Ok, S::Error> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        _: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<S::Ok, S::Error> {
        let mut map = self.open_variant(variant)?;
        map.serialize_entry(variant, value)?;
        map.end()
    }

    fn serialize_seq(self, _: Option<usize>) -> Result<Self::SerializeSeq, S::Error> {
        Err(self.tag.not_an_object(String::from("an array")))
    }

    fn serialize_tuple(self, _: usize) -> Result<Self::SerializeTuple, S::Error> {
        Err(self.tag.not_an_object(String::from("an array")))
    }

    fn serialize_tuple_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> Result<Self::SerializeTupleStruct, S::Error> {
        Err(self.tag.not_an_object(String::from("an array")))
    }

    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant, S::Error> {
        Ok(TagTupleVariant {
            map: self.open_variant(variant)?,
            variant,
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap, S::Error> {
        let tag = self.tag;
        Ok(TagMap {
            map: self.open(len)?,
            tag,
        })
    }

    fn serialize_struct(self, _: &'static str, len: usize) -> Result<Self::SerializeStruct, S::Error> {
        let tag = self.tag;
        Ok(TagMap {
            map: self.open(Some(len))?,
            tag,
        })
    }

    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStructVariant, S::Error> {
        Ok(TagStructVariant {
            map: self.open_variant(variant)?,
            variant,
            fields: Map::with_capacity(len),
        })
    }
}

// -----------------------------------------------------------------------------
// Compound writers

pub(super) struct TagMap<'a, M> {
    map: M,
    tag: Tag<'a>,
}

impl<M: SerializeMap> SerializeStruct for TagMap<'_, M> {
    type Ok = M::Ok;
    type Error = M::Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<(), M::Error> {
        if key == TYPE_KEY {
            return Err(self.tag.reserved());
        }
        self.map.serialize_entry(key, value)
    }

    #[inline]
    fn end(self) -> Result<M::Ok, M::Error> {
        self.map.end()
    }
}

impl<M: SerializeMap> SerializeMap for TagMap<'_, M> {
    type Ok = M::Ok;
    type Error = M::Error;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), M::Error> {
        if serde_json::to_value(key).is_ok_and(|key| key == TYPE_KEY) {
            return Err(self.tag.reserved());
        }
        self.map.serialize_key(key)
    }

    #[inline]
    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), M::Error> {
        self.map.serialize_value(value)
    }

    #[inline]
    fn end(self) -> Result<M::Ok, M::Error> {
        self.map.end()
    }
}

// Variant bodies are nested one level below the discriminator, so they are
// collected before being written.

pub(super) struct TagTupleVariant<M> {
    map: M,
    variant: &'static str,
    items: Vec<Value>,
}

impl<M: SerializeMap> SerializeTupleVariant for TagTupleVariant<M> {
    type Ok = M::Ok;
    type Error = M::Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), M::Error> {
        let value = serde_json::to_value(value).map_err(<M::Error as ser::Error>::custom)?;
        self.items.push(value);
        Ok(())
    }

    fn end(mut self) -> Result<M::Ok, M::Error> {
        self.map.serialize_entry(self.variant, &self.items)?;
        self.map.end()
    }
}

pub(super) struct TagStructVariant<M> {
    map: M,
    variant: &'static str,
    fields: Map<String, Value>,
}

impl<M: SerializeMap> SerializeStructVariant for TagStructVariant<M> {
    type Ok = M::Ok;
    type Error = M::Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<(), M::Error> {
        let value = serde_json::to_value(value).map_err(<M::Error as ser::Error>::custom)?;
        self.fields.insert(String::from(key), value);
        Ok(())
    }

    fn end(mut self) -> Result<M::Ok, M::Error> {
        self.map.serialize_entry(self.variant, &self.fields)?;
        self.map.end()
    }
}
