//! Case-insensitive reading of object keys.

use alloc::string::String;
use alloc::vec::Vec;

use serde::de::value::{MapDeserializer, SeqDeserializer, StringDeserializer};
use serde::de::{self, DeserializeSeed, Deserializer, EnumAccess, IntoDeserializer};
use serde::de::{Unexpected, VariantAccess, Visitor};
use serde_json::{Map, Value};

// -----------------------------------------------------------------------------
// Key matching

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Rename keys of `object` that match one of `fields` only when case is
/// ignored to that field's exact name. Exact matches and unmatched keys are
/// kept as they are.
fn match_fields(object: Map<String, Value>, fields: &[&'static str]) -> Map<String, Value> {
    if fields.is_empty() {
        return object;
    }

    object
        .into_iter()
        .map(|(key, value)| {
            if fields.contains(&key.as_str()) {
                return (key, value);
            }
            match fields.iter().find(|field| eq_ignore_case(field, &key)) {
                Some(field) => (String::from(*field), value),
                None => (key, value),
            }
        })
        .collect()
}

// -----------------------------------------------------------------------------
// IgnoreCase

/// A JSON value read with the object keys of every struct, at any depth,
/// matched to that struct's serialized field names ignoring case.
///
/// Keys are only renamed where the target declares its fields, that is where
/// it is read through `deserialize_struct` or as a struct variant. Maps,
/// `#[serde(flatten)]` and untagged or internally tagged enums read their
/// keys as written.
pub(crate) struct IgnoreCase(pub(crate) Value);

fn visit_array<'de, V: Visitor<'de>>(items: Vec<Value>, visitor: V) -> Result<V::Value, serde_json::Error> {
    let mut seq: SeqDeserializer<_, serde_json::Error> =
        SeqDeserializer::new(items.into_iter().map(IgnoreCase));
    let value = visitor.visit_seq(&mut seq)?;
    seq.end()?;
    Ok(value)
}

fn visit_object<'de, V: Visitor<'de>>(
    object: Map<String, Value>,
    visitor: V,
) -> Result<V::Value, serde_json::Error> {
    let mut map: MapDeserializer<'_, _, serde_json::Error> =
        MapDeserializer::new(object.into_iter().map(|(key, value)| (key, IgnoreCase(value))));
    let value = visitor.visit_map(&mut map)?;
    map.end()?;
    Ok(value)
}

impl<'de> IntoDeserializer<'de, serde_json::Error> for IgnoreCase {
    type Deserializer = Self;

    #[inline]
    fn into_deserializer(self) -> Self {
        self
    }
}

impl<'de> Deserializer<'de> for IgnoreCase {
    type Error = serde_json::Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Array(items) => visit_array(items, visitor),
            Value::Object(object) => visit_object(object, visitor),
            other => other.deserialize_any(visitor),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Null => visitor.visit_none(),
            value => visitor.visit_some(IgnoreCase(value)),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Object(object) => visit_object(match_fields(object, fields), visitor),
            other => IgnoreCase(other).deserialize_any(visitor),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self.0 {
            Value::Object(object) => {
                let mut entries = object.into_iter();
                match (entries.next(), entries.next()) {
                    (Some((variant, value)), None) => visitor.visit_enum(Variant { variant, value }),
                    _ => Err(de::Error::invalid_value(
                        Unexpected::Map,
                        &"map with a single key",
                    )),
                }
            }
            other => other.deserialize_enum(name, variants, visitor),
        }
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map identifier
        ignored_any
    }
}

// -----------------------------------------------------------------------------
// Enum variants

struct Variant {
    variant: String,
    value: Value,
}

impl<'de> EnumAccess<'de> for Variant {
    type Error = serde_json::Error;
    type Variant = IgnoreCase;

    fn variant_seed<V: DeserializeSeed<'de>>(self, seed: V) -> Result<(V::Value, IgnoreCase), Self::Error> {
        let variant = seed.deserialize(StringDeserializer::<serde_json::Error>::new(self.variant))?;
        Ok((variant, IgnoreCase(self.value)))
    }
}

impl<'de> VariantAccess<'de> for IgnoreCase {
    type Error = serde_json::Error;

    fn unit_variant(self) -> Result<(), Self::Error> {
        de::Deserialize::deserialize(self)
    }

    fn newtype_variant_seed<T: DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value, Self::Error> {
        seed.deserialize(self)
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, Self::Error> {
        Deserializer::deserialize_seq(self, visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        Deserializer::deserialize_struct(self, "", fields, visitor)
    }
}

// -----------------------------------------------------------------------------
// Tests
