use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;
use std::sync::OnceLock;

use serde::de::{self, DeserializeSeed, Deserializer, Visitor};
use serde::ser::{Serialize, Serializer};

use super::{LabelTable, LabeledEnum};
use crate::ConvertError;

// -----------------------------------------------------------------------------
// LabelToken

/// A JSON token read in place of a labeled enum: the string, or a
/// description of whatever non-string token was found.
pub(super) struct LabelToken(pub(super) Result<String, String>);

impl<'de> de::Deserialize<'de> for LabelToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(LabelTokenVisitor)
    }
}

struct LabelTokenVisitor;

impl<'de> Visitor<'de> for LabelTokenVisitor {
    type Value = LabelToken;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a string label")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(LabelToken(Ok(String::from(v))))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(LabelToken(Ok(v)))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(LabelToken(Err(format!("boolean `{v}`"))))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(LabelToken(Err(format!("number `{v}`"))))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(LabelToken(Err(format!("number `{v}`"))))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(LabelToken(Err(format!("number `{v}`"))))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(LabelToken(Err(String::from("null"))))
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(LabelToken(Err(String::from("null"))))
    }

    fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        while seq.next_element::<de::IgnoredAny>()?.is_some() {}
        Ok(LabelToken(Err(String::from("an array"))))
    }

    fn visit_map<A: de::MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        while map.next_entry::<de::IgnoredAny, de::IgnoredAny>()?.is_some() {}
        Ok(LabelToken(Err(String::from("an object"))))
    }
}

// -----------------------------------------------------------------------------
// EnumLabelConverter

/// Converts values of one [`LabeledEnum`] to and from JSON strings.
///
/// The label table is fetched from the process-wide cache on first use and
/// kept by the converter afterwards.
///
/// # Examples
///
/// ```
/// use jc_convert::EnumLabelConverter;
/// use jc_convert::derive::LabeledEnum;
///
/// #[derive(LabeledEnum, Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum TestEnum {
///     #[convert(label = "first_value")]
///     FirstValue,
///     #[convert(label = "second_value")]
///     SecondValue,
///     ThirdValue,
/// }
///
/// let converter = EnumLabelConverter::<TestEnum>::new();
///
/// assert_eq!(converter.to_string(TestEnum::FirstValue).unwrap(), "\"first_value\"");
/// assert_eq!(converter.to_string(TestEnum::ThirdValue).unwrap(), "\"ThirdValue\"");
/// assert_eq!(converter.from_str("\"second_value\"").unwrap(), TestEnum::SecondValue);
/// assert!(converter.from_str("\"bogus\"").is_err());
/// ```
pub struct EnumLabelConverter<E> {
    table: OnceLock<Arc<LabelTable<E>>>,
}

impl<E> Default for EnumLabelConverter<E> {
    #[inline]
    fn default() -> Self {
        Self {
            table: OnceLock::new(),
        }
    }
}

impl<E: LabeledEnum> EnumLabelConverter<E> {
    #[inline]
    pub const fn new() -> Self {
        Self {
            table: OnceLock::new(),
        }
    }

    /// The shared label table of `E`.
    pub fn table(&self) -> Result<&Arc<LabelTable<E>>, ConvertError> {
        if let Some(table) = self.table.get() {
            return Ok(table);
        }
        let shared = LabelTable::<E>::shared()?;
        Ok(self.table.get_or_init(|| shared))
    }

    /// The label written for `value`.
    pub fn label(&self, value: E) -> Result<&'static str, ConvertError> {
        self.table()?
            .label(value)
            .ok_or_else(|| ConvertError::UnmappedValue {
                value: format!("{}", value.discriminant()),
                enum_type: E::type_path(),
            })
    }

    /// The label of the member with the given integer discriminant.
    pub fn label_of_discriminant(&self, discriminant: i64) -> Result<&'static str, ConvertError> {
        let table = self.table()?;
        table
            .value_of_discriminant(discriminant)
            .and_then(|value| table.label(value))
            .ok_or_else(|| ConvertError::UnmappedValue {
                value: format!("{discriminant}"),
                enum_type: E::type_path(),
            })
    }

    /// The member labeled exactly `label`.
    pub fn value(&self, label: &str) -> Result<E, ConvertError> {
        self.table()?
            .value(label)
            .ok_or_else(|| ConvertError::UnknownLabel {
                label: String::from(label),
                enum_type: E::type_path(),
            })
    }

    pub(super) fn read_token(&self, token: LabelToken) -> Result<E, ConvertError> {
        match token.0 {
            Ok(label) => self.value(&label),
            Err(token) => Err(ConvertError::InvalidToken {
                token,
                enum_type: E::type_path(),
            }),
        }
    }

    /// Write `value` as its label.
    pub fn serialize<S: Serializer>(&self, value: &E, serializer: S) -> Result<S::Ok, S::Error> {
        let label = self.label(*value).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(label)
    }

    /// Write the member with the given discriminant as its label.
    ///
    /// Fails when no member has that discriminant.
    pub fn serialize_discriminant<S: Serializer>(
        &self,
        discriminant: i64,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let label = self
            .label_of_discriminant(discriminant)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(label)
    }

    /// Read a member from a string token.
    pub fn deserialize<'de, D: Deserializer<'de>>(&self, deserializer: D) -> Result<E, D::Error> {
        let token = <LabelToken as de::Deserialize>::deserialize(deserializer)?;
        self.read_token(token).map_err(de::Error::custom)
    }

    /// JSON text of `value`, a quoted label.
    pub fn to_string(&self, value: E) -> Result<String, ConvertError> {
        Ok(serde_json::to_string(self.label(value)?)?)
    }

    /// Parse a member from JSON text.
    pub fn from_str(&self, json: &str) -> Result<E, ConvertError> {
        let token: LabelToken = serde_json::from_str(json)?;
        self.read_token(token)
    }
}

impl<'de, E: LabeledEnum> DeserializeSeed<'de> for &EnumLabelConverter<E> {
    type Value = E;

    #[inline]
    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        EnumLabelConverter::deserialize(self, deserializer)
    }
}

impl<E> fmt::Debug for EnumLabelConverter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumLabelConverter")
            .field("enum_type", &core::any::type_name::<E>())
            .field("initialized", &self.table.get().is_some())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Labeled

/// A [`LabeledEnum`] serialized by label.
///
/// ```
/// use jc_convert::Labeled;
/// use jc_convert::derive::LabeledEnum;
///
/// #[derive(LabeledEnum, Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum Side {
///     #[convert(label = "L")]
///     Left,
///     #[convert(label = "R")]
///     Right,
/// }
///
/// let json = serde_json::to_string(&[Labeled(Side::Left), Labeled(Side::Right)]).unwrap();
/// assert_eq!(json, r#"["L","R"]"#);
///
/// let back: Vec<Labeled<Side>> = serde_json::from_str(&json).unwrap();
/// assert_eq!(back[1].0, Side::Right);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Labeled<E>(pub E);

impl<E: LabeledEnum> Serialize for Labeled<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        EnumLabelConverter::<E>::new().serialize(&self.0, serializer)
    }
}

impl<'de, E: LabeledEnum> de::Deserialize<'de> for Labeled<E> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        EnumLabelConverter::<E>::new()
            .deserialize(deserializer)
            .map(Labeled)
    }
}

impl<E> From<E> for Labeled<E> {
    #[inline]
    fn from(value: E) -> Self {
        Self(value)
    }
}

// -----------------------------------------------------------------------------
// as_label

/// Serde `with` module for [`LabeledEnum`] fields.
///
/// ```
/// use jc_convert::derive::LabeledEnum;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(LabeledEnum, Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum Mood {
///     #[convert(label = "happy")]
///     Happy,
/// }
///
/// #[derive(Serialize, Deserialize)]
/// struct Person {
///     #[serde(with = "jc_convert::label::as_label")]
///     mood: Mood,
/// }
///
/// let json = serde_json::to_string(&Person { mood: Mood::Happy }).unwrap();
/// assert_eq!(json, r#"{"mood":"happy"}"#);
/// ```
pub mod as_label {
    use serde::{Deserializer, Serializer};

    use super::EnumLabelConverter;
    use crate::label::LabeledEnum;

    pub fn serialize<E: LabeledEnum, S: Serializer>(
        value: &E,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        EnumLabelConverter::<E>::new().serialize(value, serializer)
    }

    pub fn deserialize<'de, E: LabeledEnum, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<E, D::Error> {
        EnumLabelConverter::<E>::new().deserialize(deserializer)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec::Vec;

    use serde::de::DeserializeSeed;

    use super::{EnumLabelConverter, Labeled};
    use crate::ConvertError;
    use crate::derive::LabeledEnum;

    #[derive(LabeledEnum, Clone, Copy, PartialEq, Eq, Hash, Debug)]
    enum TestEnum {
        #[convert(label = "first_value")]
        FirstValue,
        #[convert(label = "second_value")]
        SecondValue,
        ThirdValue,
    }

    #[test]
    fn writes_labels() {
        let converter = EnumLabelConverter::<TestEnum>::new();

        assert_eq!(converter.label(TestEnum::FirstValue).unwrap(), "first_value");
        assert_eq!(converter.label(TestEnum::SecondValue).unwrap(), "second_value");
        assert_eq!(converter.label(TestEnum::ThirdValue).unwrap(), "ThirdValue");
        assert_eq!(
            serde_json::to_string(&Labeled(TestEnum::SecondValue)).unwrap(),
            "\"second_value\""
        );
    }

    #[test]
    fn reads_labels() {
        let converter = EnumLabelConverter::<TestEnum>::new();

        assert_eq!(converter.from_str("\"first_value\"").unwrap(), TestEnum::FirstValue);
        assert_eq!(converter.from_str("\"ThirdValue\"").unwrap(), TestEnum::ThirdValue);

        let mut de = serde_json::Deserializer::from_str("\"second_value\"");
        assert_eq!(
            DeserializeSeed::deserialize(&converter, &mut de).unwrap(),
            TestEnum::SecondValue
        );
    }

    #[test]
    fn unknown_label() {
        let converter = EnumLabelConverter::<TestEnum>::new();

        let err = converter.from_str("\"bogus\"").unwrap_err();
        assert!(matches!(err, ConvertError::UnknownLabel { ref label, .. } if label == "bogus"));
        assert!(err.to_string().starts_with("Unable to convert"));

        // Labels are matched exactly.
        assert!(converter.from_str("\"FirstValue\"").is_err());
        assert!(converter.from_str("\"FIRST_VALUE\"").is_err());

        let err = serde_json::from_str::<Labeled<TestEnum>>("\"bogus\"").unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn non_string_token() {
        let converter = EnumLabelConverter::<TestEnum>::new();

        for json in ["7", "true", "null", "[1]", "{\"a\":1}"] {
            let err = converter.from_str(json).unwrap_err();
            assert!(matches!(err, ConvertError::InvalidToken { .. }), "{json}");
        }
    }

    #[test]
    fn discriminant_outside_member_set() {
        let converter = EnumLabelConverter::<TestEnum>::new();

        assert_eq!(converter.label_of_discriminant(1).unwrap(), "second_value");
        assert!(matches!(
            converter.label_of_discriminant(999),
            Err(ConvertError::UnmappedValue { ref value, .. }) if value == "999"
        ));

        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::new(&mut buf);
        assert!(converter.serialize_discriminant(999, &mut ser).is_err());
        converter.serialize_discriminant(2, &mut ser).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "\"ThirdValue\"");
    }

    #[derive(LabeledEnum, Clone, Copy, PartialEq, Eq, Hash, Debug)]
    #[repr(u64)]
    enum Wide {
        #[convert(label = "small")]
        Small = 3,
        #[convert(label = "top")]
        Top = i64::MAX as u64,
    }

    #[derive(LabeledEnum, Clone, Copy, PartialEq, Eq, Hash, Debug)]
    #[repr(i64)]
    enum Signed {
        #[convert(label = "below")]
        Below = -5,
        #[convert(label = "zero")]
        Zero = 0,
    }

    #[test]
    fn explicit_reprs() {
        let wide = EnumLabelConverter::<Wide>::new();
        assert_eq!(wide.label_of_discriminant(i64::MAX).unwrap(), "top");
        assert_eq!(wide.label_of_discriminant(3).unwrap(), "small");
        assert!(wide.label_of_discriminant(-1).is_err());
        assert_eq!(wide.from_str("\"top\"").unwrap(), Wide::Top);

        let signed = EnumLabelConverter::<Signed>::new();
        assert_eq!(signed.label_of_discriminant(-5).unwrap(), "below");

        let mut buf = Vec::new();
        let mut ser = serde_json::Serializer::new(&mut buf);
        signed.serialize_discriminant(0, &mut ser).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "\"zero\"");
    }
}
