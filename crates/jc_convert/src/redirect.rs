//! Capability values read and written through one bound concrete type.

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use core::any::type_name;
use core::fmt;
use core::marker::PhantomData;

use serde::de::{Deserialize, DeserializeOwned, DeserializeSeed, Deserializer};
use serde::ser::{Serialize, Serializer};
use serde_json::Value;

use crate::fields::IgnoreCase;
use crate::{Capability, ConvertError, ConvertOptions, Implements};

// -----------------------------------------------------------------------------
// InterfaceConverter

/// Converts values of the capability `C` as if they were the concrete type `P`.
///
/// The JSON is exactly `P`'s own, no type information is written or read.
/// An absent value is `null`.
///
/// # Examples
///
/// ```
/// use core::any::Any;
/// use jc_convert::{InterfaceConverter, impl_capability};
/// use serde::{Deserialize, Serialize};
///
/// trait Named: Any {
///     fn name(&self) -> &str;
/// }
///
/// #[derive(Serialize, Deserialize)]
/// #[serde(rename_all = "PascalCase")]
/// struct Plain {
///     name: String,
/// }
///
/// impl Named for Plain {
///     fn name(&self) -> &str { &self.name }
/// }
///
/// impl_capability!(Named => Plain);
///
/// let converter = InterfaceConverter::<dyn Named, Plain>::new();
///
/// let value = converter.from_str(r#"{"Name":"x"}"#).unwrap().unwrap();
/// assert_eq!(value.name(), "x");
/// assert_eq!(converter.to_string(Some(&*value)).unwrap(), r#"{"Name":"x"}"#);
///
/// assert!(converter.from_str("null").unwrap().is_none());
/// assert_eq!(converter.to_string(None).unwrap(), "null");
/// ```
pub struct InterfaceConverter<C: ?Sized, P> {
    options: ConvertOptions,
    _marker: PhantomData<fn() -> (P, Box<C>)>,
}

impl<C: ?Sized + Capability, P: Implements<C> + Serialize + DeserializeOwned>
    InterfaceConverter<C, P>
{
    #[inline]
    pub const fn new() -> Self {
        Self::with_options(ConvertOptions::new())
    }

    #[inline]
    pub const fn with_options(options: ConvertOptions) -> Self {
        Self {
            options,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub const fn options(&self) -> ConvertOptions {
        self.options
    }

    fn concrete<'a>(&self, value: &'a C) -> Result<&'a P, ConvertError> {
        P::downcast_ref(value).ok_or_else(|| ConvertError::MismatchedImplementation {
            capability: C::capability_name(),
            implementation: type_name::<P>(),
        })
    }

    fn from_value(&self, value: Value) -> Result<Option<Box<C>>, ConvertError> {
        let concrete = match value {
            Value::Null => return Ok(None),
            value if self.options.property_name_case_insensitive => P::deserialize(IgnoreCase(value)),
            value => P::deserialize(value),
        };

        concrete
            .map(|concrete| Some(concrete.upcast()))
            .map_err(|err| ConvertError::Delegate {
                type_path: type_name::<P>(),
                message: err.to_string(),
            })
    }

    /// Write `value` as `P`, or `null` when absent.
    pub fn serialize<S: Serializer>(
        &self,
        value: Option<&C>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            None => serializer.serialize_none(),
            Some(value) => self
                .concrete(value)
                .map_err(serde::ser::Error::custom)?
                .serialize(serializer),
        }
    }

    /// Read a `P` and return it as `C`. `null` reads as `None`.
    ///
    /// A value `P` rejects fails with the message of
    /// [`ConvertError::Delegate`], whatever the options.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        &self,
        deserializer: D,
    ) -> Result<Option<Box<C>>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        self.from_value(value).map_err(serde::de::Error::custom)
    }

    /// Like [`deserialize`](Self::deserialize), but `null` fails with
    /// [`ConvertError::NoValue`].
    pub fn deserialize_required<'de, D: Deserializer<'de>>(
        &self,
        deserializer: D,
    ) -> Result<Box<C>, D::Error> {
        self.deserialize(deserializer)?
            .ok_or_else(|| serde::de::Error::custom(self.no_value()))
    }

    fn no_value(&self) -> ConvertError {
        ConvertError::NoValue {
            implementation: type_name::<P>(),
        }
    }

    /// JSON text of `value`.
    pub fn to_string(&self, value: Option<&C>) -> Result<String, ConvertError> {
        match value {
            None => Ok(String::from("null")),
            Some(value) => Ok(serde_json::to_string(self.concrete(value)?)?),
        }
    }

    /// Parse a value from JSON text.
    pub fn from_str(&self, json: &str) -> Result<Option<Box<C>>, ConvertError> {
        let value: Value = serde_json::from_str(json)?;
        self.from_value(value)
    }

    /// Like [`from_str`](Self::from_str), but `null` fails with
    /// [`ConvertError::NoValue`].
    pub fn from_str_required(&self, json: &str) -> Result<Box<C>, ConvertError> {
        self.from_str(json)?.ok_or_else(|| self.no_value())
    }
}

impl<C: ?Sized + Capability, P: Implements<C> + Serialize + DeserializeOwned> Default
    for InterfaceConverter<C, P>
{
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ?Sized, P> Clone for InterfaceConverter<C, P> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            options: self.options,
            _marker: PhantomData,
        }
    }
}

impl<C: ?Sized, P> fmt::Debug for InterfaceConverter<C, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceConverter")
            .field("capability", &type_name::<C>())
            .field("implementation", &type_name::<P>())
            .field("options", &self.options)
            .finish()
    }
}

impl<'de, C, P> DeserializeSeed<'de> for &InterfaceConverter<C, P>
where
    C: ?Sized + Capability,
    P: Implements<C> + Serialize + DeserializeOwned,
{
    type Value = Option<Box<C>>;

    #[inline]
    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        InterfaceConverter::deserialize(self, deserializer)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use core::any::Any;

    use serde::de::DeserializeSeed;
    use serde::{Deserialize, Serialize};

    use super::InterfaceConverter;
    use crate::{ConvertError, ConvertOptions, Implements};

    trait TestInterface: Any {
        fn name(&self) -> &str;
        fn value(&self) -> i32;
    }

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    #[serde(rename_all = "PascalCase")]
    struct TestImplementation {
        name: String,
        value: i32,
    }

    impl TestInterface for TestImplementation {
        fn name(&self) -> &str {
            &self.name
        }
        fn value(&self) -> i32 {
            self.value
        }
    }

    struct OtherImplementation;

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct Details {
        value: i32,
    }

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct Card {
        name: String,
        details: Details,
    }

    impl TestInterface for Card {
        fn name(&self) -> &str {
            &self.name
        }
        fn value(&self) -> i32 {
            self.details.value
        }
    }

    impl TestInterface for OtherImplementation {
        fn name(&self) -> &str {
            "other"
        }
        fn value(&self) -> i32 {
            0
        }
    }

    crate::impl_capability!(TestInterface => TestImplementation, OtherImplementation, Card);

    type Converter = InterfaceConverter<dyn TestInterface, TestImplementation>;

    fn sample() -> Box<dyn TestInterface> {
        TestImplementation {
            name: "Test".into(),
            value: 42,
        }
        .upcast()
    }

    #[test]
    fn writes_concrete_json() {
        let converter = Converter::new();
        let value = sample();

        assert_eq!(
            converter.to_string(Some(&*value)).unwrap(),
            r#"{"Name":"Test","Value":42}"#
        );

        let mut buf = Vec::new();
        converter
            .serialize(Some(&*value), &mut serde_json::Serializer::new(&mut buf))
            .unwrap();
        assert_eq!(buf, br#"{"Name":"Test","Value":42}"#);
    }

    #[test]
    fn reads_concrete_json() {
        let converter = Converter::new();

        let value = converter
            .from_str(r#"{"Name":"Test","Value":42}"#)
            .unwrap()
            .unwrap();
        assert_eq!(value.name(), "Test");
        assert_eq!(value.value(), 42);
        assert!(TestImplementation::downcast_ref(&*value).is_some());

        let mut de = serde_json::Deserializer::from_str(r#"{"Name":"Seed","Value":1}"#);
        let value = DeserializeSeed::deserialize(&converter, &mut de).unwrap().unwrap();
        assert_eq!(value.name(), "Seed");
    }

    #[test]
    fn null_is_absent() {
        let converter = Converter::new();

        assert_eq!(converter.to_string(None).unwrap(), "null");
        assert!(converter.from_str("null").unwrap().is_none());

        let mut de = serde_json::Deserializer::from_str("null");
        assert!(converter.deserialize(&mut de).unwrap().is_none());

        assert!(matches!(
            converter.from_str_required("null"),
            Err(ConvertError::NoValue { .. })
        ));
        let mut de = serde_json::Deserializer::from_str("null");
        assert!(converter.deserialize_required(&mut de).is_err());
    }

    #[test]
    fn other_implementation_is_rejected() {
        let converter = Converter::new();
        let other = OtherImplementation.upcast();

        assert!(matches!(
            converter.to_string(Some(&*other)),
            Err(ConvertError::MismatchedImplementation {
                capability: "dyn TestInterface",
                ..
            })
        ));
    }

    #[test]
    fn case_insensitive_keys() {
        let json = r#"{"name":"Test","VALUE":7}"#;

        assert!(matches!(
            Converter::new().from_str(json),
            Err(ConvertError::Delegate { .. })
        ));

        let options = ConvertOptions::new().with_property_name_case_insensitive(true);
        let converter = Converter::with_options(options);
        let value = converter.from_str(json).unwrap().unwrap();
        assert_eq!((value.name(), value.value()), ("Test", 7));

        let mut de = serde_json::Deserializer::from_str(json);
        let value = converter.deserialize(&mut de).unwrap().unwrap();
        assert_eq!(value.value(), 7);
    }

    #[test]
    fn case_insensitive_nested_keys() {
        let json = r#"{"name":"Card","details":{"value":9}}"#;

        let converter = InterfaceConverter::<dyn TestInterface, Card>::new();
        assert!(converter.from_str(json).is_err());

        let options = ConvertOptions::new().with_property_name_case_insensitive(true);
        let converter = InterfaceConverter::<dyn TestInterface, Card>::with_options(options);
        let value = converter.from_str(json).unwrap().unwrap();
        assert_eq!((value.name(), value.value()), ("Card", 9));
    }

    #[test]
    fn rejected_values_report_the_implementation() {
        let json = r#"{"Name":"Test"}"#;
        let expected = ConvertError::Delegate {
            type_path: core::any::type_name::<TestImplementation>(),
            message: String::new(),
        };
        let prefix = expected.to_string();

        for case_insensitive in [false, true] {
            let options = ConvertOptions::new().with_property_name_case_insensitive(case_insensitive);
            let converter = Converter::with_options(options);

            assert!(matches!(
                converter.from_str(json),
                Err(ConvertError::Delegate { .. })
            ));

            let mut de = serde_json::Deserializer::from_str(json);
            let err = converter.deserialize(&mut de).err().unwrap();
            assert!(err.to_string().starts_with(&prefix), "{err}");
        }
    }
}
