use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use core::any::{Any, TypeId};
use core::fmt;
use std::sync::{PoisonError, RwLock};

use jc_utils::TypeIdMap;
use serde::de::{self, Deserializer};
use serde::ser::{self, Serializer};

use super::converter::LabelToken;
use super::{EnumLabelConverter, LabeledEnum};
use crate::ConvertError;

// -----------------------------------------------------------------------------
// ErasedLabels

/// A label converter with the enum type erased.
///
/// Obtained from [`EnumLabelFactory::create_converter`].
pub trait ErasedLabels: Send + Sync {
    /// The type path of the enum.
    fn enum_type(&self) -> &'static str;

    fn enum_type_id(&self) -> TypeId;

    /// The label of `value`, which must be of the enum type.
    fn label_of(&self, value: &dyn Any) -> Result<&'static str, ConvertError>;

    fn label_of_discriminant(&self, discriminant: i64) -> Result<&'static str, ConvertError>;

    /// The member labeled `label`, boxed.
    fn value_of(&self, label: &str) -> Result<Box<dyn Any + Send>, ConvertError>;
}

impl<E: LabeledEnum> ErasedLabels for EnumLabelConverter<E> {
    #[inline]
    fn enum_type(&self) -> &'static str {
        E::type_path()
    }

    #[inline]
    fn enum_type_id(&self) -> TypeId {
        TypeId::of::<E>()
    }

    fn label_of(&self, value: &dyn Any) -> Result<&'static str, ConvertError> {
        match value.downcast_ref::<E>() {
            Some(value) => self.label(*value),
            None => Err(ConvertError::MismatchedImplementation {
                capability: "dyn Any",
                implementation: E::type_path(),
            }),
        }
    }

    #[inline]
    fn label_of_discriminant(&self, discriminant: i64) -> Result<&'static str, ConvertError> {
        EnumLabelConverter::label_of_discriminant(self, discriminant)
    }

    fn value_of(&self, label: &str) -> Result<Box<dyn Any + Send>, ConvertError> {
        self.value(label).map(|value| Box::new(value) as Box<dyn Any + Send>)
    }
}

// -----------------------------------------------------------------------------
// EnumLabelFactory

#[derive(Clone, Copy)]
struct Creator {
    type_path: fn() -> &'static str,
    create: fn() -> Result<Arc<dyn ErasedLabels>, ConvertError>,
}

fn create<E: LabeledEnum>() -> Result<Arc<dyn ErasedLabels>, ConvertError> {
    let converter = EnumLabelConverter::<E>::new();
    converter.table()?;
    Ok(Arc::new(converter))
}

/// Selects a label converter by [`TypeId`].
///
/// An enum is convertible once it has been [`register`]ed, explicitly or
/// through `#[convert(auto_register)]` and [`auto_register`]. One converter is
/// created per enum type and reused for every later request on the same
/// factory. All converters read the same process-wide tables as
/// [`EnumLabelConverter`], so both produce identical labels and failures.
///
/// # Examples
///
/// ```
/// use core::any::TypeId;
/// use jc_convert::EnumLabelFactory;
/// use jc_convert::derive::LabeledEnum;
///
/// #[derive(LabeledEnum, Clone, Copy, PartialEq, Eq, Hash, Debug)]
/// enum Speed {
///     #[convert(label = "slow")]
///     Slow,
///     Fast,
/// }
///
/// let factory = EnumLabelFactory::new();
/// assert!(!factory.can_convert(TypeId::of::<Speed>()));
///
/// factory.register::<Speed>();
/// assert!(factory.can_convert(TypeId::of::<Speed>()));
/// assert!(!factory.can_convert(TypeId::of::<String>()));
///
/// let converter = factory.create_converter(TypeId::of::<Speed>()).unwrap();
/// assert_eq!(converter.label_of(&Speed::Slow).unwrap(), "slow");
///
/// assert_eq!(factory.to_string(Speed::Fast).unwrap(), "\"Fast\"");
/// assert_eq!(factory.from_str::<Speed>("\"slow\"").unwrap(), Speed::Slow);
/// ```
///
/// [`register`]: EnumLabelFactory::register
/// [`auto_register`]: EnumLabelFactory::auto_register
pub struct EnumLabelFactory {
    creators: RwLock<TypeIdMap<Creator>>,
    converters: RwLock<TypeIdMap<Arc<dyn ErasedLabels>>>,
}

impl Default for EnumLabelFactory {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl EnumLabelFactory {
    /// Create a factory that knows no enum.
    #[inline]
    pub const fn new() -> Self {
        Self {
            creators: RwLock::new(TypeIdMap::new()),
            converters: RwLock::new(TypeIdMap::new()),
        }
    }

    /// Make `E` convertible. Returns `false` if it already was.
    pub fn register<E: LabeledEnum>(&self) -> bool {
        let inserted = self
            .creators
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .try_insert(TypeId::of::<E>(), || Creator {
                type_path: E::type_path,
                create: create::<E>,
            });

        if inserted {
            log::debug!("registered labeled enum `{}`", E::type_path());
        }
        inserted
    }

    /// Registers every enum deriving `LabeledEnum` with `#[convert(auto_register)]`.
    ///
    /// Returns the number of newly registered enums. Always `0` without the
    /// `auto_register` feature.
    pub fn auto_register(&self) -> usize {
        #[cfg(feature = "auto_register")]
        {
            let before = self.len();
            crate::__macro_exports::auto_register::__register_enums(self);
            self.len() - before
        }

        #[cfg(not(feature = "auto_register"))]
        {
            0
        }
    }

    /// Number of registered enum types.
    pub fn len(&self) -> usize {
        self.creators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this factory handles the type.
    pub fn can_convert(&self, type_id: TypeId) -> bool {
        self.creators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&type_id)
    }

    /// The converter for the type, created on first request.
    pub fn create_converter(&self, type_id: TypeId) -> Result<Arc<dyn ErasedLabels>, ConvertError> {
        let cached = self
            .converters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .cloned();

        if let Some(converter) = cached {
            return Ok(converter);
        }

        let creator = self
            .creators
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .copied()
            .ok_or_else(|| ConvertError::UnsupportedType {
                type_name: format!("{type_id:?}"),
            })?;

        let built = (creator.create)()?;

        let installed = self
            .converters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert(type_id, || built.clone())
            .clone();

        if Arc::ptr_eq(&installed, &built) {
            log::debug!("created label converter for `{}`", (creator.type_path)());
        } else {
            log::trace!("discarded concurrent label converter for `{}`", (creator.type_path)());
        }

        Ok(installed)
    }

    /// The converter for `E`, failing with [`ConvertError::UnsupportedType`]
    /// if `E` is not registered.
    fn converter<E: LabeledEnum>(&self) -> Result<Arc<dyn ErasedLabels>, ConvertError> {
        if !self.can_convert(TypeId::of::<E>()) {
            return Err(ConvertError::UnsupportedType {
                type_name: String::from(E::type_path()),
            });
        }
        self.create_converter(TypeId::of::<E>())
    }

    fn label<E: LabeledEnum>(&self, value: E) -> Result<&'static str, ConvertError> {
        self.converter::<E>()?.label_of(&value)
    }

    fn read_token<E: LabeledEnum>(&self, token: LabelToken) -> Result<E, ConvertError> {
        let converter = self.converter::<E>()?;
        let label = token.0.map_err(|token| ConvertError::InvalidToken {
            token,
            enum_type: E::type_path(),
        })?;

        converter
            .value_of(&label)?
            .downcast::<E>()
            .map(|value| *value)
            .map_err(|_| ConvertError::MismatchedImplementation {
                capability: "dyn Any",
                implementation: E::type_path(),
            })
    }

    /// Write `value` as its label.
    pub fn serialize<E: LabeledEnum, S: Serializer>(
        &self,
        value: &E,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let label = self.label(*value).map_err(ser::Error::custom)?;
        serializer.serialize_str(label)
    }

    /// Write the member of the type with the given discriminant as its label.
    pub fn serialize_discriminant<S: Serializer>(
        &self,
        type_id: TypeId,
        discriminant: i64,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let label = self
            .create_converter(type_id)
            .and_then(|converter| converter.label_of_discriminant(discriminant))
            .map_err(ser::Error::custom)?;
        serializer.serialize_str(label)
    }

    /// Read a member of `E` from a string token.
    pub fn deserialize<'de, E: LabeledEnum, D: Deserializer<'de>>(
        &self,
        deserializer: D,
    ) -> Result<E, D::Error> {
        let token = <LabelToken as de::Deserialize>::deserialize(deserializer)?;
        self.read_token(token).map_err(de::Error::custom)
    }

    /// JSON text of `value`, a quoted label.
    pub fn to_string<E: LabeledEnum>(&self, value: E) -> Result<String, ConvertError> {
        Ok(serde_json::to_string(self.label(value)?)?)
    }

    /// Parse a member of `E` from JSON text.
    pub fn from_str<E: LabeledEnum>(&self, json: &str) -> Result<E, ConvertError> {
        let token: LabelToken = serde_json::from_str(json)?;
        self.read_token(token)
    }
}

impl fmt::Debug for EnumLabelFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let creators = self.creators.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_list()
            .entries(creators.values().map(|c| (c.type_path)()))
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;
    use alloc::vec::Vec;
    use core::any::TypeId;

    use super::EnumLabelFactory;
    use crate::derive::LabeledEnum;
    use crate::{ConvertError, EnumLabelConverter};

    #[derive(LabeledEnum, Clone, Copy, PartialEq, Eq, Hash, Debug)]
    enum TestEnum {
        #[convert(label = "first_value")]
        FirstValue,
        #[convert(label = "second_value")]
        SecondValue,
        ThirdValue,
    }

    #[cfg(feature = "auto_register")]
    #[derive(LabeledEnum, Clone, Copy, PartialEq, Eq, Hash, Debug)]
    #[convert(auto_register)]
    enum Planet {
        #[convert(label = "blue")]
        Earth,
        Mars,
    }

    #[test]
    fn can_convert() {
        let factory = EnumLabelFactory::new();
        assert!(factory.register::<TestEnum>());
        assert!(!factory.register::<TestEnum>());

        assert!(factory.can_convert(TypeId::of::<TestEnum>()));
        assert!(!factory.can_convert(TypeId::of::<String>()));
        assert!(!factory.can_convert(TypeId::of::<i32>()));
    }

    #[test]
    fn create_converter_is_cached() {
        let factory = EnumLabelFactory::new();
        factory.register::<TestEnum>();

        let first = factory.create_converter(TypeId::of::<TestEnum>()).unwrap();
        let second = factory.create_converter(TypeId::of::<TestEnum>()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.enum_type_id(), TypeId::of::<TestEnum>());
        assert!(first.enum_type().ends_with("::TestEnum"));

        assert!(matches!(
            factory.create_converter(TypeId::of::<String>()),
            Err(ConvertError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn agrees_with_typed_converter() {
        let factory = EnumLabelFactory::new();
        factory.register::<TestEnum>();
        let typed = EnumLabelConverter::<TestEnum>::new();

        for value in [TestEnum::FirstValue, TestEnum::SecondValue, TestEnum::ThirdValue] {
            assert_eq!(factory.to_string(value), typed.to_string(value));
            let json = factory.to_string(value).unwrap();
            assert_eq!(factory.from_str::<TestEnum>(&json).unwrap(), value);
        }

        for json in ["\"bogus\"", "\"FirstValue\"", "3", "null"] {
            let a = factory.from_str::<TestEnum>(json).unwrap_err();
            let b = typed.from_str(json).unwrap_err();
            assert_eq!(a, b, "{json}");
        }
    }

    #[test]
    fn erased_access() {
        let factory = EnumLabelFactory::new();
        factory.register::<TestEnum>();
        let converter = factory.create_converter(TypeId::of::<TestEnum>()).unwrap();

        assert_eq!(converter.label_of(&TestEnum::ThirdValue).unwrap(), "ThirdValue");
        assert!(converter.label_of(&7_u8).is_err());
        assert_eq!(converter.label_of_discriminant(0).unwrap(), "first_value");
        assert!(converter.label_of_discriminant(999).is_err());

        let value = converter.value_of("second_value").unwrap();
        assert_eq!(value.downcast_ref::<TestEnum>(), Some(&TestEnum::SecondValue));
        assert!(converter.value_of("bogus").is_err());
    }

    #[test]
    fn unregistered_enum() {
        let factory = EnumLabelFactory::new();
        assert!(matches!(
            factory.to_string(TestEnum::FirstValue),
            Err(ConvertError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn concurrent_creation() {
        let factory = Arc::new(EnumLabelFactory::new());
        factory.register::<TestEnum>();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let factory = factory.clone();
                std::thread::spawn(move || factory.create_converter(TypeId::of::<TestEnum>()).unwrap())
            })
            .collect();

        let converters: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(converters.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[cfg(feature = "auto_register")]
    #[test]
    fn auto_registered_enum() {
        let factory = EnumLabelFactory::new();
        assert!(factory.auto_register() >= 1);
        assert!(factory.can_convert(TypeId::of::<Planet>()));
        assert_eq!(factory.to_string(Planet::Earth).unwrap(), "\"blue\"");
        assert_eq!(factory.auto_register(), 0);
    }
}
