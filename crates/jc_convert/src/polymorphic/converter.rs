use alloc::boxed::Box;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use core::fmt;

use serde::de::{Deserialize, DeserializeSeed, Deserializer};
use serde::ser::{Serialize, Serializer};
use serde_json::Value;

use super::tag::{Failure, Tag, TagFirst, fail};
use super::{CapabilityRegistry, Implementation};
use crate::error::describe;
use crate::fields::IgnoreCase;
use crate::registry::TypeRegistryArc;
use crate::{Capability, ConvertError, ConvertOptions, TYPE_KEY};

// -----------------------------------------------------------------------------
// PolymorphicConverter

/// Converts values of the capability `C` whose concrete type varies at runtime.
///
/// On write, the concrete type is looked up by [`TypeId`] in the
/// [`CapabilityRegistry`] and its path is written under `"Type"` ahead of the
/// value's own fields. On read, `"Type"` selects the registered type, is
/// removed, and the rest of the object is read as that type.
///
/// An absent value is `null` in both directions.
///
/// # Examples
///
/// ```
/// use core::any::Any;
/// use jc_convert::derive::TypePath;
/// use jc_convert::{CapabilityRegistry, PolymorphicConverter, impl_capability};
/// use serde::{Deserialize, Serialize};
///
/// trait Animal: Any {
///     fn name(&self) -> &str;
/// }
///
/// #[derive(TypePath, Serialize, Deserialize)]
/// #[convert(type_path = "zoo::Cat")]
/// #[serde(rename_all = "PascalCase")]
/// struct Cat {
///     name: String,
///     lives: u8,
/// }
///
/// impl Animal for Cat {
///     fn name(&self) -> &str { &self.name }
/// }
///
/// impl_capability!(Animal => Cat);
///
/// let registry = CapabilityRegistry::<dyn Animal>::new().with::<Cat>().unwrap();
/// let converter = PolymorphicConverter::new(registry);
///
/// let cat: Box<dyn Animal> = Box::new(Cat { name: "Tom".into(), lives: 9 });
/// let json = converter.to_string(Some(&*cat)).unwrap();
/// assert_eq!(json, r#"{"Type":"zoo::Cat","Name":"Tom","Lives":9}"#);
///
/// let back = converter.from_str(&json).unwrap().unwrap();
/// assert_eq!(back.name(), "Tom");
/// ```
///
/// [`TypeId`]: core::any::TypeId
pub struct PolymorphicConverter<C: ?Sized> {
    registry: Arc<CapabilityRegistry<C>>,
    type_registry: Option<TypeRegistryArc>,
    options: ConvertOptions,
}

impl<C: ?Sized + Capability> PolymorphicConverter<C> {
    #[inline]
    pub fn new(registry: CapabilityRegistry<C>) -> Self {
        Self {
            registry: Arc::new(registry),
            type_registry: None,
            options: ConvertOptions::new(),
        }
    }

    #[inline]
    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    /// Consult `type_registry` when a discriminator is not an implementation
    /// of `C`, to report [`ConvertError::IncompatibleType`] for paths of known
    /// types instead of [`ConvertError::UnknownType`].
    #[inline]
    pub fn with_type_registry(mut self, type_registry: TypeRegistryArc) -> Self {
        self.type_registry = Some(type_registry);
        self
    }

    #[inline]
    pub fn registry(&self) -> &CapabilityRegistry<C> {
        &self.registry
    }

    #[inline]
    pub fn options(&self) -> ConvertOptions {
        self.options
    }

    fn implementation_of(&self, value: &C) -> Result<&Implementation<C>, ConvertError> {
        let type_id = value.concrete_type_id();
        self.registry
            .get(type_id)
            .ok_or_else(|| ConvertError::UnregisteredType {
                type_id: format!("{type_id:?}"),
                capability: C::capability_name(),
            })
    }

    fn resolve(&self, type_path: &str) -> Result<&Implementation<C>, ConvertError> {
        if let Some(implementation) = self.registry.get_with_type_path(type_path) {
            return Ok(implementation);
        }

        let known = self
            .type_registry
            .as_ref()
            .is_some_and(|registry| registry.read().get_with_type_path(type_path).is_some());

        if known {
            Err(ConvertError::IncompatibleType {
                type_path: String::from(type_path),
                capability: C::capability_name(),
            })
        } else {
            Err(ConvertError::UnknownType {
                type_path: String::from(type_path),
                capability: C::capability_name(),
            })
        }
    }

    /// Write `value` as its concrete type, with `"Type"` as the first entry.
    ///
    /// Typed failures are left in `failure`.
    fn write<S: Serializer>(
        &self,
        value: &C,
        serializer: S,
        failure: &Failure,
    ) -> Result<S::Ok, S::Error> {
        let implementation = match self.implementation_of(value) {
            Ok(implementation) => implementation,
            Err(err) => return Err(fail(failure, err)),
        };
        let type_path = implementation.type_path();

        let Some(concrete) = implementation.serializable(value) else {
            return Err(fail(
                failure,
                ConvertError::MismatchedImplementation {
                    capability: C::capability_name(),
                    implementation: type_path,
                },
            ));
        };

        let tag = Tag { type_path, failure };
        Serialize::serialize(concrete, TagFirst { serializer, tag })
    }

    /// Read a value from an already parsed JSON value. `null` reads as `None`.
    pub fn from_value(&self, value: Value) -> Result<Option<Box<C>>, ConvertError> {
        let mut object = match value {
            Value::Null => return Ok(None),
            Value::Object(object) => object,
            other => {
                return Err(ConvertError::NotAnObject {
                    type_path: String::from(C::capability_name()),
                    found: describe(&other),
                });
            }
        };

        let type_path = match object.shift_remove(TYPE_KEY) {
            Some(Value::String(type_path)) => type_path,
            Some(other) => {
                return Err(ConvertError::InvalidDiscriminator {
                    found: describe(&other),
                    capability: C::capability_name(),
                });
            }
            None => {
                return Err(ConvertError::MissingDiscriminator {
                    capability: C::capability_name(),
                });
            }
        };

        let implementation = self.resolve(&type_path)?;

        let object = Value::Object(object);
        let result = if self.options.property_name_case_insensitive {
            implementation.deserialize(IgnoreCase(object))
        } else {
            implementation.deserialize(object)
        };

        result
            .map(Some)
            .map_err(|err| ConvertError::Delegate {
                type_path: implementation.type_path(),
                message: err.to_string(),
            })
    }

    /// Write `value` tagged with its type path, or `null` when absent.
    pub fn serialize<S: Serializer>(
        &self,
        value: Option<&C>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            None => serializer.serialize_none(),
            Some(value) => self.write(value, serializer, &Failure::default()),
        }
    }

    /// Read a tagged value. `null` reads as `None`.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        &self,
        deserializer: D,
    ) -> Result<Option<Box<C>>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        self.from_value(value).map_err(serde::de::Error::custom)
    }

    /// Like [`deserialize`](Self::deserialize), but `null` fails with
    /// [`ConvertError::MissingDiscriminator`].
    pub fn deserialize_required<'de, D: Deserializer<'de>>(
        &self,
        deserializer: D,
    ) -> Result<Box<C>, D::Error> {
        self.deserialize(deserializer)?
            .ok_or_else(|| serde::de::Error::custom(self.missing()))
    }

    fn missing(&self) -> ConvertError {
        ConvertError::MissingDiscriminator {
            capability: C::capability_name(),
        }
    }

    /// A [`Serialize`] view of `value` through this converter, for use
    /// inside other serialized data.
    #[inline]
    pub fn tagged<'a>(&'a self, value: &'a C) -> Tagged<'a, C> {
        Tagged {
            converter: self,
            value: Some(value),
        }
    }

    /// JSON text of `value`.
    pub fn to_string(&self, value: Option<&C>) -> Result<String, ConvertError> {
        let Some(value) = value else {
            return Ok(String::from("null"));
        };

        let failure = Failure::default();
        let writing = Writing {
            converter: self,
            value,
            failure: &failure,
        };

        serde_json::to_string(&writing).map_err(|err| {
            failure.take().unwrap_or_else(|| ConvertError::Delegate {
                type_path: self
                    .registry
                    .get(value.concrete_type_id())
                    .map_or(C::capability_name(), Implementation::type_path),
                message: err.to_string(),
            })
        })
    }

    /// Parse a value from JSON text.
    pub fn from_str(&self, json: &str) -> Result<Option<Box<C>>, ConvertError> {
        let value: Value = serde_json::from_str(json)?;
        self.from_value(value)
    }

    /// Like [`from_str`](Self::from_str), but `null` fails with
    /// [`ConvertError::MissingDiscriminator`].
    pub fn from_str_required(&self, json: &str) -> Result<Box<C>, ConvertError> {
        self.from_str(json)?.ok_or_else(|| self.missing())
    }
}

impl<C: ?Sized> Clone for PolymorphicConverter<C> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            type_registry: self.type_registry.clone(),
            options: self.options,
        }
    }
}

impl<C: ?Sized> fmt::Debug for PolymorphicConverter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolymorphicConverter")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .finish()
    }
}

impl<'de, C: ?Sized + Capability> DeserializeSeed<'de> for &PolymorphicConverter<C> {
    type Value = Option<Box<C>>;

    #[inline]
    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        PolymorphicConverter::deserialize(self, deserializer)
    }
}

// -----------------------------------------------------------------------------
// Tagged

/// A capability value serialized through a [`PolymorphicConverter`].
///
/// Returned by [`PolymorphicConverter::tagged`].
pub struct Tagged<'a, C: ?Sized> {
    converter: &'a PolymorphicConverter<C>,
    value: Option<&'a C>,
}

impl<C: ?Sized + Capability> Serialize for Tagged<'_, C> {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.converter.serialize(self.value, serializer)
    }
}

struct Writing<'a, C: ?Sized> {
    converter: &'a PolymorphicConverter<C>,
    value: &'a C,
    failure: &'a Failure,
}

impl<C: ?Sized + Capability> Serialize for Writing<'_, C> {
    #[inline]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.converter.write(self.value, serializer, self.failure)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use core::any::Any;

    use serde::{Deserialize, Serialize};

    use super::PolymorphicConverter;
    use crate::derive::TypePath;
    use crate::info::TypePath as _;
    use crate::polymorphic::CapabilityRegistry;
    use crate::registry::{TypeRegistry, TypeRegistryArc};
    use crate::{ConvertError, ConvertOptions, Implements};

    trait Animal: Any {
        fn name(&self) -> &str;
    }

    #[derive(TypePath, Serialize, Deserialize, Debug, PartialEq)]
    #[serde(rename_all = "PascalCase")]
    struct Dog {
        name: String,
        is_barking: bool,
    }

    #[derive(TypePath, Serialize, Deserialize, Debug, PartialEq)]
    #[convert(type_path = "zoo::Cat")]
    #[serde(rename_all = "PascalCase")]
    struct Cat {
        name: String,
        lives: u8,
    }

    #[derive(TypePath, Serialize, Deserialize)]
    struct Fish;

    #[derive(TypePath, Serialize, Deserialize)]
    #[convert(type_path = "zoo::Cat")]
    struct Impostor {
        name: String,
    }

    #[derive(TypePath, Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct Robot {
        name: String,
        r#type: String,
    }

    #[derive(TypePath, Serialize, Deserialize)]
    struct Pet(String);

    #[derive(TypePath, Serialize, Deserialize)]
    #[convert(type_path = "zoo::Eel")]
    #[serde(rename_all = "PascalCase")]
    struct Eel {
        id: u128,
    }

    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct Owner {
        name: String,
    }

    #[derive(TypePath, Serialize, Deserialize)]
    #[convert(type_path = "zoo::Beagle")]
    #[serde(rename_all = "PascalCase")]
    struct Beagle {
        name: String,
        owner: Owner,
    }

    #[derive(TypePath, Serialize, Deserialize)]
    #[convert(type_path = "zoo::Bird")]
    enum Bird {
        Parrot { words: u8 },
        Crow(String),
    }

    impl Animal for Dog {
        fn name(&self) -> &str {
            &self.name
        }
    }

    impl Animal for Cat {
        fn name(&self) -> &str {
            &self.name
        }
    }

    impl Animal for Fish {
        fn name(&self) -> &str {
            "fish"
        }
    }

    impl Animal for Impostor {
        fn name(&self) -> &str {
            &self.name
        }
    }

    impl Animal for Robot {
        fn name(&self) -> &str {
            &self.name
        }
    }

    impl Animal for Pet {
        fn name(&self) -> &str {
            &self.0
        }
    }

    impl Animal for Eel {
        fn name(&self) -> &str {
            "eel"
        }
    }

    impl Animal for Beagle {
        fn name(&self) -> &str {
            &self.name
        }
    }

    impl Animal for Bird {
        fn name(&self) -> &str {
            match self {
                Bird::Parrot { .. } => "parrot",
                Bird::Crow(_) => "crow",
            }
        }
    }

    crate::impl_capability!(Animal => Dog, Cat, Fish, Impostor, Robot, Pet, Eel, Beagle, Bird);

    fn converter() -> PolymorphicConverter<dyn Animal> {
        let registry = CapabilityRegistry::<dyn Animal>::new()
            .with::<Dog>()
            .unwrap()
            .with::<Cat>()
            .unwrap();
        PolymorphicConverter::new(registry)
    }

    fn rex() -> Box<dyn Animal> {
        Dog {
            name: "Rex".into(),
            is_barking: true,
        }
        .upcast()
    }

    #[test]
    fn round_trip_keeps_concrete_type() {
        let converter = converter();

        let json = converter.to_string(Some(&*rex())).unwrap();
        assert!(json.starts_with(r#"{"Type":""#));
        assert!(json.ends_with(r#"::Dog","Name":"Rex","IsBarking":true}"#));

        let back = converter.from_str(&json).unwrap().unwrap();
        assert_eq!(
            Dog::downcast_ref(&*back),
            Some(&Dog {
                name: "Rex".into(),
                is_barking: true
            })
        );

        let cat = Cat {
            name: "Tom".into(),
            lives: 9,
        }
        .upcast();
        let json = converter.to_string(Some(&*cat)).unwrap();
        assert_eq!(json, r#"{"Type":"zoo::Cat","Name":"Tom","Lives":9}"#);
        let back = converter.from_str(&json).unwrap().unwrap();
        assert_eq!(back.name(), "Tom");
        assert!(Dog::downcast_ref(&*back).is_none());
        assert_eq!(Cat::downcast_ref(&*back).map(|c| c.lives), Some(9));
    }

    #[test]
    fn type_is_the_first_key() {
        let converter = converter();
        let json = converter.to_string(Some(&*rex())).unwrap();
        let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&json).unwrap();
        let keys: Vec<&str> = object.keys().map(String::as_str).collect();
        assert_eq!(keys, ["Type", "Name", "IsBarking"]);
    }

    #[test]
    fn discriminator_position_does_not_matter() {
        let converter = converter();
        let back = converter
            .from_str(r#"{"Name":"Tom","Lives":3,"Type":"zoo::Cat"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(back.name(), "Tom");
    }

    #[test]
    fn null_is_absent() {
        let converter = converter();
        assert_eq!(converter.to_string(None).unwrap(), "null");
        assert!(converter.from_str("null").unwrap().is_none());
        assert!(matches!(
            converter.from_str_required("null"),
            Err(ConvertError::MissingDiscriminator { .. })
        ));
    }

    #[test]
    fn missing_discriminator() {
        let err = converter().from_str(r#"{"Name":"Rex"}"#).err().unwrap();
        assert!(matches!(err, ConvertError::MissingDiscriminator { .. }));
        assert!(err.to_string().contains("Missing type discriminator"));
    }

    #[test]
    fn invalid_discriminator() {
        let err = converter().from_str(r#"{"Type":5,"Name":"Rex"}"#).err().unwrap();
        assert!(matches!(err, ConvertError::InvalidDiscriminator { .. }));
    }

    #[test]
    fn unknown_type() {
        let err = converter()
            .from_str(r#"{"Type":"Unknown.Type","Name":"x"}"#)
            .err()
            .unwrap();
        assert!(matches!(err, ConvertError::UnknownType { ref type_path, .. } if type_path == "Unknown.Type"));
        assert!(err.to_string().contains("Unknown type"));
    }

    #[test]
    fn incompatible_type() {
        let json = r#"{"Type":"alloc::string::String"}"#;

        assert!(matches!(
            converter().from_str(json),
            Err(ConvertError::UnknownType { .. })
        ));

        let types = TypeRegistryArc::new(TypeRegistry::new());
        let converter = converter().with_type_registry(types);
        assert!(matches!(
            converter.from_str(json),
            Err(ConvertError::IncompatibleType { .. })
        ));
        assert!(matches!(
            converter.from_str(r#"{"Type":"Unknown.Type"}"#),
            Err(ConvertError::UnknownType { .. })
        ));
    }

    #[test]
    fn known_but_unregistered_implementation() {
        let mut types = TypeRegistry::new();
        types.register::<Fish>();
        let converter = converter().with_type_registry(types.into());

        let json = format!(r#"{{"Type":"{}"}}"#, Fish::type_path());
        let err = converter.from_str(&json).err().unwrap();
        assert!(matches!(err, ConvertError::IncompatibleType { .. }));
        assert!(
            err.to_string()
                .contains("is not a registered implementation of `dyn Animal`")
        );
    }

    #[test]
    fn not_an_object() {
        let converter = converter();
        assert!(matches!(
            converter.from_str("[1, 2]"),
            Err(ConvertError::NotAnObject { .. })
        ));

        let mut registry = CapabilityRegistry::<dyn Animal>::new();
        registry.register::<Pet>().unwrap();
        let converter = PolymorphicConverter::new(registry);
        assert!(matches!(
            converter.to_string(Some(&*Pet("Bo".into()).upcast())),
            Err(ConvertError::NotAnObject { ref found, .. }) if found == "string \"Bo\""
        ));
    }

    #[test]
    fn unregistered_type() {
        let fish = Fish.upcast();
        assert!(matches!(
            converter().to_string(Some(&*fish)),
            Err(ConvertError::UnregisteredType { .. })
        ));
    }

    #[test]
    fn reserved_field() {
        let mut registry = CapabilityRegistry::<dyn Animal>::new();
        registry.register::<Robot>().unwrap();
        let converter = PolymorphicConverter::new(registry);

        let robot = Robot {
            name: "R2".into(),
            r#type: "astromech".into(),
        }
        .upcast();
        assert!(matches!(
            converter.to_string(Some(&*robot)),
            Err(ConvertError::ReservedField { .. })
        ));
    }

    #[test]
    fn duplicate_type_path() {
        let mut registry = CapabilityRegistry::<dyn Animal>::new();
        assert!(registry.register::<Cat>().unwrap());
        assert!(!registry.register::<Cat>().unwrap());
        assert_eq!(
            registry.register::<Impostor>(),
            Err(ConvertError::DuplicateTypePath {
                type_path: "zoo::Cat"
            })
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn delegate_failure() {
        let err = converter()
            .from_str(r#"{"Type":"zoo::Cat","Name":"Tom","Lives":"many"}"#)
            .err()
            .unwrap();
        assert!(matches!(err, ConvertError::Delegate { type_path: "zoo::Cat", .. }));
    }

    #[test]
    fn case_insensitive_fields() {
        let json = r#"{"Type":"zoo::Cat","name":"Tom","LIVES":2}"#;
        assert!(converter().from_str(json).is_err());

        let options = ConvertOptions::new().with_property_name_case_insensitive(true);
        let converter = converter().with_options(options);
        let back = converter.from_str(json).unwrap().unwrap();
        assert_eq!(Cat::downcast_ref(&*back).map(|c| c.lives), Some(2));

        // The discriminator key itself stays exact.
        assert!(matches!(
            converter.from_str(r#"{"type":"zoo::Cat","Name":"Tom","Lives":2}"#),
            Err(ConvertError::MissingDiscriminator { .. })
        ));
    }

    #[test]
    fn case_insensitive_nested_fields() {
        let registry = CapabilityRegistry::<dyn Animal>::new().with::<Beagle>().unwrap();
        let json = r#"{"Type":"zoo::Beagle","name":"Rex","owner":{"name":"Ann"}}"#;

        let converter = PolymorphicConverter::new(registry);
        assert!(matches!(
            converter.from_str(json),
            Err(ConvertError::Delegate { .. })
        ));

        let options = ConvertOptions::new().with_property_name_case_insensitive(true);
        let converter = converter.with_options(options);
        let back = converter.from_str(json).unwrap().unwrap();
        let beagle = Beagle::downcast_ref(&*back).unwrap();
        assert_eq!((beagle.name.as_str(), beagle.owner.name.as_str()), ("Rex", "Ann"));
    }

    #[test]
    fn large_integers_are_written_as_is() {
        let registry = CapabilityRegistry::<dyn Animal>::new().with::<Eel>().unwrap();
        let converter = PolymorphicConverter::new(registry);

        let eel = Eel {
            id: u128::from(u64::MAX) + 1,
        }
        .upcast();
        let expected = r#"{"Type":"zoo::Eel","Id":18446744073709551616}"#;
        assert_eq!(converter.to_string(Some(&*eel)).unwrap(), expected);
        assert_eq!(serde_json::to_string(&converter.tagged(&*eel)).unwrap(), expected);
    }

    #[test]
    fn enum_implementations() {
        let registry = CapabilityRegistry::<dyn Animal>::new().with::<Bird>().unwrap();
        let converter = PolymorphicConverter::new(registry);

        let parrot = Bird::Parrot { words: 3 }.upcast();
        let json = converter.to_string(Some(&*parrot)).unwrap();
        assert_eq!(json, r#"{"Type":"zoo::Bird","Parrot":{"words":3}}"#);
        let back = converter.from_str(&json).unwrap().unwrap();
        assert!(matches!(Bird::downcast_ref(&*back), Some(Bird::Parrot { words: 3 })));

        let crow = Bird::Crow("caw".into()).upcast();
        let json = converter.to_string(Some(&*crow)).unwrap();
        assert_eq!(json, r#"{"Type":"zoo::Bird","Crow":"caw"}"#);
        assert_eq!(converter.from_str(&json).unwrap().unwrap().name(), "crow");
    }

    #[test]
    fn inside_other_data() {
        let converter = converter();
        let zoo: Vec<Box<dyn Animal>> = vec![
            rex(),
            Cat {
                name: "Tom".into(),
                lives: 9,
            }
            .upcast(),
        ];

        let tagged: Vec<_> = zoo.iter().map(|animal| converter.tagged(&**animal)).collect();
        let json = serde_json::to_string(&tagged).unwrap();
        assert!(json.contains(r#"{"Type":"zoo::Cat","Name":"Tom","Lives":9}"#));

        #[derive(Deserialize)]
        struct Raw(Vec<serde_json::Value>);

        let Raw(values) = serde_json::from_str(&json).unwrap();
        let names: Vec<String> = values
            .into_iter()
            .map(|value| converter.from_value(value).unwrap().unwrap().name().to_string())
            .collect();
        assert_eq!(names, ["Rex", "Tom"]);
    }
}
