use alloc::boxed::Box;
use core::any::TypeId;
use core::fmt;

use jc_utils::TypeIdMap;
use jc_utils::hash::{HashMap, fixed_hash_state};
use serde::Serialize;
use serde::de::{DeserializeOwned, Deserializer};

use crate::info::TypePath;
use crate::{Capability, ConvertError, Implements};

// -----------------------------------------------------------------------------
// Implementation

/// The registered conversions of one concrete type behind the capability `C`.
pub struct Implementation<C: ?Sized> {
    type_id: TypeId,
    type_path: &'static str,
    serialize: fn(value: &C) -> Option<&dyn erased_serde::Serialize>,
    deserialize: fn(
        deserializer: &mut dyn erased_serde::Deserializer,
    ) -> Result<Box<C>, erased_serde::Error>,
}

impl<C: ?Sized + Capability> Implementation<C> {
    /// Create the entry of `T`.
    pub fn of<T>() -> Self
    where
        T: Implements<C> + TypePath + Serialize + DeserializeOwned,
    {
        Self {
            type_id: TypeId::of::<T>(),
            type_path: T::type_path(),
            serialize: |value| {
                T::downcast_ref(value).map(|value| value as &dyn erased_serde::Serialize)
            },
            deserialize: |deserializer| Ok(T::upcast(erased_serde::deserialize::<T>(deserializer)?)),
        }
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The discriminator written for this type.
    #[inline]
    pub fn type_path(&self) -> &'static str {
        self.type_path
    }

    /// `value` as its concrete type, or `None` if it is another type.
    #[inline]
    pub fn serializable<'a>(&self, value: &'a C) -> Option<&'a dyn erased_serde::Serialize> {
        (self.serialize)(value)
    }

    /// Read the concrete type and return it as `C`.
    pub fn deserialize<'de, D: Deserializer<'de>>(&self, deserializer: D) -> Result<Box<C>, D::Error> {
        let mut erased = <dyn erased_serde::Deserializer>::erase(deserializer);
        (self.deserialize)(&mut erased).map_err(<D::Error as serde::de::Error>::custom)
    }
}

impl<C: ?Sized> Clone for Implementation<C> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: ?Sized> Copy for Implementation<C> {}

impl<C: ?Sized> fmt::Debug for Implementation<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Implementation")
            .field("type_path", &self.type_path)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// CapabilityRegistry

/// The concrete types a [`PolymorphicConverter`] may write and read for `C`.
///
/// # Examples
///
/// ```
/// use core::any::Any;
/// use jc_convert::{CapabilityRegistry, impl_capability};
/// use jc_convert::derive::TypePath;
/// use serde::{Deserialize, Serialize};
///
/// trait Shape: Any {}
///
/// #[derive(TypePath, Serialize, Deserialize)]
/// #[convert(type_path = "shapes::Circle")]
/// struct Circle { r: f64 }
///
/// impl Shape for Circle {}
/// impl_capability!(Shape => Circle);
///
/// let mut registry = CapabilityRegistry::<dyn Shape>::new();
/// assert!(registry.register::<Circle>().unwrap());
/// assert!(!registry.register::<Circle>().unwrap());
/// assert_eq!(registry.get_with_type_path("shapes::Circle").unwrap().type_path(), "shapes::Circle");
/// ```
///
/// [`PolymorphicConverter`]: crate::PolymorphicConverter
pub struct CapabilityRegistry<C: ?Sized> {
    implementations: TypeIdMap<Implementation<C>>,
    type_path_to_id: HashMap<&'static str, TypeId>,
}

impl<C: ?Sized + Capability> Default for CapabilityRegistry<C> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ?Sized + Capability> CapabilityRegistry<C> {
    #[inline]
    pub fn new() -> Self {
        Self {
            implementations: TypeIdMap::new(),
            type_path_to_id: HashMap::with_hasher(fixed_hash_state()),
        }
    }

    /// Add `T` as an implementation of `C`.
    ///
    /// Returns `Ok(false)` if `T` is already registered. Fails with
    /// [`ConvertError::DuplicateTypePath`] if another type uses the same path.
    pub fn register<T>(&mut self) -> Result<bool, ConvertError>
    where
        T: Implements<C> + TypePath + Serialize + DeserializeOwned,
    {
        let type_id = TypeId::of::<T>();
        if self.implementations.contains(&type_id) {
            return Ok(false);
        }

        let type_path = T::type_path();
        if self.type_path_to_id.contains_key(type_path) {
            return Err(ConvertError::DuplicateTypePath { type_path });
        }

        self.implementations.insert(type_id, Implementation::of::<T>());
        self.type_path_to_id.insert(type_path, type_id);

        log::debug!("registered `{type_path}` for `{}`", C::capability_name());
        Ok(true)
    }

    /// Builder form of [`register`](Self::register).
    #[inline]
    pub fn with<T>(mut self) -> Result<Self, ConvertError>
    where
        T: Implements<C> + TypePath + Serialize + DeserializeOwned,
    {
        self.register::<T>()?;
        Ok(self)
    }

    #[inline]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.implementations.contains(&type_id)
    }

    #[inline]
    pub fn get(&self, type_id: TypeId) -> Option<&Implementation<C>> {
        self.implementations.get(&type_id)
    }

    pub fn get_with_type_path(&self, type_path: &str) -> Option<&Implementation<C>> {
        match self.type_path_to_id.get(type_path) {
            Some(id) => self.get(*id),
            None => None,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.implementations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.implementations.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Implementation<C>> {
        self.implementations.values()
    }
}

impl<C: ?Sized> fmt::Debug for CapabilityRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.type_path_to_id.keys()).finish()
    }
}
