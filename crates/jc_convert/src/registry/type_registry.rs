use alloc::string::String;
use alloc::sync::Arc;
use core::any::TypeId;
use std::sync::PoisonError;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use jc_utils::TypeIdMap;
use jc_utils::hash::{HashMap, fixed_hash_state};

use crate::info::{TypePath, TypePathTable};

// -----------------------------------------------------------------------------
// TypeRegistry

/// A registry of types with a stable [`TypePath`].
///
/// # Example
///
/// ```
/// use core::any::TypeId;
/// use jc_convert::registry::TypeRegistry;
///
/// let registry = TypeRegistry::new();
///
/// let table = registry.get_with_type_path("alloc::string::String").unwrap();
/// assert_eq!(table.ident(), "String");
/// assert!(registry.contains(TypeId::of::<i32>()));
/// ```
pub struct TypeRegistry {
    type_path_table: TypeIdMap<TypePathTable>,
    type_path_to_id: HashMap<&'static str, TypeId>,
}

impl Default for TypeRegistry {
    /// See [`TypeRegistry::new`] .
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Create a empty [`TypeRegistry`].
    #[inline]
    pub const fn empty() -> Self {
        Self {
            type_path_table: TypeIdMap::new(),
            type_path_to_id: HashMap::with_hasher(fixed_hash_state()),
        }
    }

    /// Create a type registry with default registrations for primitive types.
    ///
    /// - `bool` `char`
    /// - `i8 - i128` `isize`
    /// - `u8 - u128` `usize`
    /// - `f32` `f64`
    /// - `String`
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register::<bool>();
        registry.register::<char>();
        registry.register::<u8>();
        registry.register::<u16>();
        registry.register::<u32>();
        registry.register::<u64>();
        registry.register::<u128>();
        registry.register::<usize>();
        registry.register::<i8>();
        registry.register::<i16>();
        registry.register::<i32>();
        registry.register::<i64>();
        registry.register::<i128>();
        registry.register::<isize>();
        registry.register::<f32>();
        registry.register::<f64>();
        registry.register::<String>();
        registry
    }

    /// Attempts to register the type `T` if it has not yet been registered already.
    ///
    /// Returns `false` if `T` was already present.
    ///
    /// # Example
    ///
    /// ```
    /// use core::any::TypeId;
    /// use jc_convert::derive::TypePath;
    /// use jc_convert::registry::TypeRegistry;
    ///
    /// #[derive(TypePath)]
    /// #[convert(type_path = "zoo::Rock")]
    /// struct Rock;
    ///
    /// let mut registry = TypeRegistry::empty();
    /// assert!(registry.register::<Rock>());
    /// assert!(!registry.register::<Rock>());
    /// assert!(registry.contains(TypeId::of::<Rock>()));
    /// assert!(registry.get_with_type_path("zoo::Rock").is_some());
    /// ```
    pub fn register<T: TypePath>(&mut self) -> bool {
        let inserted = self
            .type_path_table
            .try_insert(TypeId::of::<T>(), TypePathTable::of::<T>);

        if inserted {
            self.type_path_to_id.insert(T::type_path(), TypeId::of::<T>());
            log::trace!("registered type path `{}`", T::type_path());
        }

        inserted
    }

    /// Automatically registers all types annotated with `#[convert(auto_register)]`
    /// or declared via `impl_auto_register!`.
    ///
    /// Repeated calls are cheap and will not insert duplicates.
    ///
    /// ## Return Value
    ///
    /// Returns `true` if automatic registration succeeded on the current platform; otherwise, `false`.
    ///
    /// ## Feature Dependency
    ///
    /// This method requires the `auto_register` feature. When disabled, it always do nothing and
    /// returns `false`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use core::any::TypeId;
    /// use jc_convert::derive::TypePath;
    /// use jc_convert::registry::TypeRegistry;
    ///
    /// #[derive(TypePath)]
    /// #[convert(auto_register)]
    /// struct Rock;
    ///
    /// let mut registry = TypeRegistry::empty();
    /// assert!(registry.auto_register());
    /// assert!(registry.contains(TypeId::of::<Rock>()));
    /// ```
    #[cfg_attr(not(feature = "auto_register"), inline(always))]
    pub fn auto_register(&mut self) -> bool {
        #[cfg(feature = "auto_register")]
        {
            use crate::__macro_exports::auto_register;
            // Reduce the cost of duplicate registrations.
            if self.contains(TypeId::of::<auto_register::__AvailFlag>()) {
                return true;
            }
            auto_register::__register_types(self);
            let available = self.contains(TypeId::of::<auto_register::__AvailFlag>());
            if !available {
                log::warn!("automatic type registration is not supported on this platform");
            }
            available
        }

        #[cfg(not(feature = "auto_register"))]
        {
            false
        }
    }

    /// Whether the type with given [`TypeId`] has been registered in this registry.
    #[inline]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.type_path_table.contains(&type_id)
    }

    /// Returns the [`TypePathTable`] of the type with the given [`TypeId`].
    #[inline]
    pub fn get(&self, type_id: TypeId) -> Option<&TypePathTable> {
        self.type_path_table.get(&type_id)
    }

    /// Returns the [`TypePathTable`] of the type with the given [type path].
    ///
    /// If no type with the given type path has been registered, returns `None`.
    ///
    /// [type path]: TypePath::type_path
    pub fn get_with_type_path(&self, type_path: &str) -> Option<&TypePathTable> {
        match self.type_path_to_id.get(type_path) {
            Some(id) => self.get(*id),
            None => None,
        }
    }

    /// Returns the number of registered types.
    #[inline]
    pub fn len(&self) -> usize {
        self.type_path_table.len()
    }

    /// Returns `true` if no type has been registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.type_path_table.is_empty()
    }

}

// -----------------------------------------------------------------------------
// TypeRegistryArc

/// A shared [`TypeRegistry`], the form the polymorphic converter holds.
#[derive(Clone, Default)]
pub struct TypeRegistryArc {
    /// The wrapped [`TypeRegistry`].
    pub internal: Arc<RwLock<TypeRegistry>>,
}

impl TypeRegistryArc {
    #[inline]
    pub fn new(registry: TypeRegistry) -> Self {
        Self {
            internal: Arc::new(RwLock::new(registry)),
        }
    }

    /// Takes a read lock on the underlying [`TypeRegistry`].
    pub fn read(&self) -> RwLockReadGuard<'_, TypeRegistry> {
        self.internal.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Takes a write lock on the underlying [`TypeRegistry`].
    pub fn write(&self) -> RwLockWriteGuard<'_, TypeRegistry> {
        self.internal
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<TypeRegistry> for TypeRegistryArc {
    #[inline]
    fn from(value: TypeRegistry) -> Self {
        Self::new(value)
    }
}

impl core::fmt::Debug for TypeRegistryArc {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.read().type_path_to_id.keys().fmt(f)
    }
}

// -----------------------------------------------------------------------------
// Tests
