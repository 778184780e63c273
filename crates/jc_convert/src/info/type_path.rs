use alloc::string::String;

// -----------------------------------------------------------------------------
// TypePath

/// A static accessor to type paths and names.
///
/// The polymorphic converter writes [`type_path`] into the `"Type"` field and
/// resolves it again on read, so the path of a registered type is part of the
/// wire format. It does not depend on the compiler version, but it does change
/// when the definition is moved unless an explicit path is given.
///
/// We guarantee that these names do not have the prefix `::`.
/// Users should also ensure this when manually implementing it.
///
/// # Implementation
///
/// ## derive macro
///
/// ```
/// use jc_convert::derive::TypePath;
/// use jc_convert::info::TypePath as _;
///
/// // `module_path!()` joined with the identifier.
/// #[derive(TypePath)]
/// struct Moving;
///
/// // This type path will never change, even if the definition is moved.
/// #[derive(TypePath)]
/// #[convert(type_path = "zoo::animals::Dog")]
/// struct Dog;
///
/// assert!(Moving::type_path().ends_with("::Moving"));
/// assert_eq!(Dog::type_path(), "zoo::animals::Dog");
/// assert_eq!(Dog::type_name(), "Dog");
/// assert_eq!(Dog::module_path(), Some("zoo::animals"));
/// ```
///
/// ## Manually
///
/// ```
/// use jc_convert::info::TypePath;
///
/// struct Foo;
///
/// impl TypePath for Foo {
///     fn type_path() -> &'static str { "my_crate::foo::Foo" }
///     fn type_name() -> &'static str { "Foo" }
///     fn type_ident() -> &'static str { "Foo" }
///     fn module_path() -> Option<&'static str> { Some("my_crate::foo") }
/// }
/// ```
///
/// [`type_path`]: TypePath::type_path
pub trait TypePath: 'static {
    /// Returns the fully qualified path of the target type.
    ///
    /// This is the complete unique identifier of a type,
    /// and should **not** duplicated in different types.
    fn type_path() -> &'static str;

    /// Returns the type name without module path.
    ///
    /// This name allows for duplication.
    fn type_name() -> &'static str;

    /// Returns the short name of the type, without generics.
    fn type_ident() -> &'static str;

    /// Optional module path where the type is defined.
    ///
    /// Primitive built-in types return `None`.
    fn module_path() -> Option<&'static str> {
        None
    }
}

// -----------------------------------------------------------------------------
// TypePathTable

/// Lightweight vtable providing dynamic access to [`TypePath`] APIs.
///
/// Registries store one per type instead of requiring `T` at lookup time.
///
/// ```
/// use jc_convert::info::TypePathTable;
///
/// let x = TypePathTable::of::<String>();
/// assert_eq!(x.path(), "alloc::string::String");
/// assert_eq!(x.name(), "String");
/// assert_eq!(x.module_path(), Some("alloc::string"));
/// ```
#[derive(Clone, Copy)]
pub struct TypePathTable {
    type_path: fn() -> &'static str,
    type_name: fn() -> &'static str,
    type_ident: fn() -> &'static str,
    module_path: fn() -> Option<&'static str>,
}

impl TypePathTable {
    /// Creates a new table from a type.
    #[inline]
    pub const fn of<T: TypePath>() -> Self {
        Self {
            type_path: T::type_path,
            type_name: T::type_name,
            type_ident: T::type_ident,
            module_path: T::module_path,
        }
    }

    /// See [`TypePath::type_path`]
    #[inline(always)]
    pub fn path(&self) -> &'static str {
        (self.type_path)()
    }

    /// See [`TypePath::type_name`]
    #[inline(always)]
    pub fn name(&self) -> &'static str {
        (self.type_name)()
    }

    /// See [`TypePath::type_ident`]
    #[inline(always)]
    pub fn ident(&self) -> &'static str {
        (self.type_ident)()
    }

    /// See [`TypePath::module_path`]
    #[inline(always)]
    pub fn module_path(&self) -> Option<&'static str> {
        (self.module_path)()
    }
}

impl core::fmt::Debug for TypePathTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TypePathTable")
            .field("type_path", &self.path())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Foreign impls

macro_rules! impl_primitive_type_path {
    ($($ty:ident),* $(,)?) => {
        $(
            impl TypePath for $ty {
                #[inline]
                fn type_path() -> &'static str { stringify!($ty) }
                #[inline]
                fn type_name() -> &'static str { stringify!($ty) }
                #[inline]
                fn type_ident() -> &'static str { stringify!($ty) }
            }
        )*
    };
}

impl_primitive_type_path!(
    bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64,
);

impl TypePath for String {
    #[inline]
    fn type_path() -> &'static str {
        "alloc::string::String"
    }

    #[inline]
    fn type_name() -> &'static str {
        "String"
    }

    #[inline]
    fn type_ident() -> &'static str {
        "String"
    }

    #[inline]
    fn module_path() -> Option<&'static str> {
        Some("alloc::string")
    }
}

// -----------------------------------------------------------------------------
// Tests
