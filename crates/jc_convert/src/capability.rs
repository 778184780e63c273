use alloc::boxed::Box;
use core::any::{Any, TypeId};

// -----------------------------------------------------------------------------
// Capability

/// A trait object type that values are converted through, such as `dyn Animal`.
///
/// Implemented by [`impl_capability!`](crate::impl_capability), which requires
/// the trait to have [`Any`] as a supertrait so a boxed value can report and
/// recover its concrete type.
///
/// # Examples
///
/// ```
/// use core::any::{Any, TypeId};
/// use jc_convert::{Capability, Implements, impl_capability};
///
/// trait Shape: Any {
///     fn area(&self) -> f64;
/// }
///
/// struct Square(f64);
///
/// impl Shape for Square {
///     fn area(&self) -> f64 { self.0 * self.0 }
/// }
///
/// impl_capability!(Shape => Square);
///
/// let shape: Box<dyn Shape> = Square(2.0).upcast();
/// assert_eq!(shape.area(), 4.0);
/// assert_eq!(shape.concrete_type_id(), TypeId::of::<Square>());
/// assert_eq!(<dyn Shape as Capability>::capability_name(), "dyn Shape");
/// assert!(Square::downcast_ref(&*shape).is_some());
/// ```
pub trait Capability: 'static {
    /// Name used in error messages.
    fn capability_name() -> &'static str;

    fn as_any(&self) -> &dyn Any;

    /// The [`TypeId`] of the value behind the trait object.
    #[inline]
    fn concrete_type_id(&self) -> TypeId {
        Any::type_id(self.as_any())
    }
}

// -----------------------------------------------------------------------------
// Implements

/// A concrete type that can stand behind the capability `C`.
pub trait Implements<C: ?Sized + Capability>: Sized + 'static {
    fn upcast(self) -> Box<C>;

    #[inline]
    fn downcast_ref(value: &C) -> Option<&Self> {
        value.as_any().downcast_ref::<Self>()
    }
}

// -----------------------------------------------------------------------------
// impl_capability

/// Declares a trait object as a [`Capability`] and lists the types that
/// implement it.
///
/// ```ignore
/// impl_capability!(Animal => Dog, Cat);
/// ```
///
/// More implementers can be added with further invocations of the form
/// `impl_capability!(Animal: Wolf)`.
#[macro_export]
macro_rules! impl_capability {
    ($cap:path => $($ty:ty),* $(,)?) => {
        impl $crate::Capability for dyn $cap {
            #[inline]
            fn capability_name() -> &'static str {
                ::core::concat!("dyn ", ::core::stringify!($cap))
            }

            #[inline]
            fn as_any(&self) -> &dyn $crate::__macro_exports::Any {
                self
            }
        }

        $crate::impl_capability!($cap: $($ty),*);
    };
    ($cap:path : $($ty:ty),* $(,)?) => {
        $(
            impl $crate::Implements<dyn $cap> for $ty {
                #[inline]
                fn upcast(self) -> $crate::__macro_exports::Box<dyn $cap> {
                    $crate::__macro_exports::Box::new(self)
                }
            }
        )*
    };
}
