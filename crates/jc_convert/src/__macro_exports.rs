//! Items used by generated code. Not public API.

pub use alloc::boxed::Box;
pub use core::any::Any;

#[cfg(feature = "auto_register")]
pub mod auto_register {
    use crate::info::TypePath;
    use crate::label::{EnumLabelFactory, LabeledEnum};
    use crate::registry::TypeRegistry;

    pub use inventory;

    /// Registration function submitted by `#[convert(auto_register)]`.
    pub struct __AutoRegisterFunc(pub fn(&mut TypeRegistry));

    inventory::collect!(__AutoRegisterFunc);

    /// Enum registration submitted by `#[derive(LabeledEnum)]` with `auto_register`.
    pub struct __AutoRegisterEnum(pub fn(&EnumLabelFactory));

    inventory::collect!(__AutoRegisterEnum);

    pub trait __RegisterType {
        fn __register(registry: &mut TypeRegistry);
    }

    impl<T: TypePath> __RegisterType for T {
        #[inline]
        fn __register(registry: &mut TypeRegistry) {
            registry.register::<T>();
        }
    }

    pub trait __RegisterEnum {
        fn __register_enum(factory: &EnumLabelFactory);
    }

    impl<E: LabeledEnum> __RegisterEnum for E {
        #[inline]
        fn __register_enum(factory: &EnumLabelFactory) {
            factory.register::<E>();
        }
    }

    /// Always submitted, its presence after a run tells whether the
    /// platform collects `inventory` entries at all.
    pub struct __AvailFlag;

    impl TypePath for __AvailFlag {
        fn type_path() -> &'static str {
            "jc_convert::__macro_exports::auto_register::__AvailFlag"
        }
        fn type_name() -> &'static str {
            "__AvailFlag"
        }
        fn type_ident() -> &'static str {
            "__AvailFlag"
        }
        fn module_path() -> Option<&'static str> {
            Some("jc_convert::__macro_exports::auto_register")
        }
    }

    inventory::submit! {
        __AutoRegisterFunc(<__AvailFlag as __RegisterType>::__register)
    }

    pub fn __register_types(registry: &mut TypeRegistry) {
        for func in inventory::iter::<__AutoRegisterFunc> {
            (func.0)(registry);
        }
    }

    pub fn __register_enums(factory: &EnumLabelFactory) {
        for func in inventory::iter::<__AutoRegisterEnum> {
            (func.0)(factory);
        }
    }
}
