//! Field enumeration for Rust-side `#[repr(C)]` bindings.
//!
//! The [`binding!`](crate::binding) macro declares a binding type and records
//! its layout as computed by rustc: offsets come from `offset_of!`, element
//! sizes and counts from [`NativeElement`]. Nothing is re-derived by hand.
//!
//! ```ignore
//! abi_conform::binding! {
//!     pub struct linger {
//!         pub l_onoff: c_int,
//!         pub l_linger: c_int,
//!     }
//! }
//! ```
//!
//! `pub` fields are reported as `_<name>` so they are checked; private fields
//! keep their bare name and are skipped. Raw identifiers lose their `r#`.

use std::mem::size_of;

use super::StructureDefinition;

/// Element information for a field type.
///
/// Arrays report their element type and flatten the count, so a field of
/// type `[[u8; 4]; 2]` is eight `uint8_t`.
pub trait NativeElement {
    /// Element type name
    const NAME: &'static str;
    /// Size of one element
    const SIZE: usize;
    /// Number of elements
    const COUNT: usize = 1;
}

/// A binding type whose layout can be enumerated.
pub trait Binding: NativeElement {
    fn definition() -> StructureDefinition;
}

macro_rules! primitive_elements {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl NativeElement for $ty {
                const NAME: &'static str = $name;
                const SIZE: usize = size_of::<$ty>();
            }
        )*
    };
}

primitive_elements! {
    i8 => "int8_t",
    u8 => "uint8_t",
    i16 => "int16_t",
    u16 => "uint16_t",
    i32 => "int32_t",
    u32 => "uint32_t",
    i64 => "int64_t",
    u64 => "uint64_t",
    isize => "intptr_t",
    usize => "uintptr_t",
    f32 => "float",
    f64 => "double",
}

impl<T> NativeElement for *mut T {
    const NAME: &'static str = "pointer";
    const SIZE: usize = size_of::<*mut T>();
}

impl<T> NativeElement for *const T {
    const NAME: &'static str = "pointer";
    const SIZE: usize = size_of::<*const T>();
}

impl<T: NativeElement, const N: usize> NativeElement for [T; N] {
    const NAME: &'static str = T::NAME;
    const SIZE: usize = T::SIZE;
    const COUNT: usize = N * T::COUNT;
}

/// Encode a Rust field identifier the way the name resolver expects.
pub fn raw_field_name(ident: &str, public: bool) -> String {
    let ident = ident.strip_prefix("r#").unwrap_or(ident);
    if public {
        format!("_{}", ident)
    } else {
        ident.to_string()
    }
}

/// Declare a `#[repr(C)]` binding type and implement [`Binding`] for it.
///
/// Three forms are accepted: a struct with named fields, a union, and a
/// single-field tuple struct for scalar typedefs (`size_t`, `pid_t`). Extra
/// attributes such as `repr(packed)` or `repr(align(4))` are passed through.
#[macro_export]
macro_rules! binding {
    (@impl $vis:vis $name:ident, $kind:expr, $offset:ident, { $( $fvis:vis $field:ident : $fty:ty ),* }) => {
        impl $crate::catalog::reflect::NativeElement for $name {
            const NAME: &'static str = stringify!($name);
            const SIZE: usize = ::std::mem::size_of::<$name>();
        }

        impl $crate::catalog::reflect::Binding for $name {
            fn definition() -> $crate::catalog::StructureDefinition {
                $crate::catalog::StructureDefinition {
                    name: stringify!($name).to_string(),
                    public: !stringify!($vis).is_empty(),
                    kind: $kind,
                    fields: vec![$(
                        $crate::core::RawField {
                            name: $crate::catalog::reflect::raw_field_name(
                                stringify!($field),
                                !stringify!($fvis).is_empty(),
                            ),
                            offset: $crate::binding!(@offset $offset $name, $field),
                            element: $crate::core::ElementType::new(
                                <$fty as $crate::catalog::reflect::NativeElement>::NAME,
                                <$fty as $crate::catalog::reflect::NativeElement>::SIZE,
                            ),
                            count: <$fty as $crate::catalog::reflect::NativeElement>::COUNT,
                        }
                    ),*],
                    size: ::std::mem::size_of::<$name>(),
                }
            }
        }
    };

    (@offset measured $name:ident, $field:ident) => {
        ::std::mem::offset_of!($name, $field)
    };

    // Union members all start at the beginning of the union.
    (@offset zero $name:ident, $field:ident) => {
        0
    };

    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident {
            $( $fvis:vis $field:ident : $fty:ty ),* $(,)?
        }
    ) => {
        $(#[$attr])*
        #[repr(C)]
        #[derive(Clone, Copy)]
        #[allow(non_camel_case_types, dead_code)]
        $vis struct $name {
            $( $fvis $field: $fty ),*
        }

        $crate::binding!(@impl $vis $name, $crate::catalog::DefinitionKind::Struct, measured, {
            $( $fvis $field : $fty ),*
        });
    };

    (
        $(#[$attr:meta])*
        $vis:vis union $name:ident {
            $( $fvis:vis $field:ident : $fty:ty ),* $(,)?
        }
    ) => {
        $(#[$attr])*
        #[repr(C)]
        #[derive(Clone, Copy)]
        #[allow(non_camel_case_types, dead_code)]
        $vis union $name {
            $( $fvis $field: $fty ),*
        }

        $crate::binding!(@impl $vis $name, $crate::catalog::DefinitionKind::Union, zero, {
            $( $fvis $field : $fty ),*
        });
    };

    (
        $(#[$attr:meta])*
        $vis:vis struct $name:ident ( $inner:ty );
    ) => {
        $(#[$attr])*
        #[repr(C)]
        #[derive(Clone, Copy)]
        #[allow(non_camel_case_types)]
        $vis struct $name(pub $inner);

        impl $crate::catalog::reflect::NativeElement for $name {
            const NAME: &'static str = stringify!($name);
            const SIZE: usize = ::std::mem::size_of::<$name>();
        }

        impl $crate::catalog::reflect::Binding for $name {
            fn definition() -> $crate::catalog::StructureDefinition {
                $crate::catalog::StructureDefinition {
                    name: stringify!($name).to_string(),
                    public: !stringify!($vis).is_empty(),
                    kind: $crate::catalog::DefinitionKind::Scalar,
                    fields: vec![$crate::core::RawField {
                        name: "0".to_string(),
                        offset: 0,
                        element: $crate::core::ElementType::new(
                            <$inner as $crate::catalog::reflect::NativeElement>::NAME,
                            <$inner as $crate::catalog::reflect::NativeElement>::SIZE,
                        ),
                        count: 1,
                    }],
                    size: ::std::mem::size_of::<$name>(),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DefinitionKind;
    use std::ffi::{c_char, c_int, c_long};

    crate::binding! {
        pub struct sample {
            pub first: c_int,
            pub r#type: [c_char; 6],
            __reserved: c_long,
        }
    }

    crate::binding! {
        pub union sample_union {
            pub small: u16,
            pub large: u64,
        }
    }

    crate::binding! {
        pub struct sample_t(c_long);
    }

    crate::binding! {
        struct hidden {
            pub value: u8,
        }
    }

    #[test]
    fn test_struct_definition() {
        let def = sample::definition();
        assert_eq!(def.name, "sample");
        assert_eq!(def.kind, DefinitionKind::Struct);
        assert!(def.public);
        assert_eq!(def.size, std::mem::size_of::<sample>());

        let names: Vec<_> = def.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["_first", "_type", "__reserved"]);

        let array = &def.fields[1];
        assert_eq!(array.offset, 4);
        assert_eq!(array.element.size, 1);
        assert_eq!(array.count, 6);
        assert_eq!(def.fields[2].offset, std::mem::offset_of!(sample, __reserved));
    }

    #[test]
    fn test_union_definition() {
        let def = sample_union::definition();
        assert_eq!(def.kind, DefinitionKind::Union);
        assert!(def.fields.iter().all(|f| f.offset == 0));
        assert_eq!(def.size, 8);
    }

    #[test]
    fn test_scalar_definition() {
        let def = sample_t::definition();
        assert_eq!(def.kind, DefinitionKind::Scalar);
        assert_eq!(def.fields[0].name, "0");
        assert_eq!(def.size, std::mem::size_of::<c_long>());
    }

    #[test]
    fn test_private_binding() {
        assert!(!hidden::definition().public);
    }

    #[test]
    fn test_nested_array_flattens() {
        assert_eq!(<[[u8; 4]; 2] as NativeElement>::COUNT, 8);
        assert_eq!(<[[u8; 4]; 2] as NativeElement>::SIZE, 1);
        assert_eq!(<[sample_t; 3] as NativeElement>::NAME, "sample_t");
    }

    #[test]
    fn test_raw_field_name() {
        assert_eq!(raw_field_name("r#type", true), "_type");
        assert_eq!(raw_field_name("sa_data", true), "_sa_data");
        assert_eq!(raw_field_name("__pad", false), "__pad");
    }
}
