//! Declarative macros for declaring mappable shapes
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

/// Declare a struct and its member list in one place
///
/// The struct must also derive (or implement) `Default`, `Serialize` and
/// `Deserialize`; serialized field names must equal the Rust field names.
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use shapeshift_core::shape;
///
/// shape! {
///     #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
///     pub struct City {
///         pub id: i32,
///         pub name: String,
///     }
/// }
/// ```
#[macro_export]
macro_rules! shape {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        impl $crate::Describe for $name {
            fn describe() -> $crate::TypeDescriptor {
                $crate::TypeDescriptor::Object($crate::ShapeRef::of::<$name>())
            }
        }

        impl $crate::Shape for $name {
            fn members() -> ::std::vec::Vec<$crate::MemberDescriptor> {
                ::std::vec![
                    $(
                        $crate::MemberDescriptor::new(
                            ::std::stringify!($field),
                            <$ty as $crate::Describe>::describe(),
                        ),
                    )*
                ]
            }
        }
    };
}

/// Mark unit-variant enums as scalar members, converted by variant name
#[macro_export]
macro_rules! scalar_enum {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Describe for $ty {
                fn describe() -> $crate::TypeDescriptor {
                    $crate::TypeDescriptor::Scalar($crate::ScalarKind::Enum($crate::TypeKey::of::<$ty>()))
                }
            }
        )+
    };
}
