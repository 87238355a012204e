//! `Describe` implementations for standard library and chrono types
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use super::types::{CollectionKind, Describe, MapKind, ScalarKind, TypeDescriptor};
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap, HashSet, LinkedList, VecDeque};

macro_rules! describe_scalar {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Describe for $ty {
                fn describe() -> TypeDescriptor {
                    TypeDescriptor::Scalar(ScalarKind::$kind)
                }
            }
        )*
    };
}

describe_scalar! {
    bool => Bool,
    char => Char,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => U64,
    f32 => F32,
    f64 => F64,
    String => String,
    chrono::DateTime<chrono::Utc> => DateTime,
    chrono::DateTime<chrono::FixedOffset> => DateTime,
    chrono::NaiveDateTime => NaiveDateTime,
    chrono::NaiveDate => Date,
}

macro_rules! describe_sequence {
    ($($collection:ident => $kind:ident),* $(,)?) => {
        $(
            impl<T: Describe> Describe for $collection<T> {
                fn describe() -> TypeDescriptor {
                    TypeDescriptor::sequence(T::describe(), CollectionKind::$kind)
                }
            }
        )*
    };
}

describe_sequence! {
    Vec => List,
    VecDeque => Custom,
    LinkedList => Custom,
    BTreeSet => Set,
    BinaryHeap => Heap,
}

impl<T: Describe, S> Describe for HashSet<T, S> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::sequence(T::describe(), CollectionKind::Set)
    }
}

impl<T: Describe, const N: usize> Describe for [T; N] {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::sequence(T::describe(), CollectionKind::Array)
    }
}

impl<K: Describe, V: Describe, S> Describe for HashMap<K, V, S> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::map(K::describe(), V::describe(), MapKind::Hash)
    }
}

impl<K: Describe, V: Describe> Describe for BTreeMap<K, V> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::map(K::describe(), V::describe(), MapKind::Ordered)
    }
}

impl<K: Describe, V: Describe> Describe for (K, V) {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::pair(K::describe(), V::describe())
    }
}

impl<T: Describe> Describe for Option<T> {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::optional(T::describe())
    }
}

// Boxing is transparent to serde, so it is transparent here too.
impl<T: Describe> Describe for Box<T> {
    fn describe() -> TypeDescriptor {
        T::describe()
    }
}
