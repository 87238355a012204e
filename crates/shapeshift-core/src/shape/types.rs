//! Core types describing mappable shapes
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Anything that can appear as the declared type of a member
pub trait Describe {
    /// Describe the declared type
    fn describe() -> TypeDescriptor;
}

/// A composite type with a fixed, ahead-of-time list of mappable members
///
/// Normally implemented through the [`shape!`](crate::shape) macro. Member
/// names must match the serialized field names.
pub trait Shape: Describe + Serialize + DeserializeOwned + Default + 'static {
    /// Mappable members in declaration order
    fn members() -> Vec<MemberDescriptor>;
}

/// Identity of a Rust type, with its name kept for diagnostics
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key of `T`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The underlying `TypeId`
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path or generic arguments
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

/// Handle to a composite shape: its identity plus the functions it supplies
#[derive(Clone, Copy)]
pub struct ShapeRef {
    key: TypeKey,
    members: fn() -> Vec<MemberDescriptor>,
    default_value: fn() -> Result<Value>,
}

impl ShapeRef {
    /// Shape handle of `T`
    pub fn of<T: Shape>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            members: T::members,
            default_value: default_value_of::<T>,
        }
    }

    /// Identity of the shape
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Short type name
    pub fn name(&self) -> &'static str {
        self.key.short_name()
    }

    /// Enumerate the members (uncached, see `ShapeIntrospector`)
    pub fn members(&self) -> Vec<MemberDescriptor> {
        (self.members)()
    }

    /// A default-constructed instance in value form
    pub fn instantiate(&self) -> Result<Value> {
        (self.default_value)()
    }
}

fn default_value_of<T: Shape>() -> Result<Value> {
    serde_json::to_value(T::default()).map_err(|e| Error::Materialization {
        type_name: TypeKey::of::<T>().short_name().to_string(),
        message: e.to_string(),
    })
}

impl PartialEq for ShapeRef {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ShapeRef {}

impl Hash for ShapeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Debug for ShapeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShapeRef({})", self.key.name())
    }
}

impl fmt::Display for ShapeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Scalar types: values with no further mappable structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    String,
    /// Timezone-aware timestamp (RFC 3339 text)
    DateTime,
    /// Timestamp without timezone
    NaiveDateTime,
    /// Calendar date
    Date,
    /// Unit-variant enumeration, serialized by variant name
    Enum(TypeKey),
}

impl ScalarKind {
    pub fn is_integer(&self) -> bool {
        self.integer_bounds().is_some()
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ScalarKind::F32 | ScalarKind::F64)
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, ScalarKind::DateTime | ScalarKind::NaiveDateTime | ScalarKind::Date)
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, ScalarKind::Enum(_))
    }

    /// Inclusive range of an integer kind
    pub fn integer_bounds(&self) -> Option<(i128, i128)> {
        let bounds = match self {
            ScalarKind::I8 => (i8::MIN as i128, i8::MAX as i128),
            ScalarKind::I16 => (i16::MIN as i128, i16::MAX as i128),
            ScalarKind::I32 => (i32::MIN as i128, i32::MAX as i128),
            ScalarKind::I64 => (i64::MIN as i128, i64::MAX as i128),
            ScalarKind::U8 => (0, u8::MAX as i128),
            ScalarKind::U16 => (0, u16::MAX as i128),
            ScalarKind::U32 => (0, u32::MAX as i128),
            ScalarKind::U64 => (0, u64::MAX as i128),
            _ => return None,
        };
        Some(bounds)
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Char => "char",
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::String => "String",
            ScalarKind::DateTime => "DateTime",
            ScalarKind::NaiveDateTime => "NaiveDateTime",
            ScalarKind::Date => "NaiveDate",
            ScalarKind::Enum(key) => key.short_name(),
        };
        write!(f, "{}", name)
    }
}

/// Destination shape of a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    /// Ordered growable list
    List,
    /// Fixed-size array
    Array,
    /// De-duplicating set
    Set,
    /// General append-only collection
    Custom,
    /// Priority heap, readable as a source only
    Heap,
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CollectionKind::List => "List",
            CollectionKind::Array => "Array",
            CollectionKind::Set => "Set",
            CollectionKind::Custom => "Collection",
            CollectionKind::Heap => "Heap",
        };
        write!(f, "{}", name)
    }
}

/// Flavor of a key/value map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapKind {
    Hash,
    Ordered,
}

/// Structural classification of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberClass {
    Primitive,
    NestedObject,
    Sequence,
    Map,
}

impl MemberClass {
    /// Sequence or Map
    pub fn is_collection(&self) -> bool {
        matches!(self, MemberClass::Sequence | MemberClass::Map)
    }
}

/// Declared type of a member
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Scalar(ScalarKind),
    Object(ShapeRef),
    Sequence {
        element: Box<TypeDescriptor>,
        kind: CollectionKind,
    },
    Map {
        key: Box<TypeDescriptor>,
        value: Box<TypeDescriptor>,
        kind: MapKind,
    },
    /// Two-slot key/value value, serialized as `[key, value]`
    Pair(Box<TypeDescriptor>, Box<TypeDescriptor>),
    /// The inner type, or absent
    Optional(Box<TypeDescriptor>),
}

impl TypeDescriptor {
    /// Descriptor of `T`
    pub fn of<T: Describe>() -> Self {
        T::describe()
    }

    pub fn sequence(element: TypeDescriptor, kind: CollectionKind) -> Self {
        TypeDescriptor::Sequence {
            element: Box::new(element),
            kind,
        }
    }

    pub fn map(key: TypeDescriptor, value: TypeDescriptor, kind: MapKind) -> Self {
        TypeDescriptor::Map {
            key: Box::new(key),
            value: Box::new(value),
            kind,
        }
    }

    pub fn pair(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        TypeDescriptor::Pair(Box::new(key), Box::new(value))
    }

    pub fn optional(inner: TypeDescriptor) -> Self {
        TypeDescriptor::Optional(Box::new(inner))
    }

    /// Whether absence is a valid value
    pub fn is_optional(&self) -> bool {
        matches!(self, TypeDescriptor::Optional(_))
    }

    /// The descriptor with every `Optional` layer removed
    pub fn strip_optional(&self) -> &TypeDescriptor {
        match self {
            TypeDescriptor::Optional(inner) => inner.strip_optional(),
            other => other,
        }
    }

    /// Classification of the (non-optional) type
    pub fn class(&self) -> MemberClass {
        match self {
            TypeDescriptor::Scalar(_) | TypeDescriptor::Pair(..) => MemberClass::Primitive,
            TypeDescriptor::Object(_) => MemberClass::NestedObject,
            TypeDescriptor::Sequence { .. } => MemberClass::Sequence,
            TypeDescriptor::Map { .. } => MemberClass::Map,
            TypeDescriptor::Optional(inner) => inner.class(),
        }
    }

    /// Scalar kind, if this is a (possibly optional) scalar
    pub fn as_scalar(&self) -> Option<ScalarKind> {
        match self.strip_optional() {
            TypeDescriptor::Scalar(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Nested object, sequence or map
    pub fn is_navigation(&self) -> bool {
        !matches!(self.class(), MemberClass::Primitive)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Scalar(kind) => write!(f, "{}", kind),
            TypeDescriptor::Object(shape) => write!(f, "{}", shape),
            TypeDescriptor::Sequence { element, kind } => write!(f, "{}<{}>", kind, element),
            TypeDescriptor::Map { key, value, .. } => write!(f, "Map<{}, {}>", key, value),
            TypeDescriptor::Pair(key, value) => write!(f, "({}, {})", key, value),
            TypeDescriptor::Optional(inner) => write!(f, "Option<{}>", inner),
        }
    }
}

/// One mappable member of a shape
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDescriptor {
    name: &'static str,
    ty: TypeDescriptor,
}

impl MemberDescriptor {
    /// Create a member; a raw identifier prefix (`r#`) is dropped
    pub fn new(name: &'static str, ty: TypeDescriptor) -> Self {
        let name = name.strip_prefix("r#").unwrap_or(name);
        Self { name, ty }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }

    pub fn class(&self) -> MemberClass {
        self.ty.class()
    }
}

/// A shape plus its ordered members
#[derive(Debug, Clone)]
pub struct ShapeDescriptor {
    shape: ShapeRef,
    members: Vec<MemberDescriptor>,
}

impl ShapeDescriptor {
    pub fn new(shape: ShapeRef, members: Vec<MemberDescriptor>) -> Self {
        Self { shape, members }
    }

    pub fn shape(&self) -> ShapeRef {
        self.shape
    }

    pub fn key(&self) -> TypeKey {
        self.shape.key()
    }

    pub fn name(&self) -> &'static str {
        self.shape.name()
    }

    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    /// Member by exact (case-sensitive) name
    pub fn member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.iter().find(|m| m.name == name)
    }
}
