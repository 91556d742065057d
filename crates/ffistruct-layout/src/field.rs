//! Declarative description of a memory layout.
//!
//! A [`Field`] is one node of a schema tree: a primitive, a string pointer,
//! an opaque pointer, an array, or a record (struct or union) whose members
//! are kept in declaration order.

use crate::value::Value;
use indexmap::IndexMap;
use std::fmt;

/// Fixed-size scalar kinds. Natural size equals natural alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Bool,
}

impl Primitive {
    /// Size in bytes, which is also the natural alignment.
    pub const fn size(self) -> usize {
        match self {
            Primitive::U8 | Primitive::I8 | Primitive::Bool => 1,
            Primitive::U16 | Primitive::I16 => 2,
            Primitive::U32 | Primitive::I32 | Primitive::F32 => 4,
            Primitive::U64 | Primitive::I64 | Primitive::F64 => 8,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Primitive::U8 => "u8",
            Primitive::U16 => "u16",
            Primitive::U32 => "u32",
            Primitive::U64 => "u64",
            Primitive::I8 => "i8",
            Primitive::I16 => "i16",
            Primitive::I32 => "i32",
            Primitive::I64 => "i64",
            Primitive::F32 => "f32",
            Primitive::F64 => "f64",
            Primitive::Bool => "bool",
        }
    }

    /// The value an all-zero slot of this kind decodes to.
    pub fn zero(self) -> Value {
        match self {
            Primitive::U8 | Primitive::U16 | Primitive::U32 | Primitive::U64 => Value::UInt(0),
            Primitive::I8 | Primitive::I16 | Primitive::I32 | Primitive::I64 => Value::Int(0),
            Primitive::F32 | Primitive::F64 => Value::Float(0.0),
            Primitive::Bool => Value::Bool(false),
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The shape of a schema node.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Primitive(Primitive),
    /// Pointer to a NUL-terminated string; the host sees text.
    String,
    /// Untyped address; the host sees the integer.
    Pointer,
    /// `length: None` is a dynamic array, stored as a pointer.
    Array {
        element: Box<Field>,
        length: Option<usize>,
    },
    Record {
        members: IndexMap<String, Field>,
        is_union: bool,
    },
}

/// One node of a schema tree plus its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub kind: FieldKind,
    /// Store the field as a pointer instead of inlining it.
    pub force_pointer: bool,
    /// Value used when a bulk write leaves this field out.
    pub default: Option<Value>,
}

impl Field {
    pub fn new(kind: FieldKind) -> Self {
        Field {
            kind,
            force_pointer: false,
            default: None,
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// True when the field occupies pointer-width storage.
    pub fn is_pointer_like(&self) -> bool {
        self.force_pointer
            || matches!(
                self.kind,
                FieldKind::String | FieldKind::Pointer | FieldKind::Array { length: None, .. }
            )
    }

    /// Returns the inline record shape, if this field is one.
    ///
    /// A pointer-flagged record is an address, not an inline record.
    pub fn as_record(&self) -> Option<(&IndexMap<String, Field>, bool)> {
        match &self.kind {
            FieldKind::Record { members, is_union } if !self.force_pointer => {
                Some((members, *is_union))
            }
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            FieldKind::Primitive(p) => p.name(),
            FieldKind::String => "string",
            FieldKind::Pointer => "pointer",
            FieldKind::Array { .. } => "array",
            FieldKind::Record { is_union: true, .. } => "union",
            FieldKind::Record { is_union: false, .. } => "struct",
        }
    }
}

impl From<Primitive> for Field {
    fn from(p: Primitive) -> Self {
        Field::new(FieldKind::Primitive(p))
    }
}

pub fn u8() -> Field {
    Primitive::U8.into()
}

pub fn u16() -> Field {
    Primitive::U16.into()
}

pub fn u32() -> Field {
    Primitive::U32.into()
}

pub fn u64() -> Field {
    Primitive::U64.into()
}

pub fn i8() -> Field {
    Primitive::I8.into()
}

pub fn i16() -> Field {
    Primitive::I16.into()
}

pub fn i32() -> Field {
    Primitive::I32.into()
}

pub fn i64() -> Field {
    Primitive::I64.into()
}

pub fn f32() -> Field {
    Primitive::F32.into()
}

pub fn f64() -> Field {
    Primitive::F64.into()
}

pub fn bool() -> Field {
    Primitive::Bool.into()
}

pub fn string() -> Field {
    Field::new(FieldKind::String)
}

/// An opaque `void*`.
pub fn opaque() -> Field {
    Field::new(FieldKind::Pointer)
}

/// "Pointer to `to`": keeps the pointee description but stores an address.
pub fn pointer(to: Field) -> Field {
    Field {
        force_pointer: true,
        ..to
    }
}

/// An array of `element`. `None` or `Some(0)` declares a dynamic array.
pub fn array(element: Field, length: Option<usize>) -> Field {
    Field::new(FieldKind::Array {
        element: Box::new(element),
        length: length.filter(|&n| n > 0),
    })
}

pub fn dynamic_array(element: Field) -> Field {
    array(element, None)
}

fn record<K, I>(members: I, is_union: bool) -> Field
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Field)>,
{
    Field::new(FieldKind::Record {
        members: members.into_iter().map(|(k, f)| (k.into(), f)).collect(),
        is_union,
    })
}

/// A C struct; members are laid out in iteration order.
pub fn structure<K, I>(members: I) -> Field
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Field)>,
{
    record(members, false)
}

/// A C union; every member starts at offset 0.
pub fn union<K, I>(members: I) -> Field
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Field)>,
{
    record(members, true)
}
