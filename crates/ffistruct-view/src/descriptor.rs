//! Precomputed accessor tables.
//!
//! Compiling a schema walks the [`Field`] tree once and flattens every inline
//! record into a [`RecordDescriptor`] addressed by a small integer
//! [`RecordId`]. Each member carries its byte offset and an [`Accessor`]
//! telling the codec how to move values in and out of the buffer, so views
//! never look at the schema tree again.

use ffistruct_layout::helpers::stride;
use ffistruct_layout::{
    Field, FieldKind, Layout, LayoutComputer, LayoutError, LayoutResult, PackWidth, Primitive,
    Value,
};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::ops::Range;

/// Index of a record descriptor inside a [`Schema`].
pub type RecordId = usize;

/// How a slot is encoded.
#[derive(Debug, Clone, PartialEq)]
pub enum Accessor {
    Primitive(Primitive),
    /// Pointer-width slot holding a string address.
    String,
    /// Pointer-width slot holding an opaque address.
    Pointer,
    /// Inline array of `length` elements, `stride` bytes apart.
    Array {
        element: Box<Accessor>,
        element_default: Option<Value>,
        length: usize,
        stride: usize,
    },
    Record(RecordId),
}

impl Accessor {
    pub fn describe(&self) -> &'static str {
        match self {
            Accessor::Primitive(p) => p.name(),
            Accessor::String => "string",
            Accessor::Pointer => "pointer",
            Accessor::Array { .. } => "array",
            Accessor::Record(_) => "record",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MemberDescriptor {
    pub name: String,
    /// Offset relative to the start of the owning record.
    pub offset: usize,
    pub size: usize,
    pub accessor: Accessor,
    pub default: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct RecordDescriptor {
    pub is_union: bool,
    pub size: usize,
    pub align: usize,
    members: Box<[MemberDescriptor]>,
    index: FxHashMap<String, usize>,
    nested: Range<RecordId>,
}

impl RecordDescriptor {
    /// Ids of the records nested anywhere inside this one, itself excluded.
    /// Records are numbered children first, so a subtree is contiguous.
    pub fn nested(&self) -> Range<RecordId> {
        self.nested.clone()
    }

    pub fn member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.index.get(name).map(|&i| &self.members[i])
    }

    /// Members in declaration order.
    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }
}

/// A schema tree normalized for one pack width.
#[derive(Debug, Clone)]
pub struct Schema {
    records: Vec<RecordDescriptor>,
    root: Accessor,
    root_kind: &'static str,
    layout: Layout,
    pack: PackWidth,
}

impl Schema {
    /// Normalizes `field` into accessor tables for `pack`.
    pub fn compile(field: &Field, pack: PackWidth) -> LayoutResult<Schema> {
        let mut compiler = SchemaCompiler {
            computer: LayoutComputer::new(pack),
            records: Vec::new(),
        };
        let layout = compiler.computer.compute(field)?;
        let root = compiler.accessor_for(field)?;
        log::debug!(
            "Compiled {} schema: {} record(s), size {}, align {} (pack {})",
            field.kind_name(),
            compiler.records.len(),
            layout.size,
            layout.align,
            pack
        );
        Ok(Schema {
            records: compiler.records,
            root,
            root_kind: if field.force_pointer {
                "pointer"
            } else {
                field.kind_name()
            },
            layout,
            pack,
        })
    }

    /// Like [`Schema::compile`], but only accepts an inline struct or union.
    pub fn compile_record(field: &Field, pack: PackWidth) -> LayoutResult<Schema> {
        let schema = Schema::compile(field, pack)?;
        schema.root_record()?;
        Ok(schema)
    }

    pub fn root(&self) -> &Accessor {
        &self.root
    }

    pub fn root_record(&self) -> LayoutResult<RecordId> {
        match self.root {
            Accessor::Record(id) => Ok(id),
            _ => Err(LayoutError::NotARecord {
                kind: self.root_kind,
            }),
        }
    }

    pub fn record(&self, id: RecordId) -> &RecordDescriptor {
        &self.records[id]
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn size(&self) -> usize {
        self.layout.size
    }

    pub fn pack(&self) -> PackWidth {
        self.pack
    }
}

struct SchemaCompiler {
    computer: LayoutComputer,
    records: Vec<RecordDescriptor>,
}

impl SchemaCompiler {
    fn accessor_for(&mut self, field: &Field) -> LayoutResult<Accessor> {
        if field.force_pointer {
            return Ok(Accessor::Pointer);
        }
        let accessor = match &field.kind {
            FieldKind::Primitive(p) => Accessor::Primitive(*p),
            FieldKind::String => Accessor::String,
            FieldKind::Pointer | FieldKind::Array { length: None, .. } => Accessor::Pointer,
            FieldKind::Array {
                element,
                length: Some(length),
            } => {
                let element_layout = self.computer.compute(element)?;
                Accessor::Array {
                    element: Box::new(self.accessor_for(element)?),
                    element_default: element.default.clone(),
                    length: *length,
                    stride: stride(&element_layout, self.computer.pack())
                        .ok_or(LayoutError::SizeOverflow { kind: "array" })?,
                }
            }
            FieldKind::Record { members, is_union } => {
                Accessor::Record(self.compile_record(field, members, *is_union)?)
            }
        };
        Ok(accessor)
    }

    fn compile_record(
        &mut self,
        field: &Field,
        members: &IndexMap<String, Field>,
        is_union: bool,
    ) -> LayoutResult<RecordId> {
        let layout = self.computer.compute(field)?;
        let offsets = layout.fields.as_deref().unwrap_or_default();
        let first_nested = self.records.len();

        let mut descriptors = Vec::with_capacity(members.len());
        let mut index = FxHashMap::default();
        for (i, ((name, member), slot)) in members.iter().zip(offsets).enumerate() {
            descriptors.push(MemberDescriptor {
                name: name.clone(),
                offset: slot.offset,
                size: slot.size,
                accessor: self.accessor_for(member)?,
                default: member.default.clone(),
            });
            index.insert(name.clone(), i);
        }

        let id = self.records.len();
        self.records.push(RecordDescriptor {
            is_union,
            size: layout.size,
            align: layout.align,
            members: descriptors.into_boxed_slice(),
            index,
            nested: first_nested..id,
        });
        Ok(id)
    }
}
