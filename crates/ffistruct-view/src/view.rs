//! Name-addressed read/write access to a record inside an instance buffer.

use crate::descriptor::{Accessor, RecordDescriptor, RecordId, Schema};
use crate::encode::Marshal;
use crate::error::{ViewError, ViewResult};
use ffistruct_layout::{CodecConfig, Value};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::ops::RangeBounds;
use std::rc::{Rc, Weak};
use std::sync::Arc;

/// Everything an instance's views share: the buffer, the accessor tables,
/// the codec and the sub-view cache.
pub(crate) struct InstanceState {
    pub(crate) schema: Arc<Schema>,
    pub(crate) codec: CodecConfig,
    pub(crate) buffer: RefCell<Box<[u8]>>,
    /// Sub-views by (record id, absolute offset). Weak so that cached views
    /// do not keep their own instance alive.
    views: RefCell<FxHashMap<(RecordId, usize), Weak<StructView>>>,
}

impl InstanceState {
    pub(crate) fn new(schema: Arc<Schema>, codec: CodecConfig) -> Self {
        let buffer = vec![0u8; schema.size()].into_boxed_slice();
        InstanceState {
            schema,
            codec,
            buffer: RefCell::new(buffer),
            views: RefCell::new(FxHashMap::default()),
        }
    }

    fn marshal(&self) -> Marshal<'_> {
        Marshal {
            schema: &self.schema,
            codec: &self.codec,
        }
    }

    /// Drops cached sub-views of the records in `records` that start inside
    /// `[start, start + len)`.
    pub(crate) fn evict(&self, records: impl RangeBounds<RecordId>, start: usize, len: usize) {
        let mut views = self.views.borrow_mut();
        let before = views.len();
        views.retain(|&(record, base), _| {
            !records.contains(&record) || base < start || base >= start + len
        });
        if views.len() != before {
            log::trace!(
                "Evicted {} cached sub-view(s) in [{}, {})",
                before - views.len(),
                start,
                start + len
            );
        }
    }
}

/// Result of reading a field: a decoded value, or a live view for an inline
/// struct or union.
#[derive(Debug, Clone)]
pub enum Entry {
    Value(Value),
    View(Rc<StructView>),
}

impl Entry {
    pub fn into_value(self) -> Option<Value> {
        match self {
            Entry::Value(value) => Some(value),
            Entry::View(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Entry::Value(value) => Some(value),
            Entry::View(_) => None,
        }
    }

    pub fn into_view(self) -> Option<Rc<StructView>> {
        match self {
            Entry::View(view) => Some(view),
            Entry::Value(_) => None,
        }
    }
}

/// A live accessor over one struct or union inside an instance buffer.
///
/// Reads decode straight from the buffer and writes encode straight into it;
/// a view holds no copy of the data. Views of nested records are cached per
/// instance, so reading the same nested field twice returns the same `Rc`
/// until a bulk write replaces that record.
pub struct StructView {
    state: Rc<InstanceState>,
    record: RecordId,
    base: usize,
}

impl StructView {
    pub(crate) fn root(state: Rc<InstanceState>, record: RecordId) -> Self {
        StructView {
            state,
            record,
            base: 0,
        }
    }

    fn descriptor(&self) -> &RecordDescriptor {
        self.state.schema.record(self.record)
    }

    fn sub_view(&self, record: RecordId, base: usize) -> Rc<StructView> {
        let key = (record, base);
        let mut views = self.state.views.borrow_mut();
        if let Some(view) = views.get(&key).and_then(Weak::upgrade) {
            return view;
        }
        let view = Rc::new(StructView {
            state: Rc::clone(&self.state),
            record,
            base,
        });
        views.insert(key, Rc::downgrade(&view));
        view
    }

    /// Reads field `name`.
    ///
    /// Scalars, strings and pointers decode to a [`Value`]; an inline struct
    /// or union yields its (cached) sub-view.
    pub fn get(&self, name: &str) -> ViewResult<Entry> {
        let member = self
            .descriptor()
            .member(name)
            .ok_or_else(|| ViewError::UnknownField {
                name: name.to_string(),
            })?;
        let offset = self.base + member.offset;
        match member.accessor {
            Accessor::Record(id) => Ok(Entry::View(self.sub_view(id, offset))),
            ref accessor => {
                let buffer = self.state.buffer.borrow();
                Ok(Entry::Value(self.state.marshal().read(&buffer, offset, accessor)))
            }
        }
    }

    /// Reads field `name` as a plain value, expanding nested records.
    pub fn get_value(&self, name: &str) -> ViewResult<Value> {
        match self.get(name)? {
            Entry::Value(value) => Ok(value),
            Entry::View(view) => Ok(view.snapshot()),
        }
    }

    /// Returns the sub-view of the inline record field `name`.
    pub fn view(&self, name: &str) -> ViewResult<Rc<StructView>> {
        self.get(name)?.into_view().ok_or_else(|| ViewError::NotARecordField {
            name: name.to_string(),
        })
    }

    /// Writes `value` into field `name`.
    ///
    /// Writing a record value to a nested struct or union replaces the whole
    /// region and discards its cached sub-view.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> ViewResult<()> {
        let value = value.into();
        let member = self
            .descriptor()
            .member(name)
            .ok_or_else(|| ViewError::UnknownField {
                name: name.to_string(),
            })?;
        let offset = self.base + member.offset;
        {
            let mut buffer = self.state.buffer.borrow_mut();
            self.state
                .marshal()
                .write(&mut buffer, offset, &member.accessor, &value, &member.name)?;
        }
        if let Accessor::Record(id) = member.accessor {
            // The written record and everything nested in it. Enclosing
            // records starting at the same offset keep their views.
            let nested = self.state.schema.record(id).nested();
            self.state.evict(nested.start..=id, offset, member.size);
        }
        Ok(())
    }

    /// Replaces this whole record with `value`, as `set` does for a nested
    /// record field. Views nested inside it are evicted; this view stays
    /// valid.
    pub fn assign(&self, value: impl Into<Value>) -> ViewResult<()> {
        let value = value.into();
        {
            let mut buffer = self.state.buffer.borrow_mut();
            self.state.marshal().write(
                &mut buffer,
                self.base,
                &Accessor::Record(self.record),
                &value,
                "<record>",
            )?;
        }
        let nested = self.descriptor().nested();
        self.state.evict(nested, self.base, self.size());
        Ok(())
    }

    /// Decodes the whole record into a plain [`Value::Record`].
    pub fn snapshot(&self) -> Value {
        let buffer = self.state.buffer.borrow();
        self.state
            .marshal()
            .read(&buffer, self.base, &Accessor::Record(self.record))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.descriptor().contains(name)
    }

    /// Field names in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.descriptor().members().iter().map(|m| m.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.descriptor().members().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_union(&self) -> bool {
        self.descriptor().is_union
    }

    /// Absolute offset of this record inside the instance buffer.
    pub fn offset(&self) -> usize {
        self.base
    }

    pub fn size(&self) -> usize {
        self.descriptor().size
    }
}

impl fmt::Debug for StructView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructView")
            .field("record", &self.record)
            .field("offset", &self.base)
            .field("size", &self.size())
            .finish()
    }
}
