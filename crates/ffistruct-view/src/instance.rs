use crate::descriptor::Schema;
use crate::error::{ViewError, ViewResult};
use crate::view::{InstanceState, StructView};
use ffistruct_layout::{current, CodecConfig, Field, Layout};
use std::cell::{Ref, RefMut};
use std::ops::Deref;
use std::rc::Rc;
use std::sync::Arc;

/// One zero-initialized buffer laid out for a struct or union, plus the view
/// bound to it.
///
/// The buffer never changes size. Its address is stable for the lifetime of
/// the instance, so callers may hand [`Instance::as_mut_ptr`] to native code
/// as long as the instance outlives the call.
pub struct Instance {
    state: Rc<InstanceState>,
    root: Rc<StructView>,
}

impl Instance {
    /// Allocates a buffer for `schema`, whose root must be a record.
    pub fn new(schema: Arc<Schema>, codec: CodecConfig) -> ViewResult<Self> {
        let record = schema.root_record()?;
        log::debug!(
            "Instantiating record of {} bytes (align {})",
            schema.size(),
            schema.layout().align
        );
        let state = Rc::new(InstanceState::new(schema, codec));
        let root = Rc::new(StructView::root(Rc::clone(&state), record));
        Ok(Instance { state, root })
    }

    /// The top-level view. Always the same `Rc`.
    pub fn root(&self) -> Rc<StructView> {
        Rc::clone(&self.root)
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.state.schema
    }

    pub fn codec(&self) -> &CodecConfig {
        &self.state.codec
    }

    pub fn layout(&self) -> &Layout {
        self.state.schema.layout()
    }

    pub fn align(&self) -> usize {
        self.layout().align
    }

    pub fn buffer(&self) -> Ref<'_, [u8]> {
        Ref::map(self.state.buffer.borrow(), |b| &**b)
    }

    /// Raw mutable access. Views read live bytes, so edits made here are
    /// visible through them immediately.
    pub fn buffer_mut(&self) -> RefMut<'_, [u8]> {
        RefMut::map(self.state.buffer.borrow_mut(), |b| &mut **b)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.buffer().to_vec()
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.state.buffer.borrow().as_ptr()
    }

    pub fn as_mut_ptr(&self) -> *mut u8 {
        self.state.buffer.borrow_mut().as_mut_ptr()
    }

    /// Overwrites the start of the buffer with `bytes`.
    pub fn copy_from(&self, bytes: &[u8]) -> ViewResult<()> {
        self.copy_from_at(bytes, 0)
    }

    /// Overwrites `bytes.len()` bytes starting at `start`.
    pub fn copy_from_at(&self, bytes: &[u8], start: usize) -> ViewResult<()> {
        let size = self.size();
        if start.checked_add(bytes.len()).map_or(true, |end| end > size) {
            return Err(ViewError::CopyOutOfBounds {
                start,
                len: bytes.len(),
                size,
            });
        }
        self.buffer_mut()[start..start + bytes.len()].copy_from_slice(bytes);
        self.state.evict(.., start, bytes.len());
        Ok(())
    }

    /// Copies up to `dest.len()` bytes starting at `start` into `dest`,
    /// returning how many were copied.
    pub fn copy_to(&self, dest: &mut [u8], start: usize) -> ViewResult<usize> {
        let size = self.size();
        if start > size {
            return Err(ViewError::CopyOutOfBounds {
                start,
                len: dest.len(),
                size,
            });
        }
        let len = dest.len().min(size - start);
        dest[..len].copy_from_slice(&self.buffer()[start..start + len]);
        Ok(len)
    }
}

impl Deref for Instance {
    type Target = StructView;

    fn deref(&self) -> &StructView {
        &self.root
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("size", &self.size())
            .field("align", &self.align())
            .field("bytes", &&*self.buffer())
            .finish()
    }
}

/// Allocates an instance of `field` using the configured default codec.
///
/// Fails with `NotConfigured` before `ffistruct_layout::configure` has run.
pub fn instantiate(field: &Field) -> ViewResult<Instance> {
    let codec = current()?;
    instantiate_with(field, &codec)
}

/// Allocates an instance of `field` using an explicit codec context.
pub fn instantiate_with(field: &Field, codec: &CodecConfig) -> ViewResult<Instance> {
    let schema = Schema::compile_record(field, codec.pack)?;
    Instance::new(Arc::new(schema), codec.clone())
}
