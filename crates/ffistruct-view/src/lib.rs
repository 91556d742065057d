//! Live, name-addressed access to C-layout records held in a byte buffer.
//!
//! ```ignore
//! use ffistruct_view::*;
//!
//! configure(CodecConfig::from_fns(PackWidth::Eight, to_ptr, from_ptr));
//! let person = instantiate(&structure([("name", string()), ("age", u8())]))?;
//! person.set("age", 42u8)?;
//! native_call(person.as_ptr());
//! ```

pub mod descriptor;
mod encode;
pub mod error;
mod instance;
pub mod marshal;
mod view;

pub use descriptor::{Accessor, MemberDescriptor, RecordDescriptor, RecordId, Schema};
pub use error::{ViewError, ViewResult};
pub use instance::{instantiate, instantiate_with, Instance};
pub use marshal::{decode, default_value, encode};
pub use view::{Entry, StructView};

pub use ffistruct_layout::{
    array, bool, compute_layout, configure, current, dynamic_array, f32, f64, i16, i32, i64, i8,
    opaque, pointer, size_of, size_of_with, string, structure, u16, u32, u64, u8, union,
    CodecConfig, Field, FieldKind, FnCodec, Layout, LayoutError, PackWidth, Primitive,
    StringCodec, Value,
};
