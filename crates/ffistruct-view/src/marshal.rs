//! Whole-value marshaling without a live instance.

use crate::descriptor::Schema;
use crate::encode::Marshal;
use crate::error::{ViewError, ViewResult};
use ffistruct_layout::{CodecConfig, Field, FieldKind, Value};

/// The value a freshly prepared object of `field` carries.
///
/// A declared default wins. Otherwise pointer-width fields start at a null
/// address, strings empty, numbers at zero and bools false; fixed arrays and
/// records are filled element by element.
pub fn default_value(field: &Field) -> Value {
    if let Some(default) = &field.default {
        return default.clone();
    }
    if field.force_pointer {
        return Value::Pointer(0);
    }
    match &field.kind {
        FieldKind::Primitive(p) => p.zero(),
        FieldKind::String => Value::Str(String::new()),
        FieldKind::Pointer | FieldKind::Array { length: None, .. } => Value::Pointer(0),
        FieldKind::Array {
            element,
            length: Some(length),
        } => Value::Array((0..*length).map(|_| default_value(element)).collect()),
        FieldKind::Record { members, .. } => Value::Record(
            members
                .iter()
                .map(|(name, member)| (name.clone(), default_value(member)))
                .collect(),
        ),
    }
}

/// Encodes `value` as `field` into a new buffer of the field's size.
pub fn encode(field: &Field, value: &Value, codec: &CodecConfig) -> ViewResult<Vec<u8>> {
    let schema = Schema::compile(field, codec.pack)?;
    let mut buffer = vec![0u8; schema.size()];
    Marshal {
        schema: &schema,
        codec,
    }
    .write(&mut buffer, 0, schema.root(), value, "<root>")?;
    Ok(buffer)
}

/// Decodes `bytes` as `field`. The buffer must be exactly the field's size.
pub fn decode(field: &Field, bytes: &[u8], codec: &CodecConfig) -> ViewResult<Value> {
    let schema = Schema::compile(field, codec.pack)?;
    if bytes.len() != schema.size() {
        return Err(ViewError::BufferSize {
            expected: schema.size(),
            found: bytes.len(),
        });
    }
    Ok(Marshal {
        schema: &schema,
        codec,
    }
    .read(bytes, 0, schema.root()))
}
