//! Byte-level encoding of slots.
//!
//! All multi-byte values are little-endian. Pointer-width slots hold an
//! unsigned integer as wide as the pack width: writes keep the low bytes,
//! reads zero-extend.

use crate::descriptor::{Accessor, Schema};
use crate::error::{ViewError, ViewResult};
use ffistruct_layout::{CodecConfig, Primitive, Value};
use indexmap::IndexMap;

pub(crate) fn read_uint(buf: &[u8], offset: usize, size: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes[..size].copy_from_slice(&buf[offset..offset + size]);
    u64::from_le_bytes(bytes)
}

pub(crate) fn write_uint(buf: &mut [u8], offset: usize, size: usize, raw: u64) {
    buf[offset..offset + size].copy_from_slice(&raw.to_le_bytes()[..size]);
}

fn sign_extend(raw: u64, size: usize) -> i64 {
    let shift = 64 - 8 * size as u32;
    ((raw << shift) as i64) >> shift
}

pub(crate) fn read_primitive(buf: &[u8], offset: usize, kind: Primitive) -> Value {
    let size = kind.size();
    match kind {
        Primitive::U8 | Primitive::U16 | Primitive::U32 | Primitive::U64 => {
            Value::UInt(read_uint(buf, offset, size))
        }
        Primitive::I8 | Primitive::I16 | Primitive::I32 | Primitive::I64 => {
            Value::Int(sign_extend(read_uint(buf, offset, size), size))
        }
        Primitive::F32 => Value::Float(f32::from_bits(read_uint(buf, offset, 4) as u32) as f64),
        Primitive::F64 => Value::Float(f64::from_bits(read_uint(buf, offset, 8))),
        Primitive::Bool => Value::Bool(buf[offset] != 0),
    }
}

/// Integer bits a numeric value stores as, using C conversion rules.
fn integer_bits(value: &Value) -> Option<u64> {
    match value {
        Value::Null => Some(0),
        Value::Float(f) => Some(*f as i64 as u64),
        other => other.as_u64(),
    }
}

/// Address held by a value stored into a pointer-width slot.
fn address_bits(value: &Value) -> Option<u64> {
    match value {
        Value::Null => Some(0),
        Value::Pointer(_) | Value::UInt(_) | Value::Int(_) => value.as_u64(),
        Value::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64 as u64),
        _ => None,
    }
}

fn float_value(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        other => other.as_f64(),
    }
}

fn bool_value(value: &Value) -> Option<bool> {
    match value {
        Value::Null => Some(false),
        Value::Float(f) => Some(*f != 0.0),
        other => other.as_u64().map(|raw| raw != 0),
    }
}

/// Encodes `value` into a primitive slot. Returns `false` when the value
/// has no numeric interpretation.
pub(crate) fn write_primitive(buf: &mut [u8], offset: usize, kind: Primitive, value: &Value) -> bool {
    match kind {
        Primitive::F32 => match float_value(value) {
            Some(f) => write_uint(buf, offset, 4, (f as f32).to_bits() as u64),
            None => return false,
        },
        Primitive::F64 => match float_value(value) {
            Some(f) => write_uint(buf, offset, 8, f.to_bits()),
            None => return false,
        },
        Primitive::Bool => match bool_value(value) {
            Some(b) => buf[offset] = b as u8,
            None => return false,
        },
        _ => match integer_bits(value) {
            Some(raw) => write_uint(buf, offset, kind.size(), raw),
            None => return false,
        },
    }
    true
}

/// Moves whole values between a buffer and the slots a [`Schema`] describes.
pub(crate) struct Marshal<'a> {
    pub schema: &'a Schema,
    pub codec: &'a CodecConfig,
}

impl<'a> Marshal<'a> {
    fn pointer_width(&self) -> usize {
        self.schema.pack().bytes()
    }

    fn mismatch(field: &str, accessor: &Accessor, value: &Value) -> ViewError {
        ViewError::TypeMismatch {
            field: field.to_string(),
            expected: accessor.describe(),
            found: value.kind_name(),
        }
    }

    /// Decodes the slot at `offset`.
    pub fn read(&self, buf: &[u8], offset: usize, accessor: &Accessor) -> Value {
        match accessor {
            Accessor::Primitive(kind) => read_primitive(buf, offset, *kind),
            Accessor::String => {
                let pointer = read_uint(buf, offset, self.pointer_width());
                Value::Str(self.codec.pointer_to_string(pointer))
            }
            Accessor::Pointer => Value::Pointer(read_uint(buf, offset, self.pointer_width())),
            Accessor::Array {
                element,
                length,
                stride,
                ..
            } => Value::Array(
                (0..*length)
                    .map(|i| self.read(buf, offset + i * stride, element))
                    .collect(),
            ),
            Accessor::Record(id) => {
                let record = self.schema.record(*id);
                let members: IndexMap<String, Value> = record
                    .members()
                    .iter()
                    .map(|m| (m.name.clone(), self.read(buf, offset + m.offset, &m.accessor)))
                    .collect();
                Value::Record(members)
            }
        }
    }

    /// Encodes `value` into the slot at `offset`.
    ///
    /// Arrays and records are bulk writes: the whole region is zeroed first,
    /// then every element or struct member is written. Ones `value` leaves
    /// out take their declared default, or are written as `Null` so that
    /// defaults declared further down still apply. Union members are written
    /// only when given. `field` names the slot in error messages.
    pub fn write(
        &self,
        buf: &mut [u8],
        offset: usize,
        accessor: &Accessor,
        value: &Value,
        field: &str,
    ) -> ViewResult<()> {
        match accessor {
            Accessor::Primitive(kind) => {
                if !write_primitive(buf, offset, *kind, value) {
                    return Err(Self::mismatch(field, accessor, value));
                }
            }
            Accessor::String => {
                let pointer = match value {
                    Value::Str(text) => self.codec.string_to_pointer(text),
                    // An address the caller already owns.
                    other => address_bits(other)
                        .ok_or_else(|| Self::mismatch(field, accessor, value))?,
                };
                write_uint(buf, offset, self.pointer_width(), pointer);
            }
            Accessor::Pointer => {
                let pointer =
                    address_bits(value).ok_or_else(|| Self::mismatch(field, accessor, value))?;
                write_uint(buf, offset, self.pointer_width(), pointer);
            }
            Accessor::Array {
                element,
                element_default,
                length,
                stride,
            } => {
                let items: &[Value] = match value {
                    Value::Array(items) => items.as_slice(),
                    Value::Null => &[],
                    _ => return Err(Self::mismatch(field, accessor, value)),
                };
                buf[offset..offset + length * stride].fill(0);
                for i in 0..*length {
                    let item = items
                        .get(i)
                        .or(element_default.as_ref())
                        .unwrap_or(&Value::Null);
                    self.write(buf, offset + i * stride, element, item, field)?;
                }
            }
            Accessor::Record(id) => {
                let record = self.schema.record(*id);
                let provided = match value {
                    Value::Record(members) => Some(members),
                    Value::Null => None,
                    _ => return Err(Self::mismatch(field, accessor, value)),
                };
                buf[offset..offset + record.size].fill(0);
                log::trace!("Bulk write of {} bytes at offset {} ({})", record.size, offset, field);
                for member in record.members() {
                    let given = provided.and_then(|members| members.get(&member.name));
                    // Union members overlay each other, so only the ones the
                    // caller named are written.
                    let item = if record.is_union {
                        given
                    } else {
                        Some(given.or(member.default.as_ref()).unwrap_or(&Value::Null))
                    };
                    if let Some(item) = item {
                        self.write(buf, offset + member.offset, &member.accessor, item, &member.name)?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_integers() {
        let mut buf = [0u8; 8];
        assert!(write_primitive(&mut buf, 0, Primitive::U32, &Value::UInt(0x1234_5678)));
        assert_eq!(buf[..4], [0x78, 0x56, 0x34, 0x12]);
        assert_eq!(read_primitive(&buf, 0, Primitive::U32), Value::UInt(0x1234_5678));
        assert_eq!(read_primitive(&buf, 0, Primitive::U16), Value::UInt(0x5678));
    }

    #[test]
    fn test_signed_values_sign_extend() {
        let mut buf = [0u8; 8];
        assert!(write_primitive(&mut buf, 0, Primitive::I16, &Value::Int(-2)));
        assert_eq!(buf[..2], [0xfe, 0xff]);
        assert_eq!(read_primitive(&buf, 0, Primitive::I16), Value::Int(-2));
        assert!(write_primitive(&mut buf, 0, Primitive::I64, &Value::Int(i64::MIN)));
        assert_eq!(read_primitive(&buf, 0, Primitive::I64), Value::Int(i64::MIN));
    }

    #[test]
    fn test_integer_stores_wrap_like_c() {
        let mut buf = [0u8; 2];
        assert!(write_primitive(&mut buf, 0, Primitive::U8, &Value::UInt(300)));
        assert_eq!(read_primitive(&buf, 0, Primitive::U8), Value::UInt(44));
        assert!(write_primitive(&mut buf, 0, Primitive::U8, &Value::Float(7.9)));
        assert_eq!(read_primitive(&buf, 0, Primitive::U8), Value::UInt(7));
        assert!(write_primitive(&mut buf, 0, Primitive::U16, &Value::Null));
        assert_eq!(buf, [0, 0]);
    }

    #[test]
    fn test_floats_and_bools() {
        let mut buf = [0u8; 8];
        assert!(write_primitive(&mut buf, 0, Primitive::F32, &Value::Float(1.5)));
        assert_eq!(read_primitive(&buf, 0, Primitive::F32), Value::Float(1.5));
        assert!(write_primitive(&mut buf, 0, Primitive::F64, &Value::Int(-3)));
        assert_eq!(read_primitive(&buf, 0, Primitive::F64), Value::Float(-3.0));

        buf[0] = 0x80;
        assert_eq!(read_primitive(&buf, 0, Primitive::Bool), Value::Bool(true));
        assert!(write_primitive(&mut buf, 0, Primitive::Bool, &Value::Bool(true)));
        assert_eq!(buf[0], 1);
        assert!(write_primitive(&mut buf, 0, Primitive::Bool, &Value::Null));
        assert_eq!(buf[0], 0);
    }

    #[test]
    fn test_text_does_not_fit_numbers() {
        let mut buf = [0u8; 4];
        assert!(!write_primitive(&mut buf, 0, Primitive::U32, &Value::from("12")));
        assert!(!write_primitive(&mut buf, 0, Primitive::F32, &Value::Array(vec![])));
        assert_eq!(buf, [0; 4]);
    }

    #[test]
    fn test_pointer_width_truncates_and_zero_extends() {
        let mut buf = [0xaau8; 8];
        write_uint(&mut buf, 0, 4, 0x1_2345_6789);
        assert_eq!(buf, [0x89, 0x67, 0x45, 0x23, 0xaa, 0xaa, 0xaa, 0xaa]);
        assert_eq!(read_uint(&buf, 0, 4), 0x2345_6789);
    }

    #[test]
    fn test_addresses_accept_integral_numbers() {
        assert_eq!(address_bits(&Value::Pointer(0x1fff)), Some(0x1fff));
        assert_eq!(address_bits(&Value::Float(8191.0)), Some(0x1fff));
        assert_eq!(address_bits(&Value::Null), Some(0));
        assert_eq!(address_bits(&Value::Float(1.5)), None);
        assert_eq!(address_bits(&Value::Float(f64::NAN)), None);
        assert_eq!(address_bits(&Value::Bool(true)), None);
    }
}
