//! Shape-driven decoding for consumers that do not know the Rust type.
//!
//! A log consumer typically learns the shape of a payload as a tag string
//! rather than as a compile-time type. [`visit`] walks the byte stream under
//! such a [`Shape`] and rebuilds a [`Value`] tree, consuming exactly the bytes
//! the typed decoder would have consumed.
//!
//! # Examples
//!
//! ```
//! use binlog_core::visit::{visit_tag, Value};
//!
//! let bytes = binlog_core::to_bytes(&(7u8, vec![true, false], "hi")).unwrap();
//! let value = visit_tag("(B[y[c)", &mut bytes.as_slice()).unwrap();
//!
//! assert_eq!(value.to_string(), "(7, [true, false], hi)");
//! ```

use std::fmt;

use crate::deserialize::{
    check_zero_width_count, read_packed_bools, read_size_prefix, Deserialize, MAX_PREALLOCATION,
};
use crate::error::{Error, Result};
use crate::serialize::{write_size_prefix, Serialize};
use crate::shape::{FloatKind, IntegerKind, Shape, SizeKind};
use crate::stream::{InputStream, OutputStream};

/// A decoded value whose type is only known at run time.
///
/// Integers are widened to 64 bits and `f32` to `f64`; the shape the value was
/// read under keeps the original width.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),

    /// Any signed integer width
    Signed(i64),

    /// Any unsigned integer width
    Unsigned(u64),

    Float(f64),

    String(String),

    /// Fixed or variable sequence
    Sequence(Vec<Value>),

    /// Tuple fields in order
    Aggregate(Vec<Value>),
}

impl Value {
    fn as_i128(&self) -> Option<i128> {
        match self {
            Value::Signed(v) => Some(i128::from(*v)),
            Value::Unsigned(v) => Some(i128::from(*v)),
            _ => None,
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, open: &str, values: &[Value], close: &str) -> fmt::Result {
    f.write_str(open)?;
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", value)?;
    }
    f.write_str(close)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Signed(i) => write!(f, "{}", i),
            Value::Unsigned(u) => write!(f, "{}", u),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "{}", s),
            Value::Sequence(items) => write_joined(f, "[", items, "]"),
            Value::Aggregate(fields) => write_joined(f, "(", fields, ")"),
        }
    }
}

/// Decodes one value of the given shape.
pub fn visit<I: InputStream + ?Sized>(shape: &Shape, istream: &mut I) -> Result<Value> {
    match shape {
        Shape::Bool => bool::deserialize(istream).map(Value::Bool),
        Shape::Integer(kind) => visit_integer(*kind, istream),
        Shape::Float(FloatKind::F32) => f32::deserialize(istream).map(|v| Value::Float(f64::from(v))),
        Shape::Float(FloatKind::F64) => f64::deserialize(istream).map(Value::Float),
        Shape::String => String::deserialize(istream).map(Value::String),
        Shape::Sequence { element, size } => {
            let count = match size {
                SizeKind::Fixed(n) => *n,
                SizeKind::Variable => read_size_prefix(istream)?,
            };
            check_zero_width_count(element.is_zero_width(), count)?;

            let mut items = Vec::with_capacity(count.min(MAX_PREALLOCATION));
            if **element == Shape::Bool {
                read_packed_bools(count, istream, |b| items.push(Value::Bool(b)))?;
            } else {
                for _ in 0..count {
                    items.push(visit(element, istream)?);
                }
            }
            Ok(Value::Sequence(items))
        }
        Shape::Aggregate(fields) => fields
            .iter()
            .map(|field| visit(field, istream))
            .collect::<Result<Vec<_>>>()
            .map(Value::Aggregate),
    }
}

/// Parses `tag` and decodes one value of that shape.
pub fn visit_tag<I: InputStream + ?Sized>(tag: &str, istream: &mut I) -> Result<Value> {
    let shape: Shape = tag.parse()?;
    visit(&shape, istream)
}

fn visit_integer<I: InputStream + ?Sized>(kind: IntegerKind, istream: &mut I) -> Result<Value> {
    Ok(match kind {
        IntegerKind::I8 => Value::Signed(i8::deserialize(istream)?.into()),
        IntegerKind::I16 => Value::Signed(i16::deserialize(istream)?.into()),
        IntegerKind::I32 => Value::Signed(i32::deserialize(istream)?.into()),
        IntegerKind::I64 => Value::Signed(i64::deserialize(istream)?),
        IntegerKind::U8 => Value::Unsigned(u8::deserialize(istream)?.into()),
        IntegerKind::U16 => Value::Unsigned(u16::deserialize(istream)?.into()),
        IntegerKind::U32 => Value::Unsigned(u32::deserialize(istream)?.into()),
        IntegerKind::U64 => Value::Unsigned(u64::deserialize(istream)?),
    })
}

fn mismatch(shape: &Shape, value: &Value) -> Error {
    Error::ShapeMismatch {
        shape: shape.tag(),
        value: value.to_string(),
    }
}

/// Encodes a dynamic value under `shape`, producing the bytes the typed encoder would.
///
/// Integers must fit the width of the shape. A sequence encoded under a fixed
/// size `N` must hold exactly `N` items, or [`Error::SizeMismatch`] is returned.
pub fn encode_value<O: OutputStream + ?Sized>(shape: &Shape, value: &Value, ostream: &mut O) -> Result<()> {
    match (shape, value) {
        (Shape::Bool, Value::Bool(b)) => b.serialize(ostream),
        (Shape::Integer(kind), Value::Signed(_) | Value::Unsigned(_)) => {
            encode_integer(*kind, value, ostream).ok_or_else(|| mismatch(shape, value))?
        }
        (Shape::Float(FloatKind::F32), Value::Float(v)) => (*v as f32).serialize(ostream),
        (Shape::Float(FloatKind::F64), Value::Float(v)) => v.serialize(ostream),
        (Shape::String, Value::String(s)) => s.serialize(ostream),
        (Shape::Sequence { element, size }, Value::Sequence(items)) => {
            match size {
                SizeKind::Fixed(n) if *n != items.len() => {
                    return Err(Error::SizeMismatch {
                        expected: *n,
                        actual: items.len(),
                    })
                }
                SizeKind::Fixed(_) => {}
                SizeKind::Variable => write_size_prefix(items.len(), ostream)?,
            }

            if **element == Shape::Bool {
                let bits = items
                    .iter()
                    .map(|item| match item {
                        Value::Bool(b) => Ok(*b),
                        other => Err(mismatch(element, other)),
                    })
                    .collect::<Result<Vec<bool>>>()?;
                bool::serialize_elements(&bits, ostream)
            } else {
                items.iter().try_for_each(|item| encode_value(element, item, ostream))
            }
        }
        (Shape::Aggregate(fields), Value::Aggregate(values)) => {
            if fields.len() != values.len() {
                return Err(Error::SizeMismatch {
                    expected: fields.len(),
                    actual: values.len(),
                });
            }
            fields
                .iter()
                .zip(values)
                .try_for_each(|(field, value)| encode_value(field, value, ostream))
        }
        (shape, value) => Err(mismatch(shape, value)),
    }
}

/// Returns `None` when the value does not fit the integer kind.
fn encode_integer<O: OutputStream + ?Sized>(kind: IntegerKind, value: &Value, ostream: &mut O) -> Option<Result<()>> {
    let wide = value.as_i128()?;
    Some(match kind {
        IntegerKind::I8 => i8::try_from(wide).ok()?.serialize(ostream),
        IntegerKind::I16 => i16::try_from(wide).ok()?.serialize(ostream),
        IntegerKind::I32 => i32::try_from(wide).ok()?.serialize(ostream),
        IntegerKind::I64 => i64::try_from(wide).ok()?.serialize(ostream),
        IntegerKind::U8 => u8::try_from(wide).ok()?.serialize(ostream),
        IntegerKind::U16 => u16::try_from(wide).ok()?.serialize(ostream),
        IntegerKind::U32 => u32::try_from(wide).ok()?.serialize(ostream),
        IntegerKind::U64 => u64::try_from(wide).ok()?.serialize(ostream),
    })
}
