//! Static classification of value types into wire shapes.
//!
//! Every encodable type maps to exactly one [`Shape`] through the [`Classify`]
//! trait. The shape is never written to the byte stream: producer and consumer
//! agree on it out of band, either by sharing the Rust type or by exchanging
//! the compact textual tag rendered by [`Shape::tag`].

use std::collections::{LinkedList, VecDeque};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Fixed-width integer categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegerKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl IntegerKind {
    /// Encoded width in bytes.
    pub const fn width(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 => 4,
            Self::I64 | Self::U64 => 8,
        }
    }

    pub const fn is_signed(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    const fn tag(self) -> char {
        match self {
            Self::I8 => 'b',
            Self::I16 => 's',
            Self::I32 => 'i',
            Self::I64 => 'l',
            Self::U8 => 'B',
            Self::U16 => 'S',
            Self::U32 => 'I',
            Self::U64 => 'L',
        }
    }
}

/// IEEE 754 floating point categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatKind {
    F32,
    F64,
}

impl FloatKind {
    /// Encoded width in bytes.
    pub const fn width(self) -> usize {
        match self {
            Self::F32 => 4,
            Self::F64 => 8,
        }
    }
}

/// Whether a sequence carries its element count on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeKind {
    /// Exactly `N` elements, no count prefix.
    Fixed(usize),
    /// A count prefix followed by that many elements.
    Variable,
}

/// The closed set of encoding categories.
///
/// # Examples
///
/// ```
/// use binlog_core::shape::{Classify, Shape};
///
/// assert_eq!(<Vec<[u16; 3]>>::shape().tag(), "[[3S");
/// assert_eq!(<(bool, String)>::shape().tag(), "(y[c)");
///
/// let parsed: Shape = "[[3S".parse().unwrap();
/// assert_eq!(parsed, <Vec<[u16; 3]>>::shape());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Shape {
    Bool,
    Integer(IntegerKind),
    Float(FloatKind),
    /// A byte sequence holding UTF-8 text.
    String,
    /// A homogeneous sequence.
    Sequence { element: Box<Shape>, size: SizeKind },
    /// An ordered tuple of heterogeneous fields, encoded back to back.
    Aggregate(Vec<Shape>),
}

impl Shape {
    pub fn sequence(element: Shape, size: SizeKind) -> Self {
        Self::Sequence {
            element: Box::new(element),
            size,
        }
    }

    /// Renders the compact textual tag of this shape.
    pub fn tag(&self) -> String {
        self.to_string()
    }

    /// Whether every value of this shape encodes to zero bytes, e.g. `()` or `[T; 0]`.
    pub fn is_zero_width(&self) -> bool {
        match self {
            Shape::Sequence {
                element,
                size: SizeKind::Fixed(n),
            } => *n == 0 || element.is_zero_width(),
            Shape::Aggregate(fields) => fields.iter().all(Shape::is_zero_width),
            _ => false,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Bool => f.write_str("y"),
            Shape::Integer(kind) => write!(f, "{}", kind.tag()),
            Shape::Float(FloatKind::F32) => f.write_str("f"),
            Shape::Float(FloatKind::F64) => f.write_str("d"),
            Shape::String => f.write_str("[c"),
            Shape::Sequence { element, size } => match size {
                SizeKind::Fixed(n) => write!(f, "[{}{}", n, element),
                SizeKind::Variable => write!(f, "[{}", element),
            },
            Shape::Aggregate(fields) => {
                f.write_str("(")?;
                for field in fields {
                    write!(f, "{}", field)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Deepest sequence or aggregate nesting a parsed tag may have.
pub const MAX_TAG_DEPTH: usize = 64;

/// Tags nested deeper than [`MAX_TAG_DEPTH`] fail with [`Error::InvalidTag`]
/// at the offset of the first opening bracket past the limit.
impl FromStr for Shape {
    type Err = Error;

    fn from_str(tag: &str) -> Result<Self> {
        let mut parser = TagParser { tag, pos: 0, depth: 0 };
        let shape = parser.shape()?;
        if parser.pos != tag.len() {
            return Err(parser.error());
        }
        Ok(shape)
    }
}

struct TagParser<'a> {
    tag: &'a str,
    pos: usize,
    depth: usize,
}

impl TagParser<'_> {
    fn peek(&self) -> Option<u8> {
        self.tag.as_bytes().get(self.pos).copied()
    }

    fn error(&self) -> Error {
        Error::InvalidTag {
            tag: self.tag.to_owned(),
            offset: self.pos,
        }
    }

    fn shape(&mut self) -> Result<Shape> {
        let Some(b) = self.peek() else {
            return Err(self.error());
        };

        let shape = match b {
            b'y' => Shape::Bool,
            b'b' => Shape::Integer(IntegerKind::I8),
            b's' => Shape::Integer(IntegerKind::I16),
            b'i' => Shape::Integer(IntegerKind::I32),
            b'l' => Shape::Integer(IntegerKind::I64),
            b'B' => Shape::Integer(IntegerKind::U8),
            b'S' => Shape::Integer(IntegerKind::U16),
            b'I' => Shape::Integer(IntegerKind::U32),
            b'L' => Shape::Integer(IntegerKind::U64),
            b'f' => Shape::Float(FloatKind::F32),
            b'd' => Shape::Float(FloatKind::F64),
            b'[' | b'(' if self.depth == MAX_TAG_DEPTH => return Err(self.error()),
            b'[' => return self.nested(Self::sequence),
            b'(' => return self.nested(Self::aggregate),
            _ => return Err(self.error()),
        };
        self.pos += 1;
        Ok(shape)
    }

    fn nested(&mut self, parse: fn(&mut Self) -> Result<Shape>) -> Result<Shape> {
        self.pos += 1;
        self.depth += 1;
        let shape = parse(self);
        self.depth -= 1;
        shape
    }

    fn sequence(&mut self) -> Result<Shape> {
        if self.peek() == Some(b'c') {
            self.pos += 1;
            return Ok(Shape::String);
        }

        let digits = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }

        let size = if self.pos == digits {
            SizeKind::Variable
        } else {
            let n = self.tag[digits..self.pos].parse().map_err(|_| Error::InvalidTag {
                tag: self.tag.to_owned(),
                offset: digits,
            })?;
            SizeKind::Fixed(n)
        };

        let element = self.shape()?;
        Ok(Shape::sequence(element, size))
    }

    fn aggregate(&mut self) -> Result<Shape> {
        let mut fields = Vec::new();
        loop {
            match self.peek() {
                Some(b')') => {
                    self.pos += 1;
                    return Ok(Shape::Aggregate(fields));
                }
                Some(_) => fields.push(self.shape()?),
                None => return Err(self.error()),
            }
        }
    }
}

/// Maps a type to its wire shape.
pub trait Classify {
    /// Whether every value encodes to zero bytes; mirrors [`Shape::is_zero_width`].
    const ZERO_WIDTH: bool = false;

    fn shape() -> Shape;
}

impl Classify for bool {
    fn shape() -> Shape {
        Shape::Bool
    }
}

macro_rules! classify_integer {
    ($($t:ty => $kind:ident),* $(,)?) => {
        $(
            impl Classify for $t {
                fn shape() -> Shape {
                    Shape::Integer(IntegerKind::$kind)
                }
            }
        )*
    };
}

classify_integer!(
    i8 => I8, i16 => I16, i32 => I32, i64 => I64,
    u8 => U8, u16 => U16, u32 => U32, u64 => U64,
);

impl Classify for f32 {
    fn shape() -> Shape {
        Shape::Float(FloatKind::F32)
    }
}

impl Classify for f64 {
    fn shape() -> Shape {
        Shape::Float(FloatKind::F64)
    }
}

impl Classify for str {
    fn shape() -> Shape {
        Shape::String
    }
}

impl Classify for String {
    fn shape() -> Shape {
        Shape::String
    }
}

impl<const N: usize> Classify for heapless::String<N> {
    fn shape() -> Shape {
        Shape::String
    }
}

impl<T: Classify, const N: usize> Classify for [T; N] {
    const ZERO_WIDTH: bool = N == 0 || T::ZERO_WIDTH;

    fn shape() -> Shape {
        Shape::sequence(T::shape(), SizeKind::Fixed(N))
    }
}

macro_rules! classify_variable_sequence {
    ($($container:ident),* $(,)?) => {
        $(
            impl<T: Classify> Classify for $container<T> {
                fn shape() -> Shape {
                    Shape::sequence(T::shape(), SizeKind::Variable)
                }
            }
        )*
    };
}

classify_variable_sequence!(Vec, VecDeque, LinkedList);

impl<T: Classify> Classify for [T] {
    fn shape() -> Shape {
        Shape::sequence(T::shape(), SizeKind::Variable)
    }
}

impl<T: Classify, const N: usize> Classify for heapless::Vec<T, N> {
    fn shape() -> Shape {
        Shape::sequence(T::shape(), SizeKind::Variable)
    }
}

impl<T: Classify + ?Sized> Classify for Box<T> {
    const ZERO_WIDTH: bool = T::ZERO_WIDTH;

    fn shape() -> Shape {
        T::shape()
    }
}

impl<T: Classify + ?Sized> Classify for &T {
    const ZERO_WIDTH: bool = T::ZERO_WIDTH;

    fn shape() -> Shape {
        T::shape()
    }
}

macro_rules! classify_tuple {
    ($($name:ident),*) => {
        impl<$($name: Classify),*> Classify for ($($name,)*) {
            const ZERO_WIDTH: bool = true $(&& $name::ZERO_WIDTH)*;

            fn shape() -> Shape {
                Shape::Aggregate(vec![$($name::shape()),*])
            }
        }
    };
}

classify_tuple!();
classify_tuple!(A);
classify_tuple!(A, B);
classify_tuple!(A, B, C);
classify_tuple!(A, B, C, D);
classify_tuple!(A, B, C, D, E);
classify_tuple!(A, B, C, D, E, F);
classify_tuple!(A, B, C, D, E, F, G);
classify_tuple!(A, B, C, D, E, F, G, H);
