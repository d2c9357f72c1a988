//! Encoding values into a byte stream.
//!
//! Wire rules, by shape:
//!
//! * `Bool`, `Integer`, `Float`: raw fixed-width bytes in native byte order.
//! * `String` and variable sequences: a `u32` element count, then the elements.
//! * Fixed sequences `[T; N]`: the `N` elements only; the count is implied by the type.
//! * Sequences of `bool`: bits packed least significant first, `ceil(n / 8)` bytes,
//!   framed by the same count rule as any other sequence.
//! * Aggregates: fields back to back.

use std::collections::{LinkedList, VecDeque};

use crate::error::{Error, Result};
use crate::shape::Classify;
use crate::stream::OutputStream;

/// Type of the element count written in front of variable-size sequences.
pub type SizePrefix = u32;

/// Encoded width of [`SizePrefix`].
pub const SIZE_PREFIX_LEN: usize = std::mem::size_of::<SizePrefix>();

/// Bytes staged on the stack before handing packed or byte-sized elements to the stream.
pub(crate) const CHUNK_LEN: usize = 256;

/// A value that can be appended to an [`OutputStream`].
///
/// The element hooks exist so that sequences of `bool` and `u8` can use a denser
/// or faster path than one call per element. Containers always go through them.
pub trait Serialize: Classify {
    /// Appends the wire representation of `self` to `ostream`.
    fn serialize<O: OutputStream + ?Sized>(&self, ostream: &mut O) -> Result<()>;

    /// Exact number of bytes [`Serialize::serialize`] would append.
    fn serialized_size(&self) -> usize;

    #[doc(hidden)]
    fn serialize_elements<'a, I, O>(elements: I, ostream: &mut O) -> Result<()>
    where
        I: IntoIterator<Item = &'a Self>,
        O: OutputStream + ?Sized,
        Self: 'a,
    {
        for element in elements {
            element.serialize(ostream)?;
        }
        Ok(())
    }

    #[doc(hidden)]
    fn elements_serialized_size<'a, I>(elements: I) -> usize
    where
        I: IntoIterator<Item = &'a Self>,
        Self: 'a,
    {
        elements.into_iter().map(|element| element.serialized_size()).sum()
    }
}

/// Appends `value` to `ostream`.
pub fn serialize<T, O>(value: &T, ostream: &mut O) -> Result<()>
where
    T: Serialize + ?Sized,
    O: OutputStream + ?Sized,
{
    value.serialize(ostream)
}

/// Encodes `value` into a freshly allocated buffer.
///
/// # Examples
///
/// ```
/// let bytes = binlog_core::to_bytes(&vec![1u16, 2]).unwrap();
/// assert_eq!(bytes.len(), 4 + 2 * 2);
/// ```
pub fn to_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(value.serialized_size());
    value.serialize(&mut bytes)?;
    Ok(bytes)
}

pub(crate) fn write_size_prefix<O: OutputStream + ?Sized>(len: usize, ostream: &mut O) -> Result<()> {
    let prefix = SizePrefix::try_from(len).map_err(|_| Error::SequenceTooLong(len))?;
    ostream.write(&prefix.to_ne_bytes())
}

impl Serialize for bool {
    #[inline]
    fn serialize<O: OutputStream + ?Sized>(&self, ostream: &mut O) -> Result<()> {
        ostream.write(&[u8::from(*self)])
    }

    fn serialized_size(&self) -> usize {
        1
    }

    fn serialize_elements<'a, I, O>(elements: I, ostream: &mut O) -> Result<()>
    where
        I: IntoIterator<Item = &'a Self>,
        O: OutputStream + ?Sized,
    {
        let mut chunk = [0u8; CHUNK_LEN];
        let mut bits = 0usize;

        for &element in elements {
            if element {
                chunk[bits / 8] |= 1 << (bits % 8);
            }
            bits += 1;

            if bits == CHUNK_LEN * 8 {
                ostream.write(&chunk)?;
                chunk = [0u8; CHUNK_LEN];
                bits = 0;
            }
        }

        if bits > 0 {
            ostream.write(&chunk[..bits.div_ceil(8)])?;
        }
        Ok(())
    }

    fn elements_serialized_size<'a, I>(elements: I) -> usize
    where
        I: IntoIterator<Item = &'a Self>,
    {
        elements.into_iter().count().div_ceil(8)
    }
}

macro_rules! serialize_number {
    ($($t:ty),* $(,)?) => {
        $(
            impl Serialize for $t {
                #[inline]
                fn serialize<O: OutputStream + ?Sized>(&self, ostream: &mut O) -> Result<()> {
                    ostream.write(&self.to_ne_bytes())
                }

                fn serialized_size(&self) -> usize {
                    std::mem::size_of::<$t>()
                }

                fn elements_serialized_size<'a, I>(elements: I) -> usize
                where
                    I: IntoIterator<Item = &'a Self>,
                {
                    elements.into_iter().count() * std::mem::size_of::<$t>()
                }
            }
        )*
    };
}

serialize_number!(i8, i16, i32, i64, u16, u32, u64, f32, f64);

impl Serialize for u8 {
    #[inline]
    fn serialize<O: OutputStream + ?Sized>(&self, ostream: &mut O) -> Result<()> {
        ostream.write(&[*self])
    }

    fn serialized_size(&self) -> usize {
        1
    }

    fn serialize_elements<'a, I, O>(elements: I, ostream: &mut O) -> Result<()>
    where
        I: IntoIterator<Item = &'a Self>,
        O: OutputStream + ?Sized,
    {
        let mut chunk = [0u8; CHUNK_LEN];
        let mut len = 0;

        for &byte in elements {
            chunk[len] = byte;
            len += 1;
            if len == CHUNK_LEN {
                ostream.write(&chunk)?;
                len = 0;
            }
        }

        if len > 0 {
            ostream.write(&chunk[..len])?;
        }
        Ok(())
    }

    fn elements_serialized_size<'a, I>(elements: I) -> usize
    where
        I: IntoIterator<Item = &'a Self>,
    {
        elements.into_iter().count()
    }
}

impl Serialize for str {
    fn serialize<O: OutputStream + ?Sized>(&self, ostream: &mut O) -> Result<()> {
        write_size_prefix(self.len(), ostream)?;
        ostream.write(self.as_bytes())
    }

    fn serialized_size(&self) -> usize {
        SIZE_PREFIX_LEN + self.len()
    }
}

impl Serialize for String {
    fn serialize<O: OutputStream + ?Sized>(&self, ostream: &mut O) -> Result<()> {
        self.as_str().serialize(ostream)
    }

    fn serialized_size(&self) -> usize {
        self.as_str().serialized_size()
    }
}

impl<const N: usize> Serialize for heapless::String<N> {
    fn serialize<O: OutputStream + ?Sized>(&self, ostream: &mut O) -> Result<()> {
        self.as_str().serialize(ostream)
    }

    fn serialized_size(&self) -> usize {
        self.as_str().serialized_size()
    }
}

impl<T: Serialize, const N: usize> Serialize for [T; N] {
    fn serialize<O: OutputStream + ?Sized>(&self, ostream: &mut O) -> Result<()> {
        T::serialize_elements(self, ostream)
    }

    fn serialized_size(&self) -> usize {
        T::elements_serialized_size(self)
    }
}

impl<T: Serialize> Serialize for [T] {
    fn serialize<O: OutputStream + ?Sized>(&self, ostream: &mut O) -> Result<()> {
        write_size_prefix(self.len(), ostream)?;
        T::serialize_elements(self, ostream)
    }

    fn serialized_size(&self) -> usize {
        SIZE_PREFIX_LEN + T::elements_serialized_size(self)
    }
}

macro_rules! serialize_variable_sequence {
    ($($container:ident),* $(,)?) => {
        $(
            impl<T: Serialize> Serialize for $container<T> {
                fn serialize<O: OutputStream + ?Sized>(&self, ostream: &mut O) -> Result<()> {
                    write_size_prefix(self.len(), ostream)?;
                    T::serialize_elements(self, ostream)
                }

                fn serialized_size(&self) -> usize {
                    SIZE_PREFIX_LEN + T::elements_serialized_size(self)
                }
            }
        )*
    };
}

serialize_variable_sequence!(Vec, VecDeque, LinkedList);

impl<T: Serialize, const N: usize> Serialize for heapless::Vec<T, N> {
    fn serialize<O: OutputStream + ?Sized>(&self, ostream: &mut O) -> Result<()> {
        self.as_slice().serialize(ostream)
    }

    fn serialized_size(&self) -> usize {
        self.as_slice().serialized_size()
    }
}

impl<T: Serialize + ?Sized> Serialize for Box<T> {
    fn serialize<O: OutputStream + ?Sized>(&self, ostream: &mut O) -> Result<()> {
        (**self).serialize(ostream)
    }

    fn serialized_size(&self) -> usize {
        (**self).serialized_size()
    }
}

impl<T: Serialize + ?Sized> Serialize for &T {
    fn serialize<O: OutputStream + ?Sized>(&self, ostream: &mut O) -> Result<()> {
        (**self).serialize(ostream)
    }

    fn serialized_size(&self) -> usize {
        (**self).serialized_size()
    }
}

macro_rules! serialize_tuple {
    ($($name:ident . $idx:tt),*) => {
        impl<$($name: Serialize),*> Serialize for ($($name,)*) {
            #[allow(unused_variables)]
            fn serialize<O: OutputStream + ?Sized>(&self, ostream: &mut O) -> Result<()> {
                $(self.$idx.serialize(ostream)?;)*
                Ok(())
            }

            fn serialized_size(&self) -> usize {
                0 $(+ self.$idx.serialized_size())*
            }
        }
    };
}

serialize_tuple!();
serialize_tuple!(A.0);
serialize_tuple!(A.0, B.1);
serialize_tuple!(A.0, B.1, C.2);
serialize_tuple!(A.0, B.1, C.2, D.3);
serialize_tuple!(A.0, B.1, C.2, D.3, E.4);
serialize_tuple!(A.0, B.1, C.2, D.3, E.4, F.5);
serialize_tuple!(A.0, B.1, C.2, D.3, E.4, F.5, G.6);
serialize_tuple!(A.0, B.1, C.2, D.3, E.4, F.5, G.6, H.7);
