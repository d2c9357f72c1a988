//! Decoding values from a byte stream.
//!
//! This is the structural mirror of [`crate::serialize`]: a decoder must be handed
//! the same type the encoder used, as nothing in the bytes identifies the shape.
//! A decode either yields a complete value or an error, never a partially
//! filled one.

use std::collections::{LinkedList, VecDeque};

use crate::error::{Error, Result};
use crate::serialize::{SizePrefix, CHUNK_LEN, SIZE_PREFIX_LEN};
use crate::shape::Classify;
use crate::stream::{InputStream, SliceSource};

/// Upper bound on elements reserved up front from an untrusted count prefix.
pub(crate) const MAX_PREALLOCATION: usize = 4096;

/// A value that can be reconstructed from an [`InputStream`].
pub trait Deserialize: Classify + Sized {
    /// Reads one complete value from `istream`.
    fn deserialize<I: InputStream + ?Sized>(istream: &mut I) -> Result<Self>;

    #[doc(hidden)]
    fn deserialize_elements<I, F>(count: usize, istream: &mut I, mut push: F) -> Result<()>
    where
        I: InputStream + ?Sized,
        F: FnMut(Self),
    {
        for _ in 0..count {
            push(Self::deserialize(istream)?);
        }
        Ok(())
    }
}

/// Reads one `T` from `istream`.
pub fn deserialize<T, I>(istream: &mut I) -> Result<T>
where
    T: Deserialize,
    I: InputStream + ?Sized,
{
    T::deserialize(istream)
        .inspect_err(|e| tracing::trace!(shape = %T::shape(), error = %e, "decode failed"))
}

/// Decodes into an existing destination, replacing its contents.
///
/// `out` is only touched when the whole value decoded successfully; the previous
/// contents are dropped, never merged with the new ones.
///
/// # Examples
///
/// ```
/// use binlog_core::{deserialize_into, to_bytes};
///
/// let bytes = to_bytes(&Vec::<i32>::new()).unwrap();
/// let mut out = vec![1, 2, 3];
/// deserialize_into(&mut out, &mut bytes.as_slice()).unwrap();
/// assert!(out.is_empty());
/// ```
pub fn deserialize_into<T, I>(out: &mut T, istream: &mut I) -> Result<()>
where
    T: Deserialize,
    I: InputStream + ?Sized,
{
    *out = deserialize(istream)?;
    Ok(())
}

/// Decodes a `T` that must occupy all of `bytes`.
pub fn from_bytes_exact<T: Deserialize>(bytes: &[u8]) -> Result<T> {
    let mut source = SliceSource::new(bytes);
    let value = deserialize(&mut source)?;

    if !source.is_exhausted() {
        return Err(Error::TrailingBytes {
            consumed: source.position(),
            remaining: source.remaining(),
        });
    }
    Ok(value)
}

pub(crate) fn read_size_prefix<I: InputStream + ?Sized>(istream: &mut I) -> Result<usize> {
    let mut buf = [0u8; SIZE_PREFIX_LEN];
    istream.read(&mut buf)?;
    Ok(SizePrefix::from_ne_bytes(buf) as usize)
}

/// Zero-width elements consume no input, so a count of them is never bounded
/// by the source running dry and has to be capped here instead.
pub(crate) fn check_zero_width_count(zero_width: bool, count: usize) -> Result<()> {
    if zero_width && count > MAX_PREALLOCATION {
        return Err(Error::SizeMismatch {
            expected: MAX_PREALLOCATION,
            actual: count,
        });
    }
    Ok(())
}

/// Reads the count prefix of a variable sequence of `T`.
fn read_element_count<T: Classify, I: InputStream + ?Sized>(istream: &mut I) -> Result<usize> {
    let count = read_size_prefix(istream)?;
    check_zero_width_count(T::ZERO_WIDTH, count)?;
    Ok(count)
}

pub(crate) fn read_bytes<I: InputStream + ?Sized>(len: usize, istream: &mut I) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(len.min(MAX_PREALLOCATION));
    u8::deserialize_elements(len, istream, |b| bytes.push(b))?;
    Ok(bytes)
}

fn bool_from_byte(byte: u8) -> Result<bool> {
    match byte {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(Error::InvalidBool(other)),
    }
}

/// Reads `count` bit-packed booleans.
pub(crate) fn read_packed_bools<I, F>(count: usize, istream: &mut I, mut push: F) -> Result<()>
where
    I: InputStream + ?Sized,
    F: FnMut(bool),
{
    let mut chunk = [0u8; CHUNK_LEN];
    let mut remaining = count;

    while remaining > 0 {
        let bits = remaining.min(CHUNK_LEN * 8);
        let bytes = &mut chunk[..bits.div_ceil(8)];
        istream.read(bytes)?;

        for bit in 0..bits {
            push(bytes[bit / 8] & (1 << (bit % 8)) != 0);
        }
        remaining -= bits;
    }
    Ok(())
}

impl Deserialize for bool {
    fn deserialize<I: InputStream + ?Sized>(istream: &mut I) -> Result<Self> {
        let mut buf = [0u8; 1];
        istream.read(&mut buf)?;
        bool_from_byte(buf[0])
    }

    fn deserialize_elements<I, F>(count: usize, istream: &mut I, push: F) -> Result<()>
    where
        I: InputStream + ?Sized,
        F: FnMut(Self),
    {
        read_packed_bools(count, istream, push)
    }
}

macro_rules! deserialize_number {
    ($($t:ty),* $(,)?) => {
        $(
            impl Deserialize for $t {
                #[inline]
                fn deserialize<I: InputStream + ?Sized>(istream: &mut I) -> Result<Self> {
                    let mut buf = [0u8; std::mem::size_of::<$t>()];
                    istream.read(&mut buf)?;
                    Ok(<$t>::from_ne_bytes(buf))
                }
            }
        )*
    };
}

deserialize_number!(i8, i16, i32, i64, u16, u32, u64, f32, f64);

impl Deserialize for u8 {
    #[inline]
    fn deserialize<I: InputStream + ?Sized>(istream: &mut I) -> Result<Self> {
        let mut buf = [0u8; 1];
        istream.read(&mut buf)?;
        Ok(buf[0])
    }

    fn deserialize_elements<I, F>(count: usize, istream: &mut I, mut push: F) -> Result<()>
    where
        I: InputStream + ?Sized,
        F: FnMut(Self),
    {
        let mut chunk = [0u8; CHUNK_LEN];
        let mut remaining = count;

        while remaining > 0 {
            let len = remaining.min(CHUNK_LEN);
            istream.read(&mut chunk[..len])?;
            chunk[..len].iter().copied().for_each(&mut push);
            remaining -= len;
        }
        Ok(())
    }
}

impl Deserialize for String {
    fn deserialize<I: InputStream + ?Sized>(istream: &mut I) -> Result<Self> {
        let len = read_size_prefix(istream)?;
        Ok(String::from_utf8(read_bytes(len, istream)?)?)
    }
}

/// Strings longer than `N` bytes fail with [`Error::SizeMismatch`].
impl<const N: usize> Deserialize for heapless::String<N> {
    fn deserialize<I: InputStream + ?Sized>(istream: &mut I) -> Result<Self> {
        let len = read_size_prefix(istream)?;
        if len > N {
            return Err(Error::SizeMismatch {
                expected: N,
                actual: len,
            });
        }

        let text = String::from_utf8(read_bytes(len, istream)?)?;
        let mut out = heapless::String::new();
        out.push_str(&text).map_err(|()| Error::SizeMismatch {
            expected: N,
            actual: len,
        })?;
        Ok(out)
    }
}

impl<T: Deserialize, const N: usize> Deserialize for [T; N] {
    fn deserialize<I: InputStream + ?Sized>(istream: &mut I) -> Result<Self> {
        let mut elements = Vec::with_capacity(N);
        T::deserialize_elements(N, istream, |element| elements.push(element))?;

        elements.try_into().map_err(|elements: Vec<T>| Error::SizeMismatch {
            expected: N,
            actual: elements.len(),
        })
    }
}

macro_rules! deserialize_variable_sequence {
    ($($container:ident :: $push:ident),* $(,)?) => {
        $(
            impl<T: Deserialize> Deserialize for $container<T> {
                fn deserialize<I: InputStream + ?Sized>(istream: &mut I) -> Result<Self> {
                    let count = read_element_count::<T, _>(istream)?;
                    let mut out = $container::with_capacity(count.min(MAX_PREALLOCATION));
                    T::deserialize_elements(count, istream, |element| out.$push(element))?;
                    Ok(out)
                }
            }
        )*
    };
}

deserialize_variable_sequence!(Vec::push, VecDeque::push_back);

impl<T: Deserialize> Deserialize for LinkedList<T> {
    fn deserialize<I: InputStream + ?Sized>(istream: &mut I) -> Result<Self> {
        let count = read_element_count::<T, _>(istream)?;
        let mut out = LinkedList::new();
        T::deserialize_elements(count, istream, |element| out.push_back(element))?;
        Ok(out)
    }
}

impl<T: Deserialize> Deserialize for Box<[T]> {
    fn deserialize<I: InputStream + ?Sized>(istream: &mut I) -> Result<Self> {
        Vec::<T>::deserialize(istream).map(Vec::into_boxed_slice)
    }
}

/// Counts larger than `N` fail with [`Error::SizeMismatch`] before any element is read.
impl<T: Deserialize, const N: usize> Deserialize for heapless::Vec<T, N> {
    fn deserialize<I: InputStream + ?Sized>(istream: &mut I) -> Result<Self> {
        let count = read_element_count::<T, _>(istream)?;
        if count > N {
            return Err(Error::SizeMismatch {
                expected: N,
                actual: count,
            });
        }

        let mut out = heapless::Vec::new();
        T::deserialize_elements(count, istream, |element| {
            // capacity checked above
            let _ = out.push(element);
        })?;
        Ok(out)
    }
}

macro_rules! deserialize_tuple {
    ($($name:ident),*) => {
        impl<$($name: Deserialize),*> Deserialize for ($($name,)*) {
            #[allow(unused_variables)]
            fn deserialize<In: InputStream + ?Sized>(istream: &mut In) -> Result<Self> {
                Ok(($($name::deserialize(istream)?,)*))
            }
        }
    };
}

deserialize_tuple!();
deserialize_tuple!(A);
deserialize_tuple!(A, B);
deserialize_tuple!(A, B, C);
deserialize_tuple!(A, B, C, D);
deserialize_tuple!(A, B, C, D, E);
deserialize_tuple!(A, B, C, D, E, F);
deserialize_tuple!(A, B, C, D, E, F, G);
deserialize_tuple!(A, B, C, D, E, F, G, H);
