//! Byte stream capabilities the codec is written against.
//!
//! The codec never owns I/O. It appends to an [`OutputStream`] and pulls exact
//! byte counts from an [`InputStream`]; whatever moves those bytes between
//! producer and consumer (a queue, a file, a socket) implements the two traits.
//! Neither trait asks for seeking or a length query.
//!
//! A single stream is not assumed to be thread-safe. Callers sharing one stream
//! across threads must serialize access themselves.

use std::io;

use crate::error::{Error, Result};

/// A sink that appends raw bytes, or fails.
pub trait OutputStream {
    /// Appends all of `bytes` to the stream.
    fn write(&mut self, bytes: &[u8]) -> Result<()>;
}

/// A source that yields exactly the requested number of bytes, or fails.
pub trait InputStream {
    /// Fills `buf` completely.
    ///
    /// Returns [`Error::TruncatedInput`] if fewer than `buf.len()` bytes remain.
    fn read(&mut self, buf: &mut [u8]) -> Result<()>;
}

impl OutputStream for Vec<u8> {
    #[inline]
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.extend_from_slice(bytes);
        Ok(())
    }
}

impl<S: OutputStream + ?Sized> OutputStream for &mut S {
    #[inline]
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write(bytes)
    }
}

impl<S: InputStream + ?Sized> InputStream for &mut S {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).read(buf)
    }
}

/// Reading from a slice advances it past the consumed bytes, like `io::Read for &[u8]`.
impl InputStream for &[u8] {
    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        if buf.len() > self.len() {
            return Err(Error::TruncatedInput {
                requested: buf.len(),
                available: self.len(),
            });
        }

        let (head, tail) = self.split_at(buf.len());
        buf.copy_from_slice(head);
        *self = tail;
        Ok(())
    }
}

/// An input stream over a borrowed buffer that remembers how far it got.
///
/// # Examples
///
/// ```
/// use binlog_core::stream::{InputStream, SliceSource};
///
/// let data = [1u8, 2, 3];
/// let mut source = SliceSource::new(&data);
///
/// let mut two = [0u8; 2];
/// source.read(&mut two).unwrap();
/// assert_eq!(two, [1, 2]);
/// assert_eq!(source.position(), 2);
/// assert_eq!(source.remaining(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }
}

impl InputStream for SliceSource<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut rest = &self.data[self.pos..];
        rest.read(buf)?;
        self.pos += buf.len();
        Ok(())
    }
}

/// Adapts any [`io::Write`] into an [`OutputStream`].
#[derive(Debug)]
pub struct IoSink<W> {
    inner: W,
}

impl<W: io::Write> IoSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Flushes the wrapped writer.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: io::Write> OutputStream for IoSink<W> {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        Ok(())
    }
}

/// Adapts any [`io::Read`] into an [`InputStream`].
///
/// End of file in the middle of a request surfaces as [`Error::TruncatedInput`],
/// every other read error as [`Error::Io`].
#[derive(Debug)]
pub struct IoSource<R> {
    inner: R,
}

impl<R: io::Read> IoSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: io::Read> InputStream for IoSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(Error::TruncatedInput {
                        requested: buf.len(),
                        available: filled,
                    })
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_read_advances() {
        let data = [1u8, 2, 3, 4];
        let mut source: &[u8] = &data;

        let mut buf = [0u8; 3];
        source.read(&mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3]);
        assert_eq!(source, &[4]);
    }

    #[test]
    fn test_slice_read_past_end_keeps_position() {
        let data = [1u8, 2];
        let mut source = SliceSource::new(&data);

        let mut buf = [0u8; 4];
        let err = source.read(&mut buf).unwrap_err();
        assert!(matches!(
            err,
            Error::TruncatedInput {
                requested: 4,
                available: 2
            }
        ));
        assert_eq!(source.position(), 0, "failed read must not consume input");
    }

    #[test]
    fn test_io_source_reports_partial_availability() {
        let mut source = IoSource::new(io::Cursor::new(vec![9u8, 8]));

        let mut buf = [0u8; 5];
        let err = source.read(&mut buf).unwrap_err();
        assert!(matches!(
            err,
            Error::TruncatedInput {
                requested: 5,
                available: 2
            }
        ));
    }

    #[test]
    fn test_io_sink_forwards_bytes() {
        let mut sink = IoSink::new(Vec::new());
        sink.write(b"abc").unwrap();
        sink.write(b"de").unwrap();
        sink.flush().unwrap();
        assert_eq!(sink.into_inner(), b"abcde");
    }
}
